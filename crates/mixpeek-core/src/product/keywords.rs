//! Deterministic keyword to product-category mapping.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::taxonomy::category_by_id;

/// Confidence of a single exact keyword hit.
pub const EXACT_MATCH_CONFIDENCE: f32 = 0.95;

/// Upper bound for boosted confidence.
pub const MAX_MATCH_CONFIDENCE: f32 = 0.99;

/// Keyword or phrase to category id.
static KEYWORD_TABLE: &[(&str, u32)] = &[
    // Alcohol
    ("alcohol", 1002), ("alcoholic", 1002), ("liquor", 1002),
    ("bar", 1003), ("pub", 1003), ("nightclub", 1003),
    ("beer", 1004), ("lager", 1004), ("ale", 1004), ("ipa", 1004),
    ("hard seltzer", 1005), ("seltzer", 1005),
    ("spirits", 1006), ("whiskey", 1006), ("vodka", 1006), ("rum", 1006), ("gin", 1006),
    ("tequila", 1006),
    ("wine", 1007), ("champagne", 1007), ("prosecco", 1007),
    // Business and Industrial
    ("business", 1010), ("b2b", 1010), ("enterprise", 1010),
    ("advertising", 1011), ("marketing", 1011), ("agency", 1011),
    ("construction", 1020), ("contractor", 1020),
    ("energy", 1025), ("manufacturing", 1030), ("logistics", 1040), ("agriculture", 1045),
    // Cannabis
    ("cannabis", 1050), ("marijuana", 1050), ("cbd", 1051), ("thc", 1052),
    // Clothing and Accessories
    ("clothing", 1055), ("apparel", 1055), ("fashion", 1055),
    ("shoes", 1060), ("footwear", 1060), ("sneakers", 1060), ("boots", 1060),
    ("jewelry", 1065), ("jewellery", 1065), ("necklace", 1065), ("bracelet", 1065),
    ("watch", 1070), ("watches", 1070),
    ("handbag", 1075), ("purse", 1075),
    ("sunglasses", 1080), ("eyeglasses", 1080),
    // Computer Software
    ("software", 1090), ("app", 1090), ("application", 1090),
    ("saas", 1091), ("crm", 1091), ("erp", 1091),
    ("mobile app", 1093),
    ("video game", 1095), ("game", 1095), ("gaming", 1095), ("playstation", 1095),
    ("xbox", 1095),
    ("antivirus", 1100), ("vpn", 1100),
    ("cloud", 1105), ("aws", 1105), ("azure", 1105),
    // Consumer Electronics
    ("electronics", 1115), ("gadget", 1115), ("tech", 1115),
    ("computer", 1116), ("laptop", 1116), ("pc", 1116), ("desktop", 1116), ("macbook", 1116),
    ("tablet", 1117), ("ipad", 1117),
    ("smartphone", 1118), ("phone", 1118), ("iphone", 1118), ("android", 1118),
    ("mobile", 1118),
    ("wearable", 1120), ("wearables", 1120),
    ("smartwatch", 1121), ("apple watch", 1121),
    ("fitness tracker", 1122), ("fitbit", 1122),
    ("headphones", 1126), ("earbuds", 1126), ("airpods", 1126),
    ("speaker", 1127), ("speakers", 1127),
    ("tv", 1130), ("television", 1130), ("monitor", 1130),
    ("camera", 1135), ("photography", 1135),
    ("gaming console", 1140), ("ps5", 1140),
    ("smart home", 1145), ("alexa", 1145),
    // Consumer Packaged Goods
    ("cpg", 1150), ("fmcg", 1150),
    ("food", 1151), ("beverage", 1151), ("snack", 1151), ("chips", 1151), ("candy", 1151),
    ("personal care", 1160), ("skincare", 1160), ("shampoo", 1160),
    ("cleaning", 1170), ("detergent", 1170),
    ("makeup", 1175), ("cosmetics", 1175), ("lipstick", 1175),
    ("baby", 1180), ("diaper", 1180),
    ("pet food", 1185), ("dog food", 1185), ("cat food", 1185),
    // Dating
    ("dating", 1210), ("dating app", 1211), ("tinder", 1211), ("bumble", 1211),
    // Dieting and Weight Loss
    ("diet", 1220), ("weight loss", 1220), ("diet program", 1221),
    // Durable Goods
    ("appliance", 1226), ("refrigerator", 1226), ("oven", 1226),
    ("furniture", 1230), ("sofa", 1230), ("couch", 1230),
    ("home improvement", 1240), ("tools", 1240),
    // Education and Careers
    ("education", 1260), ("learning", 1260), ("school", 1260),
    ("college", 1261), ("university", 1261),
    ("online course", 1262), ("coursera", 1262), ("udemy", 1262),
    ("job", 1265), ("career", 1265), ("job search", 1265),
    // Finance and Insurance
    ("finance", 1340), ("financial", 1340), ("money", 1340),
    ("bank", 1341), ("banking", 1341),
    ("credit card", 1345), ("visa", 1345), ("mastercard", 1345),
    ("loan", 1350), ("mortgage", 1350),
    ("insurance", 1355), ("car insurance", 1355), ("life insurance", 1355),
    ("investment", 1365), ("stock", 1365), ("stocks", 1365), ("trading", 1365),
    ("retirement", 1370), ("401k", 1370),
    // Fitness Activities
    ("fitness", 1390), ("workout", 1390), ("exercise", 1390),
    ("gym", 1391), ("fitness center", 1391),
    ("yoga", 1395), ("pilates", 1395),
    // Food and Beverage Services
    ("restaurant", 1411), ("dining", 1411), ("fast food", 1411), ("mcdonalds", 1411),
    ("food delivery", 1420), ("doordash", 1420), ("ubereats", 1420),
    ("coffee", 1430), ("starbucks", 1430),
    ("grocery", 1435), ("supermarket", 1435),
    // Gambling
    ("gambling", 1440), ("casino", 1441), ("betting", 1443), ("sports betting", 1443),
    ("draftkings", 1443),
    // Health and Medical Services
    ("health", 1480), ("healthcare", 1480), ("medical", 1480),
    ("doctor", 1481), ("hospital", 1481), ("clinic", 1481),
    ("dentist", 1485), ("dental", 1485),
    ("mental health", 1495), ("therapy", 1495), ("therapist", 1495),
    ("telemedicine", 1500), ("telehealth", 1500),
    // Media
    ("media", 1560), ("entertainment", 1560),
    ("streaming", 1561), ("netflix", 1561), ("hulu", 1561), ("disney+", 1561),
    ("news", 1565), ("journalism", 1565),
    ("podcast", 1570), ("podcasts", 1570),
    ("movie", 1580), ("movies", 1580), ("film", 1580),
    ("music", 1590), ("album", 1590),
    ("social media", 1600), ("facebook", 1600), ("instagram", 1600), ("twitter", 1600),
    ("tiktok", 1600),
    // Non-Fiat Currency
    ("crypto", 1621), ("cryptocurrency", 1621), ("bitcoin", 1621), ("ethereum", 1621),
    // Pet Ownership
    ("pet", 1660), ("pets", 1660),
    ("pet supplies", 1661), ("pet store", 1661),
    ("vet", 1665), ("veterinarian", 1665),
    // Pharmaceuticals
    ("pharmaceutical", 1680), ("drug", 1680), ("medication", 1680),
    ("prescription", 1681),
    ("otc", 1682), ("aspirin", 1682),
    ("vitamin", 1685), ("vitamins", 1685), ("supplement", 1685), ("supplements", 1685),
    ("pharmacy", 1690), ("cvs", 1690), ("walgreens", 1690),
    // Real Estate
    ("real estate", 1720), ("property", 1720),
    ("home for sale", 1721), ("house", 1721), ("zillow", 1721),
    ("apartment", 1721), ("rent", 1721), ("rental", 1721),
    ("commercial real estate", 1725),
    // Retail
    ("retail", 1750), ("store", 1750), ("shop", 1750),
    ("ecommerce", 1751), ("e-commerce", 1751), ("amazon", 1751),
    ("department store", 1752),
    // Sporting Goods
    ("sporting goods", 1770), ("sports equipment", 1770),
    ("fitness equipment", 1771), ("treadmill", 1771), ("weights", 1771),
    ("outdoor", 1772), ("camping", 1772), ("hiking", 1772),
    ("team sports", 1780),
    ("golf", 1795), ("golf clubs", 1795),
    // Tobacco
    ("tobacco", 1800),
    ("cigarette", 1801), ("cigarettes", 1801),
    ("vape", 1803), ("vaping", 1803), ("e-cigarette", 1803), ("juul", 1803),
    // Travel and Tourism
    ("travel", 1810), ("vacation", 1810), ("trip", 1810), ("tourism", 1810),
    ("airline", 1811), ("flight", 1811), ("flights", 1811),
    ("hotel", 1812), ("hotels", 1812), ("marriott", 1812), ("hilton", 1812),
    ("vacation rental", 1813), ("airbnb", 1813), ("vrbo", 1813),
    ("car rental", 1815), ("hertz", 1815),
    ("cruise", 1820), ("cruises", 1820),
    // Vehicles
    ("vehicle", 1860), ("vehicles", 1860),
    ("car", 1861), ("cars", 1861), ("automobile", 1861), ("auto", 1861),
    ("auto parts", 1870), ("car parts", 1870),
    ("auto repair", 1875), ("mechanic", 1875),
    ("motorcycle", 1880), ("motorbike", 1880),
    ("bicycle", 1895), ("bike", 1895),
    ("electric car", 1900), ("ev", 1900), ("tesla", 1900), ("electric vehicle", 1900),
    // Weapons and Ammunition
    ("weapon", 1920), ("weapons", 1920),
    ("gun", 1921), ("firearm", 1921), ("rifle", 1921), ("pistol", 1921),
    ("ammunition", 1922), ("ammo", 1922),
];

static KEYWORDS: Lazy<HashMap<&'static str, u32>> =
    Lazy::new(|| KEYWORD_TABLE.iter().copied().collect());

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));

/// A category matched from one or more keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub id: u32,
    pub name: String,
    pub tier: u8,
    pub parent: Option<u32>,
    pub confidence: f32,
    pub match_count: usize,
    /// Input keywords that mapped to this category, in input order.
    pub keywords: Vec<String>,
}

/// Maps one keyword or phrase by case-insensitive exact lookup.
pub fn map_keyword(keyword: &str) -> Option<KeywordMatch> {
    let normalized = keyword.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }
    let id = *KEYWORDS.get(normalized.as_str())?;
    let category = category_by_id(id)?;

    Some(KeywordMatch {
        id: category.id,
        name: category.name.to_string(),
        tier: category.tier,
        parent: category.parent,
        confidence: EXACT_MATCH_CONFIDENCE,
        match_count: 1,
        keywords: vec![keyword.to_string()],
    })
}

/// Maps many keywords, grouping hits by category.
///
/// Each extra hit adds 0.01 confidence up to 0.99. Results are ordered by
/// hit count; equal counts keep first-hit order.
pub fn map_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<KeywordMatch> {
    let mut results: Vec<KeywordMatch> = Vec::new();

    for keyword in keywords {
        let Some(hit) = map_keyword(keyword.as_ref()) else {
            continue;
        };
        match results.iter_mut().find(|m| m.id == hit.id) {
            Some(existing) => {
                existing.match_count += 1;
                existing.keywords.extend(hit.keywords);
            }
            None => results.push(hit),
        }
    }

    for result in &mut results {
        result.confidence = (EXACT_MATCH_CONFIDENCE + 0.01 * (result.match_count - 1) as f32)
            .min(MAX_MATCH_CONFIDENCE);
    }

    results.sort_by(|a, b| b.match_count.cmp(&a.match_count));
    results
}

/// Scans free text for the first single-word hit, then the first two-word hit.
///
/// Only tokens longer than two characters are considered.
pub fn find_best_match(text: &str) -> Option<KeywordMatch> {
    let lower = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lower, " ");
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect();

    if let Some(hit) = words.iter().find_map(|w| map_keyword(w)) {
        return Some(hit);
    }

    words
        .windows(2)
        .find_map(|pair| map_keyword(&format!("{} {}", pair[0], pair[1])))
}

/// Keywords that map to a category, in table order.
pub fn keywords_for_category(id: u32) -> Vec<&'static str> {
    KEYWORD_TABLE
        .iter()
        .filter(|(_, cid)| *cid == id)
        .map(|(k, _)| *k)
        .collect()
}

/// Every mapped keyword, in table order.
pub fn all_keywords() -> Vec<&'static str> {
    KEYWORD_TABLE.iter().map(|(k, _)| *k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_points_at_a_category() {
        for (keyword, id) in KEYWORD_TABLE {
            assert!(category_by_id(*id).is_some(), "{} -> {}", keyword, id);
        }
    }

    #[test]
    fn maps_single_keyword() {
        let hit = map_keyword("  Smartphone ").unwrap();
        assert_eq!(hit.id, 1118);
        assert_eq!(hit.name, "Smartphones");
        assert_eq!(hit.confidence, EXACT_MATCH_CONFIDENCE);
        assert!(map_keyword("zzz").is_none());
        assert!(map_keyword("").is_none());
    }

    #[test]
    fn groups_and_boosts_repeated_categories() {
        let hits = map_keywords(&["wine", "beer", "champagne", "prosecco", "unknown"]);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1007);
        assert_eq!(hits[0].match_count, 3);
        assert!((hits[0].confidence - 0.97).abs() < 1e-6);
        assert_eq!(hits[0].keywords, vec!["wine", "champagne", "prosecco"]);
        assert_eq!(hits[1].id, 1004);
    }

    #[test]
    fn boosted_confidence_is_capped() {
        let hits = map_keywords(&["car", "cars", "automobile", "auto", "car", "cars", "auto"]);
        assert_eq!(hits[0].confidence, MAX_MATCH_CONFIDENCE);
    }

    #[test]
    fn equal_counts_keep_first_hit_order() {
        let hits = map_keywords(&["laptop", "tablet"]);
        assert_eq!(hits[0].id, 1116);
        assert_eq!(hits[1].id, 1117);
    }

    #[test]
    fn finds_single_word_before_phrase() {
        let hit = find_best_match("The new Pixel phone, 128GB").unwrap();
        assert_eq!(hit.id, 1118);
    }

    #[test]
    fn finds_two_word_phrase() {
        let hit = find_best_match("Weight loss shakes").unwrap();
        assert_eq!(hit.id, 1220);
    }

    #[test]
    fn keeps_hyphenated_terms() {
        let hit = find_best_match("Disposable e-cigarette kit").unwrap();
        assert_eq!(hit.id, 1803);
    }

    #[test]
    fn no_match_in_unrelated_text() {
        assert!(find_best_match("lorem ipsum dolor").is_none());
        assert!(find_best_match("").is_none());
    }

    #[test]
    fn lists_keywords_for_category() {
        assert_eq!(keywords_for_category(1052), vec!["thc"]);
        assert!(all_keywords().contains(&"apple watch"));
    }
}
