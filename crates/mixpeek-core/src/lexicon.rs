//! Static lookup tables used by the local classifiers.
//!
//! A [`Lexicon`] bundles every word list and reference table the classifiers
//! consult. It is built once, never mutated afterwards, and shared through an
//! `Arc`. Callers that need different tables can deserialize their own lexicon
//! from JSON and inject it.

use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::classifier::{GarmCategory, RiskLevel};
use crate::error::{Result, SignalError};

/// A content category the taxonomy classifier can emit.
///
/// Position in [`Lexicon::taxonomy`] is the tie-break priority: when two
/// categories score equally, the one declared first wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyCategory {
    /// Stable identifier, e.g. `technology`.
    pub node_id: String,
    /// Display label, e.g. `Technology`.
    pub label: String,
    /// Path from the taxonomy root to this node.
    pub path: Vec<String>,
    /// IAB Content Taxonomy 1.0 code (e.g. `IAB19`).
    pub iab_v1: String,
    /// IAB Content Taxonomy 3.0 unique id (e.g. `596`).
    pub iab_v3: Option<String>,
    /// Lowercase keywords that signal this category.
    pub keywords: Vec<String>,
}

/// A keyword that marks content as brand-unsafe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedKeyword {
    pub term: String,
    pub level: RiskLevel,
    pub garm_category: GarmCategory,
}

/// A sensitive IAB Ad Product category and its GARM risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitiveCategory {
    pub id: u32,
    pub name: String,
    pub level: RiskLevel,
    pub garm_category: GarmCategory,
    pub parent: Option<u32>,
}

/// Immutable reference data for the local classifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub stop_words: HashSet<String>,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub taxonomy: Vec<TaxonomyCategory>,
    pub blocked_keywords: Vec<BlockedKeyword>,
    pub sensitive_categories: Vec<SensitiveCategory>,
}

static SHARED: Lazy<Arc<Lexicon>> = Lazy::new(|| Arc::new(Lexicon::builtin()));

impl Lexicon {
    /// Returns the process-wide built-in lexicon.
    pub fn shared() -> Arc<Lexicon> {
        Arc::clone(&SHARED)
    }

    /// Builds the built-in lexicon.
    pub fn builtin() -> Self {
        Self {
            stop_words: words(STOP_WORDS).into_iter().collect(),
            positive_words: words(POSITIVE_WORDS),
            negative_words: words(NEGATIVE_WORDS),
            taxonomy: builtin_taxonomy(),
            blocked_keywords: builtin_blocked_keywords(),
            sensitive_categories: builtin_sensitive_categories(),
        }
    }

    /// Parses a lexicon from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let lexicon: Lexicon = serde_json::from_str(json)
            .map_err(|e| SignalError::InvalidConfig(format!("lexicon JSON: {}", e)))?;
        if lexicon.taxonomy.is_empty() {
            return Err(SignalError::InvalidConfig(
                "lexicon must declare at least one taxonomy category".to_string(),
            ));
        }
        Ok(lexicon)
    }

    /// Returns true if the word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Looks up a sensitive category by id.
    pub fn sensitive_category(&self, id: u32) -> Option<&SensitiveCategory> {
        self.sensitive_categories.iter().find(|c| c.id == id)
    }

    /// Looks up a taxonomy category by node id.
    pub fn taxonomy_category(&self, node_id: &str) -> Option<&TaxonomyCategory> {
        self.taxonomy.iter().find(|c| c.node_id == node_id)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "been", "were", "said", "each", "which", "their",
    "there", "this", "that", "these", "those", "with", "from", "they", "will", "would", "could",
    "should", "what", "when", "where", "while", "about", "into", "than", "then", "them", "some",
    "more", "most", "other", "only", "over", "such", "very", "just", "also", "your", "here",
    "after", "before", "because", "being", "does", "doing", "both", "between", "through",
    "who", "why", "how", "did", "its", "own", "same", "too", "few", "every",
];

const POSITIVE_WORDS: &[&str] = &[
    "excellent", "amazing", "wonderful", "great", "good", "best", "love", "fantastic",
    "awesome", "brilliant", "outstanding", "perfect", "happy", "beautiful", "superb",
    "impressive", "delightful", "enjoy", "success", "positive",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "awful", "horrible", "bad", "worst", "hate", "poor", "disappointing", "sad",
    "angry", "failure", "ugly", "broken", "dangerous", "tragic", "crisis", "disaster", "negative",
    "boring", "useless",
];

fn category(
    node_id: &str,
    label: &str,
    iab_name: &str,
    iab_v1: &str,
    iab_v3: &str,
    keywords: &[&str],
) -> TaxonomyCategory {
    let mut path = vec![iab_name.to_string()];
    if iab_name != label {
        path.push(label.to_string());
    }
    TaxonomyCategory {
        node_id: node_id.to_string(),
        label: label.to_string(),
        path,
        iab_v1: iab_v1.to_string(),
        iab_v3: Some(iab_v3.to_string()),
        keywords: words(keywords),
    }
}

fn builtin_taxonomy() -> Vec<TaxonomyCategory> {
    vec![
        category(
            "technology",
            "Technology",
            "Technology & Computing",
            "IAB19",
            "596",
            &[
                "software", "programming", "developer", "code", "computer", "technology", "tech",
                "digital", "internet", "cloud", "data", "algorithm", "startup", "cybersecurity",
                "ai", "gadget",
            ],
        ),
        category(
            "business",
            "Business",
            "Business and Finance",
            "IAB3",
            "52",
            &[
                "business", "finance", "market", "stock", "investment", "economy", "company",
                "revenue", "banking", "entrepreneur", "trading", "corporate", "profit",
                "financial",
            ],
        ),
        category(
            "sports",
            "Sports",
            "Sports",
            "IAB17",
            "483",
            &[
                "sports", "football", "basketball", "soccer", "baseball", "tennis", "golf",
                "athlete", "team", "league", "championship", "olympics", "player", "tournament",
            ],
        ),
        category(
            "entertainment",
            "Entertainment",
            "Pop Culture",
            "IAB1",
            "432",
            &[
                "movie", "film", "music", "celebrity", "television", "show", "concert", "album",
                "actor", "actress", "hollywood", "streaming", "netflix", "series",
                "entertainment",
            ],
        ),
        category(
            "health",
            "Health",
            "Healthy Living",
            "IAB7",
            "223",
            &[
                "health", "fitness", "medical", "doctor", "wellness", "nutrition", "exercise",
                "disease", "hospital", "medicine", "diet", "workout", "mental", "therapy", "yoga",
            ],
        ),
        category(
            "travel",
            "Travel",
            "Travel",
            "IAB20",
            "653",
            &[
                "travel", "vacation", "hotel", "flight", "destination", "tourism", "trip",
                "beach", "cruise", "resort", "airline", "adventure", "passport", "booking",
            ],
        ),
        category(
            "food",
            "Food & Drink",
            "Food & Drink",
            "IAB8",
            "210",
            &[
                "food", "recipe", "cooking", "restaurant", "chef", "cuisine", "meal", "dinner",
                "baking", "kitchen", "wine", "coffee", "dessert", "vegan",
            ],
        ),
        category(
            "automotive",
            "Automotive",
            "Automotive",
            "IAB2",
            "1",
            &[
                "car", "cars", "vehicle", "automotive", "engine", "driving", "truck", "tesla",
                "motor", "auto", "suv", "dealership", "sedan", "horsepower",
            ],
        ),
        category(
            "fashion",
            "Fashion",
            "Style & Fashion",
            "IAB18",
            "552",
            &[
                "fashion", "style", "clothing", "dress", "shoes", "designer", "beauty", "makeup",
                "jewelry", "outfit", "apparel", "accessories", "runway", "wardrobe",
            ],
        ),
        category(
            "real_estate",
            "Real Estate",
            "Real Estate",
            "IAB21",
            "441",
            &[
                "property", "housing", "mortgage", "apartment", "home", "homes", "rent",
                "realtor", "listing", "estate", "condo", "landlord", "tenant",
            ],
        ),
        category(
            "education",
            "Education",
            "Education",
            "IAB5",
            "132",
            &[
                "education", "school", "university", "college", "student", "learning", "teacher",
                "course", "degree", "academic", "classroom", "tutorial", "study",
            ],
        ),
        category(
            "politics",
            "News & Politics",
            "News and Politics",
            "IAB11",
            "379",
            &[
                "politics", "election", "government", "president", "congress", "senate",
                "policy", "vote", "campaign", "democrat", "republican", "legislation", "news",
            ],
        ),
    ]
}

fn blocked(term: &str, level: RiskLevel, garm_category: GarmCategory) -> BlockedKeyword {
    BlockedKeyword {
        term: term.to_string(),
        level,
        garm_category,
    }
}

fn builtin_blocked_keywords() -> Vec<BlockedKeyword> {
    use GarmCategory::*;
    use RiskLevel::*;

    vec![
        blocked("porn", Floor, AdultExplicitSexualContent),
        blocked("pornography", Floor, AdultExplicitSexualContent),
        blocked("xxx", Floor, AdultExplicitSexualContent),
        blocked("nude", High, AdultExplicitSexualContent),
        blocked("terrorism", Floor, Terrorism),
        blocked("terrorist", Floor, Terrorism),
        blocked("bomb", High, Terrorism),
        blocked("murder", High, CrimeHarmfulActs),
        blocked("kill", High, CrimeHarmfulActs),
        blocked("killing", High, CrimeHarmfulActs),
        blocked("violence", High, DeathInjuryMilitaryConflict),
        blocked("shooting", High, DeathInjuryMilitaryConflict),
        blocked("suicide", High, DeathInjuryMilitaryConflict),
        blocked("attack", Medium, DeathInjuryMilitaryConflict),
        blocked("war", Medium, DeathInjuryMilitaryConflict),
        blocked("drugs", High, IllegalDrugsTobaccoAlcohol),
        blocked("cocaine", High, IllegalDrugsTobaccoAlcohol),
        blocked("heroin", High, IllegalDrugsTobaccoAlcohol),
        blocked("weapons", High, ArmsAmmunition),
        blocked("gun", High, ArmsAmmunition),
        blocked("guns", High, ArmsAmmunition),
        blocked("racist", High, HateSpeech),
        blocked("hate", Medium, HateSpeech),
        blocked("piracy", High, OnlinePiracy),
        blocked("torrent", Medium, OnlinePiracy),
        blocked("scam", Medium, SpamHarmfulContent),
        blocked("profanity", Medium, ObscenityProfanity),
    ]
}

fn sensitive(
    id: u32,
    name: &str,
    level: RiskLevel,
    garm_category: GarmCategory,
    parent: Option<u32>,
) -> SensitiveCategory {
    SensitiveCategory {
        id,
        name: name.to_string(),
        level,
        garm_category,
        parent,
    }
}

fn builtin_sensitive_categories() -> Vec<SensitiveCategory> {
    use GarmCategory::*;
    use RiskLevel::*;

    vec![
        sensitive(1001, "Ad Safety Risk", Floor, SpamHarmfulContent, None),
        sensitive(1008, "Adult Products and Services", Floor, AdultExplicitSexualContent, None),
        sensitive(1002, "Alcohol", Medium, IllegalDrugsTobaccoAlcohol, None),
        sensitive(1003, "Bars", Medium, IllegalDrugsTobaccoAlcohol, Some(1002)),
        sensitive(1004, "Beer", Medium, IllegalDrugsTobaccoAlcohol, Some(1002)),
        sensitive(1005, "Hard Sodas, Seltzers, Alco Pops", Medium, IllegalDrugsTobaccoAlcohol, Some(1002)),
        sensitive(1006, "Spirits", Medium, IllegalDrugsTobaccoAlcohol, Some(1002)),
        sensitive(1007, "Wine", Medium, IllegalDrugsTobaccoAlcohol, Some(1002)),
        sensitive(1050, "Cannabis", High, IllegalDrugsTobaccoAlcohol, None),
        sensitive(1051, "CBD Products", Medium, IllegalDrugsTobaccoAlcohol, Some(1050)),
        sensitive(1052, "THC Products", High, IllegalDrugsTobaccoAlcohol, Some(1050)),
        sensitive(1210, "Dating", Low, SensitiveProducts, None),
        sensitive(1211, "Dating Services", Low, SensitiveProducts, Some(1210)),
        sensitive(1215, "Debated Sensitive Social Issue", High, DebatedSensitiveSocialIssue, None),
        sensitive(1220, "Dieting and Weight Loss", Low, SensitiveProducts, None),
        sensitive(1221, "Diet Programs", Low, SensitiveProducts, Some(1220)),
        sensitive(1440, "Gambling", High, Gambling, None),
        sensitive(1441, "Casinos", High, Gambling, Some(1440)),
        sensitive(1443, "Sports Betting", High, Gambling, Some(1440)),
        sensitive(1620, "Non-Fiat Currency", Medium, SensitiveProducts, None),
        sensitive(1621, "Cryptocurrency", Medium, SensitiveProducts, Some(1620)),
        sensitive(1680, "Pharmaceuticals", Medium, SensitiveProducts, None),
        sensitive(1681, "Prescription Drugs", Medium, SensitiveProducts, Some(1680)),
        sensitive(1710, "Politics", Medium, DebatedSensitiveSocialIssue, None),
        sensitive(1740, "Religion and Spirituality", Low, DebatedSensitiveSocialIssue, None),
        sensitive(1760, "Sexual Health", Medium, AdultExplicitSexualContent, None),
        sensitive(1800, "Tobacco", High, IllegalDrugsTobaccoAlcohol, None),
        sensitive(1801, "Cigarettes", High, IllegalDrugsTobaccoAlcohol, Some(1800)),
        sensitive(1803, "Vaping", High, IllegalDrugsTobaccoAlcohol, Some(1800)),
        sensitive(1920, "Weapons and Ammunition", High, ArmsAmmunition, None),
        sensitive(1921, "Firearms", High, ArmsAmmunition, Some(1920)),
        sensitive(1922, "Ammunition", High, ArmsAmmunition, Some(1920)),
    ]
}
