//! IAB Ad Product Taxonomy 2.0.
//!
//! Tier-1 categories are roots; tier-2 and tier-3 categories point at their
//! parent. Codes use the `IAB-AP-{id}` form.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Taxonomy version string reported with every mapping.
pub const TAXONOMY_VERSION: &str = "2.0";

/// Prefix for category codes.
pub const CODE_PREFIX: &str = "IAB-AP-";

/// Bound on parent hops when walking to the root.
const MAX_DEPTH: usize = 8;

/// One node of the product taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductCategory {
    pub id: u32,
    pub name: &'static str,
    pub tier: u8,
    pub parent: Option<u32>,
}

const fn cat(id: u32, name: &'static str, tier: u8, parent: Option<u32>) -> ProductCategory {
    ProductCategory {
        id,
        name,
        tier,
        parent,
    }
}

const fn root(id: u32, name: &'static str) -> ProductCategory {
    cat(id, name, 1, None)
}

const fn sub(id: u32, name: &'static str, parent: u32) -> ProductCategory {
    cat(id, name, 2, Some(parent))
}

const fn leaf(id: u32, name: &'static str, parent: u32) -> ProductCategory {
    cat(id, name, 3, Some(parent))
}

/// Every category, ordered by id.
pub static CATEGORIES: &[ProductCategory] = &[
    root(1001, "Ad Safety Risk"),
    root(1002, "Alcohol"),
    sub(1003, "Bars", 1002),
    sub(1004, "Beer", 1002),
    sub(1005, "Hard Sodas, Seltzers, Alco Pops", 1002),
    sub(1006, "Spirits", 1002),
    sub(1007, "Wine", 1002),
    root(1008, "Adult Products and Services"),
    root(1010, "Business and Industrial"),
    sub(1011, "Advertising and Marketing", 1010),
    sub(1012, "Business Services", 1010),
    sub(1020, "Construction", 1010),
    sub(1025, "Energy Industry", 1010),
    sub(1030, "Manufacturing", 1010),
    sub(1040, "Transportation and Logistics", 1010),
    sub(1045, "Agriculture", 1010),
    root(1050, "Cannabis"),
    sub(1051, "CBD Products", 1050),
    sub(1052, "THC Products", 1050),
    root(1055, "Clothing and Accessories"),
    sub(1056, "Womens Apparel", 1055),
    sub(1057, "Mens Apparel", 1055),
    sub(1058, "Childrens Apparel", 1055),
    sub(1060, "Footwear", 1055),
    sub(1065, "Jewelry", 1055),
    sub(1070, "Watches", 1055),
    sub(1075, "Handbags and Accessories", 1055),
    sub(1080, "Eyewear", 1055),
    root(1085, "Collectables and Antiques"),
    root(1090, "Computer Software"),
    sub(1091, "Business Software", 1090),
    sub(1092, "Consumer Software", 1090),
    sub(1093, "Mobile Apps", 1090),
    sub(1095, "Video Games", 1090),
    sub(1100, "Security Software", 1090),
    sub(1105, "Cloud Services", 1090),
    root(1110, "Cosmetic Services"),
    root(1115, "Consumer Electronics"),
    sub(1116, "Computers and Laptops", 1115),
    sub(1117, "Tablets", 1115),
    sub(1118, "Smartphones", 1115),
    sub(1120, "Wearables", 1115),
    leaf(1121, "Smartwatches", 1120),
    leaf(1122, "Fitness Trackers", 1120),
    sub(1125, "Audio Equipment", 1115),
    leaf(1126, "Headphones", 1125),
    leaf(1127, "Speakers", 1125),
    sub(1130, "TVs and Displays", 1115),
    sub(1135, "Cameras and Photography", 1115),
    sub(1140, "Gaming Hardware", 1115),
    sub(1145, "Smart Home Devices", 1115),
    root(1150, "Consumer Packaged Goods"),
    sub(1151, "Food and Beverages", 1150),
    sub(1160, "Personal Care", 1150),
    sub(1170, "Household Products", 1150),
    sub(1175, "Beauty and Cosmetics", 1150),
    sub(1180, "Baby Products", 1150),
    sub(1185, "Pet Food and Supplies", 1150),
    root(1200, "Culture and Fine Arts"),
    root(1210, "Dating"),
    sub(1211, "Dating Services", 1210),
    root(1215, "Debated Sensitive Social Issue"),
    root(1220, "Dieting and Weight Loss"),
    sub(1221, "Diet Programs", 1220),
    root(1225, "Durable Goods"),
    sub(1226, "Appliances", 1225),
    sub(1230, "Furniture", 1225),
    sub(1240, "Home Improvement", 1225),
    root(1260, "Education and Careers"),
    sub(1261, "Colleges and Universities", 1260),
    sub(1262, "Online Education", 1260),
    sub(1265, "Job Search", 1260),
    root(1290, "Events and Performances"),
    root(1310, "Family and Parenting"),
    root(1340, "Finance and Insurance"),
    sub(1341, "Banking", 1340),
    sub(1345, "Credit Cards", 1340),
    sub(1350, "Loans", 1340),
    sub(1355, "Insurance", 1340),
    sub(1365, "Investments", 1340),
    sub(1370, "Retirement Planning", 1340),
    root(1390, "Fitness Activities"),
    sub(1391, "Gyms and Fitness Centers", 1390),
    sub(1395, "Yoga and Pilates", 1390),
    root(1410, "Food and Beverage Services"),
    sub(1411, "Restaurants", 1410),
    sub(1420, "Food Delivery", 1410),
    sub(1430, "Coffee and Tea", 1410),
    sub(1435, "Grocery", 1410),
    root(1440, "Gambling"),
    sub(1441, "Casinos", 1440),
    sub(1443, "Sports Betting", 1440),
    root(1460, "Gifts and Holiday Items"),
    root(1470, "Green/Eco"),
    root(1480, "Health and Medical Services"),
    sub(1481, "Healthcare Providers", 1480),
    sub(1485, "Dental Services", 1480),
    sub(1495, "Mental Health Services", 1480),
    sub(1500, "Telemedicine", 1480),
    root(1520, "Home and Garden Services"),
    root(1550, "Legal Services"),
    root(1560, "Media"),
    sub(1561, "Streaming Services", 1560),
    sub(1565, "News Media", 1560),
    sub(1570, "Podcasts", 1560),
    sub(1580, "Movies", 1560),
    sub(1590, "Music", 1560),
    sub(1600, "Social Media", 1560),
    root(1610, "Metals"),
    root(1620, "Non-Fiat Currency"),
    sub(1621, "Cryptocurrency", 1620),
    root(1630, "Non-Profits"),
    root(1640, "Personal/Consumer Telecom"),
    root(1660, "Pet Ownership"),
    sub(1661, "Pet Supplies", 1660),
    sub(1665, "Veterinary Services", 1660),
    root(1680, "Pharmaceuticals"),
    sub(1681, "Prescription Drugs", 1680),
    sub(1682, "OTC Medications", 1680),
    sub(1685, "Vitamins and Supplements", 1680),
    sub(1690, "Pharmacies", 1680),
    root(1710, "Politics"),
    root(1720, "Real Estate"),
    sub(1721, "Residential Real Estate", 1720),
    sub(1725, "Commercial Real Estate", 1720),
    root(1740, "Religion and Spirituality"),
    root(1750, "Retail"),
    sub(1751, "E-commerce", 1750),
    sub(1752, "Department Stores", 1750),
    root(1760, "Sexual Health"),
    root(1770, "Sporting Goods"),
    sub(1771, "Fitness Equipment", 1770),
    sub(1772, "Outdoor Recreation", 1770),
    sub(1780, "Team Sports Equipment", 1770),
    sub(1795, "Golf Equipment", 1770),
    root(1800, "Tobacco"),
    sub(1801, "Cigarettes", 1800),
    sub(1803, "Vaping", 1800),
    root(1810, "Travel and Tourism"),
    sub(1811, "Airlines", 1810),
    sub(1812, "Hotels", 1810),
    sub(1813, "Vacation Rentals", 1810),
    sub(1815, "Car Rentals", 1810),
    sub(1820, "Cruises", 1810),
    root(1860, "Vehicles"),
    sub(1861, "Automotive", 1860),
    sub(1870, "Auto Parts", 1860),
    sub(1875, "Auto Services", 1860),
    sub(1880, "Motorcycles", 1860),
    sub(1895, "Bicycles", 1860),
    sub(1900, "Electric Vehicles", 1860),
    root(1920, "Weapons and Ammunition"),
    sub(1921, "Firearms", 1920),
    sub(1922, "Ammunition", 1920),
];

static BY_ID: Lazy<HashMap<u32, &'static ProductCategory>> =
    Lazy::new(|| CATEGORIES.iter().map(|c| (c.id, c)).collect());

/// A category with its derived code and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: u32,
    pub code: String,
    pub name: String,
    /// Full path label, e.g. `Consumer Electronics > Wearables > Smartwatches`.
    pub label: String,
    pub tier: u8,
    pub parent: Option<u32>,
}

impl From<&ProductCategory> for CategoryInfo {
    fn from(category: &ProductCategory) -> Self {
        Self {
            id: category.id,
            code: iab_code(category.id),
            name: category.name.to_string(),
            label: category_label(category.id),
            tier: category.tier,
            parent: category.parent,
        }
    }
}

/// Formats an id as an `IAB-AP-{id}` code.
pub fn iab_code(id: u32) -> String {
    format!("{}{}", CODE_PREFIX, id)
}

/// Parses the id out of an `IAB-AP-{id}` code.
pub fn id_from_code(code: &str) -> Option<u32> {
    code.trim().strip_prefix(CODE_PREFIX)?.parse().ok()
}

/// Parses either a code or a bare numeric id.
pub fn parse_category_ref(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.starts_with(CODE_PREFIX) {
        id_from_code(value)
    } else {
        value.parse().ok()
    }
}

/// Looks up a category by id.
pub fn category_by_id(id: u32) -> Option<&'static ProductCategory> {
    BY_ID.get(&id).copied()
}

/// Looks up a category and expands its code and label.
pub fn lookup_category(id: u32) -> Option<CategoryInfo> {
    category_by_id(id).map(CategoryInfo::from)
}

/// All tier-1 categories, ordered by id.
pub fn tier1_categories() -> Vec<&'static ProductCategory> {
    CATEGORIES.iter().filter(|c| c.tier == 1).collect()
}

/// Direct children of a category, ordered by id.
pub fn child_categories(parent: u32) -> Vec<&'static ProductCategory> {
    CATEGORIES
        .iter()
        .filter(|c| c.parent == Some(parent))
        .collect()
}

/// Path from the root down to the category. Empty for unknown ids.
pub fn category_path(id: u32) -> Vec<&'static ProductCategory> {
    let mut path = Vec::new();
    let mut current = category_by_id(id);

    while let Some(category) = current {
        path.push(category);
        if path.len() >= MAX_DEPTH {
            break;
        }
        current = category.parent.and_then(category_by_id);
    }

    path.reverse();
    path
}

/// Path names joined with ` > `. Empty for unknown ids.
pub fn category_label(id: u32) -> String {
    category_path(id)
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(" > ")
}

/// The tier-1 ancestor of a category (itself for roots).
pub fn tier1_parent(id: u32) -> Option<&'static ProductCategory> {
    category_path(id).first().copied()
}

/// Returns true if `value` is a known id, as `IAB-AP-{id}` or a bare number.
pub fn is_valid_category(value: &str) -> bool {
    parse_category_ref(value)
        .map(|id| BY_ID.contains_key(&id))
        .unwrap_or(false)
}
