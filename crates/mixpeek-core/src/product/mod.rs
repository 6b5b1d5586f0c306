//! IAB Ad Product Taxonomy 2.0 mapping.

pub mod keywords;
pub mod mapper;
pub mod taxonomy;

pub use keywords::{find_best_match, map_keyword, map_keywords, KeywordMatch};
pub use mapper::{
    format_mapping, merge_candidates, CategoryCandidate, DeterministicMapper, IabProduct,
    InputEcho, MapperConfig, MappingMode, MappingOutcome, MappingSource, ProductMapping,
    ProductQuery, SecondaryCategory,
};
pub use taxonomy::{
    category_by_id, category_label, iab_code, is_valid_category, lookup_category, CategoryInfo,
    ProductCategory, TAXONOMY_VERSION,
};
