//! Product to IAB Ad Product category mapping.
//!
//! The deterministic path lives here. The semantic path needs the remote
//! API, so callers supply its candidates and use [`merge_candidates`] and
//! [`format_mapping`] to build the final result.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::keywords::{find_best_match, map_keywords, KeywordMatch};
use super::taxonomy::{category_by_id, category_label, iab_code, tier1_parent, TAXONOMY_VERSION};
use crate::cache::cache_key;
use crate::content::ProductInput;
use crate::error::{Result, SignalError};
use crate::lexicon::Lexicon;

/// Maximum title length after sanitizing.
pub const MAX_TITLE_LEN: usize = 500;

/// Maximum description length after sanitizing.
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Message returned when nothing matched.
pub const NO_MATCH_MESSAGE: &str = "No matching category found";

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));

/// How a product is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// Keyword table only.
    Deterministic,
    /// Remote classification only.
    Semantic,
    /// Keyword table first, remote classification when not confident.
    #[default]
    Hybrid,
}

impl MappingMode {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingMode::Deterministic => "deterministic",
            MappingMode::Semantic => "semantic",
            MappingMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for MappingMode {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deterministic" => Ok(MappingMode::Deterministic),
            "semantic" => Ok(MappingMode::Semantic),
            "hybrid" => Ok(MappingMode::Hybrid),
            other => Err(SignalError::InvalidConfig(format!(
                "unknown mapping mode: {}",
                other
            ))),
        }
    }
}

/// Which path produced a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    Deterministic,
    Semantic,
    Hybrid,
}

/// A candidate category with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCandidate {
    pub id: u32,
    pub name: String,
    pub confidence: f32,
    /// Keywords that produced a deterministic hit.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Paths that proposed this category.
    #[serde(default)]
    pub sources: Vec<MappingSource>,
}

impl CategoryCandidate {
    /// Creates a candidate from a remote classification.
    pub fn semantic(id: u32, name: impl Into<String>, confidence: f32) -> Self {
        Self {
            id,
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            keywords: Vec::new(),
            sources: vec![MappingSource::Semantic],
        }
    }
}

impl From<KeywordMatch> for CategoryCandidate {
    fn from(m: KeywordMatch) -> Self {
        Self {
            id: m.id,
            name: m.name,
            confidence: m.confidence,
            keywords: m.keywords,
            sources: vec![MappingSource::Deterministic],
        }
    }
}

/// Candidates from one mapping path, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingOutcome {
    pub source: MappingSource,
    pub categories: Vec<CategoryCandidate>,
}

impl MappingOutcome {
    /// An outcome with no candidates.
    pub fn empty(source: MappingSource) -> Self {
        Self {
            source,
            categories: Vec::new(),
        }
    }

    /// Returns true if any candidate reaches `threshold`.
    pub fn has_confidence(&self, threshold: f32) -> bool {
        self.categories.iter().any(|c| c.confidence >= threshold)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Validated and sanitized product fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub title: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    pub keywords: Vec<String>,
}

impl ProductQuery {
    /// Validates and sanitizes a product.
    ///
    /// Fails with `INVALID_INPUT` when both title and description are blank.
    pub fn from_input(input: &ProductInput) -> Result<Self> {
        let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
        if blank(&input.title) && blank(&input.description) {
            return Err(SignalError::InvalidInput(
                "At least title or description is required".to_string(),
            ));
        }

        Ok(Self {
            title: sanitize(input.title.as_deref(), MAX_TITLE_LEN),
            description: sanitize(input.description.as_deref(), MAX_DESCRIPTION_LEN),
            category: input.category.as_deref().unwrap_or("").trim().to_string(),
            brand: input.brand.as_deref().unwrap_or("").trim().to_string(),
            keywords: input
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        })
    }

    /// Title, description, category, and brand joined by spaces.
    pub fn combined_text(&self) -> String {
        [&self.title, &self.description, &self.category, &self.brand]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Text sent to the remote classifier, one labelled field per line.
    pub fn classification_text(&self) -> String {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            parts.push(format!("Product: {}", self.title));
        }
        if !self.description.is_empty() {
            parts.push(format!("Description: {}", self.description));
        }
        if !self.category.is_empty() {
            parts.push(format!("Category: {}", self.category));
        }
        if !self.brand.is_empty() {
            parts.push(format!("Brand: {}", self.brand));
        }
        parts.join("\n")
    }

    /// Cache key over the leading title, description, and category.
    pub fn cache_key(&self) -> String {
        let title: String = self.title.chars().take(100).collect();
        let description: String = self.description.chars().take(200).collect();
        cache_key("product", &[&title, &description, &self.category])
    }

    /// Echo of the input attached to results.
    pub fn echo(&self) -> InputEcho {
        InputEcho {
            title: self.title.clone(),
            description: (!self.description.is_empty())
                .then(|| self.description.chars().take(100).collect()),
        }
    }
}

/// Strips control characters, collapses whitespace, trims, and truncates.
pub fn sanitize(text: Option<&str>, max_len: usize) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let text = CONTROL_CHARS.replace_all(text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().chars().take(max_len).collect()
}

/// Deterministic mapping options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub mode: MappingMode,
    /// Candidates below this confidence are dropped.
    pub min_confidence: f32,
    /// A deterministic candidate at or above this skips the remote call.
    pub high_confidence: f32,
    /// Number of tokens extracted from product text.
    pub keyword_limit: usize,
    /// Include up to three secondary categories.
    pub include_secondary: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            mode: MappingMode::Hybrid,
            min_confidence: 0.3,
            high_confidence: 0.9,
            keyword_limit: 20,
            include_secondary: true,
        }
    }
}

impl MapperConfig {
    /// Sets the mapping mode.
    pub fn with_mode(mut self, mode: MappingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the minimum confidence.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }
}

/// Keyword-table product mapper.
#[derive(Debug, Clone)]
pub struct DeterministicMapper {
    lexicon: Arc<Lexicon>,
    keyword_limit: usize,
}

impl DeterministicMapper {
    /// Creates a mapper using the lexicon's stop words.
    pub fn new(lexicon: Arc<Lexicon>, keyword_limit: usize) -> Self {
        Self {
            lexicon,
            keyword_limit,
        }
    }

    /// Creates a mapper with the shared lexicon.
    pub fn with_defaults() -> Self {
        Self::new(Lexicon::shared(), MapperConfig::default().keyword_limit)
    }

    /// Frequency-ranked tokens longer than two characters. Hyphens are kept.
    pub fn extract_keywords(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let cleaned = NON_WORD.replace_all(&lower, " ");

        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for word in cleaned.split_whitespace() {
            if word.chars().count() <= 2 || self.lexicon.is_stop_word(word) {
                continue;
            }
            match index.get(word) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(word.to_string(), counts.len());
                    counts.push((word.to_string(), 1));
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
            .into_iter()
            .take(self.keyword_limit)
            .map(|(w, _)| w)
            .collect()
    }

    /// Maps a product by keyword lookup.
    ///
    /// Caller keywords come first, then extracted ones. When no keyword maps,
    /// the free text is scanned for single words and two-word phrases.
    pub fn map(&self, query: &ProductQuery, min_confidence: f32) -> MappingOutcome {
        let text = query.combined_text();

        let mut keywords: Vec<String> = Vec::new();
        for keyword in query
            .keywords
            .iter()
            .map(|k| k.to_lowercase())
            .chain(self.extract_keywords(&text))
        {
            if !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }

        let matches = map_keywords(&keywords);
        let categories: Vec<CategoryCandidate> = if !matches.is_empty() {
            matches
                .into_iter()
                .filter(|m| m.confidence >= min_confidence)
                .map(CategoryCandidate::from)
                .collect()
        } else {
            find_best_match(&text)
                .filter(|m| m.confidence >= min_confidence)
                .map(CategoryCandidate::from)
                .into_iter()
                .collect()
        };

        MappingOutcome {
            source: MappingSource::Deterministic,
            categories,
        }
    }
}

impl Default for DeterministicMapper {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Merges deterministic and semantic candidates.
///
/// A category proposed by both gains 0.1 confidence, capped at 0.99. The
/// result is sorted by confidence; equal confidences keep deterministic
/// candidates first.
pub fn merge_candidates(
    deterministic: &[CategoryCandidate],
    semantic: &[CategoryCandidate],
) -> Vec<CategoryCandidate> {
    let mut merged: Vec<CategoryCandidate> = deterministic.to_vec();

    for candidate in semantic {
        match merged.iter_mut().find(|c| c.id == candidate.id) {
            Some(existing) => {
                existing.confidence = (existing.confidence + 0.1).min(0.99);
                if !existing.sources.contains(&MappingSource::Semantic) {
                    existing.sources.push(MappingSource::Semantic);
                }
            }
            None => merged.push(candidate.clone()),
        }
    }

    merged.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    merged
}

/// Input fields echoed back with a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEcho {
    pub title: String,
    /// First 100 characters of the description.
    pub description: Option<String>,
}

/// A secondary category in a mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondaryCategory {
    pub code: String,
    pub id: u32,
    pub label: String,
    pub confidence: f32,
}

/// The chosen IAB Ad Product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IabProduct {
    /// `IAB-AP-{id}` code.
    pub primary: String,
    pub primary_id: u32,
    /// Full path label.
    pub label: String,
    pub confidence: f32,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier1_label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<SecondaryCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Result of mapping one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMapping {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iab_product: Option<IabProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MappingSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputEcho>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub latency_ms: u64,
}

impl ProductMapping {
    /// An unsuccessful mapping carrying an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            iab_product: None,
            source: None,
            error: Some(message.into()),
            input: None,
            cached: false,
            latency_ms: 0,
        }
    }

    /// Sets the latency.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Marks the mapping as served from cache.
    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }
}

/// Builds the final mapping from the best candidates.
pub fn format_mapping(
    outcome: &MappingOutcome,
    query: &ProductQuery,
    include_secondary: bool,
) -> ProductMapping {
    let Some(primary) = outcome
        .categories
        .iter()
        .find(|c| category_by_id(c.id).is_some())
    else {
        return ProductMapping {
            source: Some(outcome.source),
            input: Some(query.echo()),
            ..ProductMapping::failure(NO_MATCH_MESSAGE)
        };
    };

    let tier1 = tier1_parent(primary.id).filter(|t| t.id != primary.id);

    let secondary = if include_secondary {
        outcome
            .categories
            .iter()
            .filter(|c| c.id != primary.id && category_by_id(c.id).is_some())
            .take(3)
            .map(|c| SecondaryCategory {
                code: iab_code(c.id),
                id: c.id,
                label: category_label(c.id),
                confidence: c.confidence,
            })
            .collect()
    } else {
        Vec::new()
    };

    let explanation = match outcome.source {
        MappingSource::Deterministic if !primary.keywords.is_empty() => {
            Some(format!("Matched keywords: {}", primary.keywords.join(", ")))
        }
        MappingSource::Deterministic => None,
        MappingSource::Semantic => {
            Some("Semantic classification based on product content".to_string())
        }
        MappingSource::Hybrid => {
            Some("Combined deterministic and semantic classification".to_string())
        }
    };

    ProductMapping {
        success: true,
        iab_product: Some(IabProduct {
            primary: iab_code(primary.id),
            primary_id: primary.id,
            label: category_label(primary.id),
            confidence: primary.confidence,
            version: TAXONOMY_VERSION.to_string(),
            tier1: tier1.map(|t| iab_code(t.id)),
            tier1_id: tier1.map(|t| t.id),
            tier1_label: tier1.map(|t| t.name.to_string()),
            secondary,
            explanation,
        }),
        source: Some(outcome.source),
        error: None,
        input: Some(query.echo()),
        cached: false,
        latency_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(input: ProductInput) -> ProductQuery {
        ProductQuery::from_input(&input).unwrap()
    }

    #[test]
    fn rejects_empty_product() {
        let err = ProductQuery::from_input(&ProductInput::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid input: At least title or description is required");

        let blank = ProductInput::new("   ");
        assert!(ProductQuery::from_input(&blank).is_err());
    }

    #[test]
    fn description_alone_is_enough() {
        let input = ProductInput::default().with_description("Wireless earbuds");
        assert!(ProductQuery::from_input(&input).is_ok());
    }

    #[test]
    fn sanitizes_fields() {
        assert_eq!(sanitize(Some("  Apple\u{0}  iPhone\t15  "), 500), "Apple iPhone15");
        assert_eq!(sanitize(Some("abcdef"), 3), "abc");
        assert_eq!(sanitize(None, 10), "");

        let long = "x".repeat(600);
        assert_eq!(query(ProductInput::new(long)).title.len(), MAX_TITLE_LEN);
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Hybrid".parse::<MappingMode>().unwrap(), MappingMode::Hybrid);
        assert!("fuzzy".parse::<MappingMode>().is_err());
        assert_eq!(MappingMode::default(), MappingMode::Hybrid);
    }

    #[test]
    fn maps_smartphone_deterministically() {
        let q = query(
            ProductInput::new("Apple iPhone 15 Pro Max")
                .with_description("Latest smartphone with A17 chip")
                .with_brand("Apple"),
        );
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        assert_eq!(outcome.source, MappingSource::Deterministic);
        assert_eq!(outcome.categories[0].id, 1118);
        assert_eq!(outcome.categories[0].keywords, vec!["iphone", "smartphone"]);
    }

    #[test]
    fn caller_keywords_are_used() {
        let q = query(ProductInput::new("Mystery box").with_keywords(["Bitcoin"]));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        assert_eq!(outcome.categories[0].id, 1621);
    }

    #[test]
    fn falls_back_to_phrase_scan() {
        let q = query(ProductInput::new("Weight loss shakes"));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        assert_eq!(outcome.categories[0].id, 1220);
    }

    #[test]
    fn min_confidence_filters_candidates() {
        let q = query(ProductInput::new("Red wine"));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.96);
        assert!(outcome.is_empty());
    }

    #[test]
    fn extracted_keywords_skip_short_and_stop_words() {
        let mapper = DeterministicMapper::with_defaults();
        let words = mapper.extract_keywords("The e-cigarette kit and the e-cigarette case");
        assert_eq!(words, vec!["e-cigarette", "kit", "case"]);
    }

    #[test]
    fn merge_boosts_agreement() {
        let det = vec![CategoryCandidate {
            id: 1118,
            name: "Smartphones".to_string(),
            confidence: 0.8,
            keywords: vec!["phone".to_string()],
            sources: vec![MappingSource::Deterministic],
        }];
        let sem = vec![
            CategoryCandidate::semantic(1116, "Computers and Laptops", 0.85),
            CategoryCandidate::semantic(1118, "Smartphones", 0.7),
        ];
        let merged = merge_candidates(&det, &sem);
        assert_eq!(merged[0].id, 1118);
        assert!((merged[0].confidence - 0.9).abs() < 1e-6);
        assert_eq!(
            merged[0].sources,
            vec![MappingSource::Deterministic, MappingSource::Semantic]
        );
        assert_eq!(merged[1].id, 1116);
    }

    #[test]
    fn merge_caps_confidence() {
        let det = vec![CategoryCandidate::semantic(1004, "Beer", 0.95)];
        let sem = vec![CategoryCandidate::semantic(1004, "Beer", 0.9)];
        assert_eq!(merge_candidates(&det, &sem)[0].confidence, 0.99);
    }

    #[test]
    fn formats_successful_mapping() {
        let q = query(ProductInput::new("Apple Watch Series 9").with_keywords(["apple watch"]));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        let mapping = format_mapping(&outcome, &q, true);

        assert!(mapping.success);
        let product = mapping.iab_product.unwrap();
        assert_eq!(product.primary, "IAB-AP-1121");
        assert_eq!(product.label, "Consumer Electronics > Wearables > Smartwatches");
        assert_eq!(product.version, "2.0");
        assert_eq!(product.tier1.as_deref(), Some("IAB-AP-1115"));
        assert_eq!(product.tier1_label.as_deref(), Some("Consumer Electronics"));
        assert_eq!(product.secondary[0].id, 1070);
        assert!(product.explanation.unwrap().starts_with("Matched keywords:"));
    }

    #[test]
    fn tier1_omitted_for_roots() {
        let q = query(ProductInput::new("Tobacco"));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        let product = format_mapping(&outcome, &q, true).iab_product.unwrap();
        assert_eq!(product.primary_id, 1800);
        assert!(product.tier1.is_none());
    }

    #[test]
    fn formats_no_match() {
        let q = query(ProductInput::new("Lorem ipsum dolor"));
        let outcome = DeterministicMapper::with_defaults().map(&q, 0.3);
        let mapping = format_mapping(&outcome, &q, true);
        assert!(!mapping.success);
        assert_eq!(mapping.error.as_deref(), Some(NO_MATCH_MESSAGE));
        assert_eq!(mapping.input.unwrap().title, "Lorem ipsum dolor");
    }

    #[test]
    fn secondary_is_limited_to_three() {
        let outcome = MappingOutcome {
            source: MappingSource::Semantic,
            categories: [1118, 1116, 1117, 1120, 1126]
                .iter()
                .map(|&id| CategoryCandidate::semantic(id, "", 0.5))
                .collect(),
        };
        let q = query(ProductInput::new("Gadget"));
        let product = format_mapping(&outcome, &q, true).iab_product.unwrap();
        assert_eq!(product.secondary.len(), 3);
        assert!(format_mapping(&outcome, &q, false)
            .iab_product
            .unwrap()
            .secondary
            .is_empty());
    }

    #[test]
    fn cache_key_ignores_case_and_brand() {
        let a = query(ProductInput::new("iPhone").with_brand("Apple"));
        let b = query(ProductInput::new("IPHONE").with_brand("Other"));
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
