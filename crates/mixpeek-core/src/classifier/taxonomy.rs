//! Keyword-table taxonomy inference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, TaxonomyCategory};

/// Confidence never exceeds this value for a local match.
pub const MAX_CONFIDENCE: f32 = 0.95;

/// IAB 1.0 code for uncategorized content.
const GENERAL_IAB_V1: &str = "IAB24";

/// Best taxonomy match for a keyword set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyResult {
    pub label: String,
    pub node_id: String,
    pub path: Vec<String>,
    /// Confidence in `[0, 0.95]`.
    pub score: f32,
    /// IAB Content Taxonomy 1.0 code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iab_v1: Option<String>,
    /// IAB Content Taxonomy 3.0 unique id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iab_v3: Option<String>,
    /// Category keywords that matched.
    #[serde(default)]
    pub matched: Vec<String>,
}

impl TaxonomyResult {
    /// The fallback result when nothing matches.
    pub fn general() -> Self {
        Self {
            label: "General".to_string(),
            node_id: "general".to_string(),
            path: vec!["General".to_string()],
            score: 0.5,
            iab_v1: Some(GENERAL_IAB_V1.to_string()),
            iab_v3: None,
            matched: Vec::new(),
        }
    }

    /// Returns true if this is the fallback result.
    pub fn is_general(&self) -> bool {
        self.node_id == "general"
    }

    fn from_category(category: &TaxonomyCategory, matched: Vec<String>) -> Self {
        Self {
            label: category.label.clone(),
            node_id: category.node_id.clone(),
            path: category.path.clone(),
            score: confidence(matched.len()),
            iab_v1: Some(category.iab_v1.clone()),
            iab_v3: category.iab_v3.clone(),
            matched,
        }
    }
}

impl Default for TaxonomyResult {
    fn default() -> Self {
        Self::general()
    }
}

/// Confidence for a given number of matched category keywords.
pub fn confidence(matches: usize) -> f32 {
    (0.5 + 0.1 * matches as f32).min(MAX_CONFIDENCE)
}

/// Matching options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyConfig {
    /// Minimum length of the contained term for a substring match.
    ///
    /// Exact matches always count. 0 allows any containment.
    pub min_partial_len: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self { min_partial_len: 3 }
    }
}

impl TaxonomyConfig {
    /// Sets the minimum partial-match length.
    pub fn with_min_partial_len(mut self, len: usize) -> Self {
        self.min_partial_len = len;
        self
    }
}

/// Scores the lexicon's category table against extracted keywords.
#[derive(Debug, Clone)]
pub struct TaxonomyClassifier {
    lexicon: Arc<Lexicon>,
    config: TaxonomyConfig,
}

impl TaxonomyClassifier {
    /// Creates a classifier over the given lexicon.
    pub fn new(lexicon: Arc<Lexicon>, config: TaxonomyConfig) -> Self {
        Self { lexicon, config }
    }

    /// Creates a classifier with the shared lexicon.
    pub fn with_defaults() -> Self {
        Self::new(Lexicon::shared(), TaxonomyConfig::default())
    }

    /// Returns the best-scoring category.
    ///
    /// Categories are visited in declaration order and only a strictly
    /// higher score replaces the current best.
    pub fn classify<S: AsRef<str>>(&self, keywords: &[S]) -> TaxonomyResult {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return TaxonomyResult::general();
        }

        let mut best: Option<(&TaxonomyCategory, Vec<String>)> = None;

        for category in &self.lexicon.taxonomy {
            let matched: Vec<String> = category
                .keywords
                .iter()
                .filter(|ck| keywords.iter().any(|k| self.is_match(k, ck)))
                .cloned()
                .collect();

            if matched.is_empty() {
                continue;
            }

            let better = best
                .as_ref()
                .map(|(_, m)| matched.len() > m.len())
                .unwrap_or(true);
            if better {
                best = Some((category, matched));
            }
        }

        match best {
            Some((category, matched)) => TaxonomyResult::from_category(category, matched),
            None => TaxonomyResult::general(),
        }
    }

    fn is_match(&self, keyword: &str, category_keyword: &str) -> bool {
        if keyword == category_keyword {
            return true;
        }
        let min = self.config.min_partial_len;
        (category_keyword.chars().count() >= min && keyword.contains(category_keyword))
            || (keyword.chars().count() >= min && category_keyword.contains(keyword))
    }
}

impl Default for TaxonomyClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> TaxonomyClassifier {
        TaxonomyClassifier::with_defaults()
    }

    #[test]
    fn detects_technology() {
        let result = classifier().classify(&["software", "programming", "developer", "code"]);
        assert_eq!(result.label, "Technology");
        assert_eq!(result.node_id, "technology");
        assert_eq!(result.iab_v1.as_deref(), Some("IAB19"));
        assert!((result.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn unmatched_keywords_are_general() {
        let result = classifier().classify(&["xyz", "abc", "random"]);
        assert_eq!(result.label, "General");
        assert_eq!(result.score, 0.5);
        assert!(result.is_general());
    }

    #[test]
    fn empty_keywords_are_general() {
        let empty: [&str; 0] = [];
        assert!(classifier().classify(&empty).is_general());
    }

    #[test]
    fn confidence_is_capped() {
        let result = classifier().classify(&[
            "software", "programming", "developer", "code", "computer", "technology", "cloud",
            "data",
        ]);
        assert_eq!(result.score, MAX_CONFIDENCE);
    }

    #[test]
    fn confidence_grows_with_matches() {
        let mut last = 0.0;
        for n in 0..10 {
            let c = confidence(n);
            assert!(c >= last);
            last = c;
        }
    }

    #[test]
    fn ties_go_to_first_declared() {
        // one technology keyword, one business keyword
        let result = classifier().classify(&["software", "finance"]);
        assert_eq!(result.node_id, "technology");

        let result = classifier().classify(&["finance", "software"]);
        assert_eq!(result.node_id, "technology");
    }

    #[test]
    fn partial_match_needs_min_length() {
        // "ai" is a technology keyword but too short to match by containment
        let result = classifier().classify(&["trail", "maintain"]);
        assert!(result.is_general());

        let loose = TaxonomyClassifier::new(
            Lexicon::shared(),
            TaxonomyConfig::default().with_min_partial_len(0),
        );
        assert_eq!(loose.classify(&["trail"]).node_id, "technology");
    }

    #[test]
    fn containment_matches_longer_terms() {
        let result = classifier().classify(&["footballer", "basketballs"]);
        assert_eq!(result.node_id, "sports");
        assert_eq!(result.matched, vec!["football", "basketball"]);
    }

    #[test]
    fn keywords_are_normalized() {
        let result = classifier().classify(&["  Travel ", "HOTEL"]);
        assert_eq!(result.node_id, "travel");
    }
}
