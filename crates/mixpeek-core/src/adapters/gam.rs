//! Google Ad Manager key-value targeting.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::signals::ContentSignals;

/// GAM limit on value length.
pub const MAX_VALUE_LEN: usize = 40;

/// GAM limit on key length.
pub const MAX_KEY_LEN: usize = 20;

/// Keyword values emitted under [`keys::KEYWORDS`].
pub const MAX_KEYWORD_VALUES: usize = 5;

/// Targeting key names.
pub mod keys {
    pub const CATEGORY: &str = "mixpeek_category";
    pub const NODE: &str = "mixpeek_node";
    pub const IAB_V1: &str = "mixpeek_iab_v1";
    pub const IAB_V3: &str = "mixpeek_iab_v3";
    pub const CONFIDENCE: &str = "mixpeek_confidence";
    pub const SENTIMENT: &str = "mixpeek_sentiment";
    pub const SAFETY: &str = "mixpeek_safety";
    pub const BLOCKED: &str = "mixpeek_blocked";
    pub const GARM: &str = "mixpeek_garm";
    pub const KEYWORDS: &str = "mixpeek_keywords";
}

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid regex"));
static VALUE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_-]*$").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s/>&]+").expect("valid regex"));
static INVALID_VALUE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid regex"));

/// One targeting value, either a single string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetingValue {
    Single(String),
    Multi(Vec<String>),
}

impl TargetingValue {
    /// Iterates over the contained strings.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            TargetingValue::Single(v) => std::slice::from_ref(v),
            TargetingValue::Multi(vs) => vs,
        };
        slice.iter().map(String::as_str)
    }
}

/// A key-value targeting map, ordered by key.
pub type Targeting = BTreeMap<String, TargetingValue>;

/// Lowercases a value and reduces it to `[a-z0-9_-]`, at most 40 chars.
///
/// Spaces and path separators become `_`; runs of `_` collapse and are
/// trimmed from the ends.
pub fn sanitize_value(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    let separated = SEPARATORS.replace_all(&lower, "_");
    let cleaned = INVALID_VALUE_CHARS.replace_all(&separated, "");

    let mut out = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let truncated: String = out.trim_matches('_').chars().take(MAX_VALUE_LEN).collect();
    truncated.trim_end_matches('_').to_string()
}

/// Builds the targeting map for a signal set.
///
/// Category, sentiment, and safety keys are always present. List keys are
/// omitted when empty.
pub fn build_targeting(signals: &ContentSignals) -> Targeting {
    let mut targeting = Targeting::new();
    let mut single = |key: &str, value: &str| {
        targeting.insert(key.to_string(), TargetingValue::Single(sanitize_value(value)));
    };

    let taxonomy = &signals.taxonomy;
    single(keys::CATEGORY, &taxonomy.label);
    single(keys::NODE, &taxonomy.node_id);
    if let Some(v1) = &taxonomy.iab_v1 {
        single(keys::IAB_V1, v1);
    }
    if let Some(v3) = &taxonomy.iab_v3 {
        single(keys::IAB_V3, v3);
    }
    single(keys::CONFIDENCE, confidence_bucket(taxonomy.score));
    single(keys::SENTIMENT, signals.sentiment.label.as_str());
    single(keys::SAFETY, signals.brand_safety.level.as_str());
    single(
        keys::BLOCKED,
        if signals.brand_safety.blocked { "true" } else { "false" },
    );

    let garm = sanitize_list(&signals.brand_safety.categories, usize::MAX);
    if !garm.is_empty() {
        targeting.insert(keys::GARM.to_string(), TargetingValue::Multi(garm));
    }

    let keywords = sanitize_list(&signals.keywords, MAX_KEYWORD_VALUES);
    if !keywords.is_empty() {
        targeting.insert(keys::KEYWORDS.to_string(), TargetingValue::Multi(keywords));
    }

    targeting
}

/// Coarse confidence bucket for a `[0, 1]` score.
pub fn confidence_bucket(score: f32) -> &'static str {
    if score >= 0.8 {
        "high"
    } else if score >= 0.6 {
        "medium"
    } else {
        "low"
    }
}

fn sanitize_list(values: &[String], limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.iter().map(|v| sanitize_value(v)) {
        if out.len() >= limit {
            break;
        }
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// One targeting rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingIssue {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub message: String,
}

/// Result of [`validate_targeting`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<TargetingIssue>,
}

/// Checks keys and values against GAM limits without changing them.
pub fn validate_targeting(targeting: &Targeting) -> ValidationReport {
    let mut issues = Vec::new();

    for (key, value) in targeting {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            issues.push(TargetingIssue {
                key: key.clone(),
                value: None,
                message: format!("key must be 1-{} characters", MAX_KEY_LEN),
            });
        } else if !KEY_PATTERN.is_match(key) {
            issues.push(TargetingIssue {
                key: key.clone(),
                value: None,
                message: "key may only contain letters, digits, and underscores".to_string(),
            });
        }

        for v in value.values() {
            if v.chars().count() > MAX_VALUE_LEN {
                issues.push(TargetingIssue {
                    key: key.clone(),
                    value: Some(v.to_string()),
                    message: format!("value exceeds {} characters", MAX_VALUE_LEN),
                });
            }
            if !VALUE_PATTERN.is_match(v) {
                issues.push(TargetingIssue {
                    key: key.clone(),
                    value: Some(v.to_string()),
                    message: "value may only contain a-z, 0-9, '_' and '-'".to_string(),
                });
            }
        }
    }

    ValidationReport {
        valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LocalAnalyzer;
    use crate::content::ContentInput;

    #[test]
    fn sanitizes_labels() {
        assert_eq!(sanitize_value("Real Estate!"), "real_estate");
        assert_eq!(sanitize_value("Food & Drink"), "food_drink");
        assert_eq!(sanitize_value("Technology > AI"), "technology_ai");
        assert_eq!(sanitize_value("  IAB19-2 "), "iab19-2");
        assert_eq!(sanitize_value("!!!"), "");
    }

    #[test]
    fn sanitized_values_fit_gam_rules() {
        let inputs = [
            "Real Estate!",
            "A very long category label that keeps going well past the limit",
            "ÜBER Café",
            "__x__",
        ];
        for input in inputs {
            let value = sanitize_value(input);
            assert!(VALUE_PATTERN.is_match(&value), "{:?}", value);
            assert!(value.len() <= MAX_VALUE_LEN, "{:?}", value);
        }
    }

    #[test]
    fn builds_default_targeting() {
        let targeting = build_targeting(&ContentSignals::default());
        assert_eq!(
            targeting[keys::CATEGORY],
            TargetingValue::Single("general".to_string())
        );
        assert_eq!(
            targeting[keys::SENTIMENT],
            TargetingValue::Single("neutral".to_string())
        );
        assert_eq!(targeting[keys::SAFETY], TargetingValue::Single("safe".to_string()));
        assert!(!targeting.contains_key(keys::KEYWORDS));
        assert!(validate_targeting(&targeting).valid);
    }

    #[test]
    fn includes_garm_and_keywords() {
        let signals = LocalAnalyzer::with_defaults().analyze(&ContentInput::from_text(
            "Violence and murder with weapons and drugs reported downtown downtown",
        ));
        let targeting = build_targeting(&signals);

        match &targeting[keys::GARM] {
            TargetingValue::Multi(values) => assert!(!values.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        match &targeting[keys::KEYWORDS] {
            TargetingValue::Multi(values) => {
                assert!(values.len() <= MAX_KEYWORD_VALUES);
                assert_eq!(values[0], "downtown");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            targeting[keys::BLOCKED],
            TargetingValue::Single("true".to_string())
        );
        assert!(validate_targeting(&targeting).valid);
    }

    #[test]
    fn validation_reports_without_mutating() {
        let mut targeting = Targeting::new();
        targeting.insert(
            "bad-key!".to_string(),
            TargetingValue::Single("Upper Case".to_string()),
        );
        targeting.insert(
            "a_key_that_is_far_too_long".to_string(),
            TargetingValue::Multi(vec!["x".repeat(41)]),
        );
        let before = targeting.clone();

        let report = validate_targeting(&targeting);
        assert!(!report.valid);
        assert_eq!(report.issues.len(), 4);
        assert_eq!(targeting, before);
    }

    #[test]
    fn serializes_untagged() {
        let mut targeting = Targeting::new();
        targeting.insert("a".to_string(), TargetingValue::Single("x".to_string()));
        targeting.insert(
            "b".to_string(),
            TargetingValue::Multi(vec!["y".to_string(), "z".to_string()]),
        );
        let json = serde_json::to_value(&targeting).unwrap();
        assert_eq!(json, serde_json::json!({"a": "x", "b": ["y", "z"]}));
    }

    #[test]
    fn confidence_buckets() {
        assert_eq!(confidence_bucket(0.95), "high");
        assert_eq!(confidence_bucket(0.6), "medium");
        assert_eq!(confidence_bucket(0.5), "low");
    }
}
