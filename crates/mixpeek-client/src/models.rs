//! Remote API request and response shapes.
//!
//! Responses are parsed leniently. Fields go by several names across API
//! versions, ids may be numbers or strings, and any section may be missing.

use mixpeek_core::product::mapper::CategoryCandidate;
use mixpeek_core::product::taxonomy::{category_by_id, parse_category_ref};
use mixpeek_core::{
    BrandSafetyResult, ContentInput, ContentSignals, RiskLevel, SentimentLabel, SentimentResult,
    TaxonomyResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Taxonomy id sent to the classify endpoint.
pub const PRODUCT_TAXONOMY: &str = "iab_ad_product_2.0";

/// Body for `POST /v1/collections/{id}/documents`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<u32>,
}

impl From<&ContentInput> for DocumentRequest {
    fn from(input: &ContentInput) -> Self {
        Self {
            url: input.url.clone(),
            title: input.title.clone(),
            text: input.text.clone(),
            description: input.description.clone(),
            metadata: DocumentMetadata {
                keywords: input.keywords.clone(),
                categories: input.categories.clone(),
            },
        }
    }
}

/// Response from document creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentResponse {
    #[serde(default, alias = "id")]
    pub document_id: Option<Value>,
    #[serde(default)]
    pub enrichments: Option<Enrichments>,
}

impl DocumentResponse {
    /// The document id as a string.
    pub fn document_id(&self) -> Option<String> {
        self.document_id.as_ref().and_then(value_to_string)
    }
}

/// Remote enrichment sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Enrichments {
    #[serde(default, alias = "taxonomy")]
    pub taxonomies: Vec<RemoteTaxonomy>,
    #[serde(default)]
    pub keywords: Vec<RemoteLabel>,
    #[serde(default)]
    pub sentiment: Option<RemoteSentiment>,
    #[serde(default)]
    pub brand_safety: Option<RemoteBrandSafety>,
    #[serde(default)]
    pub entities: Vec<RemoteLabel>,
    #[serde(default)]
    pub topics: Vec<RemoteLabel>,
}

impl Enrichments {
    /// Overlays remote sections onto locally computed signals.
    ///
    /// Sections the remote omitted or left unusable keep their local value.
    /// Brand safety is combined rather than replaced, so the remote can raise
    /// the risk level but never clear a local block.
    pub fn merge_into(&self, mut signals: ContentSignals) -> ContentSignals {
        if let Some(taxonomy) = self
            .taxonomies
            .iter()
            .filter_map(RemoteTaxonomy::to_result)
            .max_by(|a, b| a.score.total_cmp(&b.score))
        {
            signals.taxonomy = taxonomy;
        }

        let keywords = labels(&self.keywords);
        if !keywords.is_empty() {
            signals.keywords = keywords;
        }

        if let Some(sentiment) = self.sentiment.as_ref().and_then(RemoteSentiment::to_result) {
            signals.sentiment = sentiment;
        }

        if let Some(safety) = self.brand_safety.as_ref().and_then(RemoteBrandSafety::to_result) {
            let local = std::mem::take(&mut signals.brand_safety);
            signals.brand_safety = local.combine(safety);
        }

        signals.entities = labels(&self.entities);
        signals.topics = labels(&self.topics);
        signals
    }
}

/// A plain string or an object with a text-like field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteLabel {
    Text(String),
    Object(LabelObject),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelObject {
    #[serde(default, alias = "keyword", alias = "name", alias = "label")]
    pub text: Option<String>,
}

impl RemoteLabel {
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            RemoteLabel::Text(t) => t.as_str(),
            RemoteLabel::Object(o) => o.text.as_deref()?,
        };
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }
}

fn labels(values: &[RemoteLabel]) -> Vec<String> {
    values
        .iter()
        .filter_map(RemoteLabel::text)
        .map(str::to_string)
        .collect()
}

/// A remote taxonomy assignment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteTaxonomy {
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    #[serde(default, alias = "id")]
    pub node_id: Option<Value>,
    #[serde(default, alias = "hierarchy")]
    pub path: Option<Value>,
    #[serde(default, alias = "confidence")]
    pub score: Option<f32>,
    #[serde(default)]
    pub iab_v1: Option<Value>,
    #[serde(default)]
    pub iab_v3: Option<Value>,
}

impl RemoteTaxonomy {
    /// Converts to a taxonomy result. Entries without a label are dropped.
    pub fn to_result(&self) -> Option<TaxonomyResult> {
        let label = self.label.as_deref()?.trim();
        if label.is_empty() {
            return None;
        }
        let node_id = self
            .node_id
            .as_ref()
            .and_then(value_to_string)
            .unwrap_or_else(|| label.to_lowercase().replace(' ', "_"));
        let path = self
            .path
            .as_ref()
            .map(path_segments)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| vec![label.to_string()]);

        Some(TaxonomyResult {
            label: label.to_string(),
            node_id,
            path,
            score: self.score.unwrap_or(0.5).clamp(0.0, 1.0),
            iab_v1: self.iab_v1.as_ref().and_then(value_to_string),
            iab_v3: self.iab_v3.as_ref().and_then(value_to_string),
            matched: Vec::new(),
        })
    }
}

/// Remote sentiment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSentiment {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "confidence")]
    pub score: Option<f32>,
}

impl RemoteSentiment {
    pub fn to_result(&self) -> Option<SentimentResult> {
        let label = match self.label.as_deref()?.trim().to_lowercase().as_str() {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            "neutral" => SentimentLabel::Neutral,
            _ => return None,
        };
        Some(SentimentResult {
            label,
            score: self.score.unwrap_or(0.5).clamp(0.0, 1.0),
            positive: 0,
            negative: 0,
        })
    }
}

/// Remote brand-safety verdict.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteBrandSafety {
    #[serde(default, alias = "risk_level", alias = "risk")]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub categories: Vec<RemoteLabel>,
    #[serde(default)]
    pub blocked: Option<bool>,
}

impl RemoteBrandSafety {
    pub fn to_result(&self) -> Option<BrandSafetyResult> {
        let wanted = self.level.as_deref()?.trim().to_lowercase();
        let level = RiskLevel::all()
            .iter()
            .copied()
            .find(|l| l.as_str() == wanted)?;
        let blocked = self.blocked.unwrap_or(level == RiskLevel::Floor);
        Some(BrandSafetyResult {
            level,
            score: self.score.unwrap_or_else(|| level.safety_score()).clamp(0.0, 1.0),
            categories: labels(&self.categories),
            blocked,
            safe: !blocked && level != RiskLevel::Floor,
            flagged_keywords: Vec::new(),
            blocked_category_ids: Vec::new(),
        })
    }
}

/// Body for `POST /v1/classify`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest {
    pub content: ClassifyContent,
    pub taxonomy: String,
    pub options: ClassifyOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyContent {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyOptions {
    pub max_categories: usize,
    pub min_confidence: f32,
    pub include_hierarchy: bool,
}

impl ClassifyRequest {
    /// A product classification request.
    pub fn product(text: impl Into<String>, min_confidence: f32) -> Self {
        Self {
            content: ClassifyContent { text: text.into() },
            taxonomy: PRODUCT_TAXONOMY.to_string(),
            options: ClassifyOptions {
                max_categories: 3,
                min_confidence,
                include_hierarchy: true,
            },
        }
    }
}

/// Response from the classify endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default, alias = "results", alias = "classifications")]
    pub categories: Vec<RemoteCategory>,
}

impl ClassifyResponse {
    /// Candidates for categories that exist in the local taxonomy.
    pub fn candidates(&self) -> Vec<CategoryCandidate> {
        self.categories
            .iter()
            .filter_map(RemoteCategory::to_candidate)
            .collect()
    }
}

/// One remote product category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteCategory {
    #[serde(default, alias = "category_id")]
    pub id: Option<Value>,
    #[serde(default, alias = "category_name")]
    pub name: Option<String>,
    #[serde(default, alias = "score")]
    pub confidence: Option<f32>,
    #[serde(default, alias = "level")]
    pub tier: Option<u8>,
    #[serde(default, alias = "parent")]
    pub parent_id: Option<Value>,
    #[serde(default, alias = "hierarchy")]
    pub path: Option<Value>,
}

impl RemoteCategory {
    /// Returns the numeric category id, from `1118` or `"IAB-AP-1118"`.
    pub fn category_id(&self) -> Option<u32> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => parse_category_ref(s),
            _ => None,
        }
    }

    /// Converts to a candidate. Unknown ids are dropped.
    pub fn to_candidate(&self) -> Option<CategoryCandidate> {
        let id = self.category_id()?;
        let category = category_by_id(id)?;
        let name = self
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| category.name.to_string());
        Some(CategoryCandidate::semantic(
            id,
            name,
            self.confidence.unwrap_or(0.5),
        ))
    }
}

/// Remote health as reported by [`crate::MixpeekClient::health_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy(latency_ms: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Renders a string or number id.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Splits a path given as a list or as `"A > B"` / `"A/B"`.
fn path_segments(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_string).collect(),
        Value::String(s) => s
            .split(['>', '/'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Pulls a human-readable message out of an error body.
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            match json.get(key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(s)) = inner.get("message") {
                        return s.clone();
                    }
                }
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_document_with_enrichments() {
        let response: DocumentResponse = serde_json::from_value(json!({
            "document_id": "doc_123",
            "enrichments": {
                "taxonomies": [
                    {"label": "Sports", "node_id": "sports", "score": 0.7},
                    {"name": "Soccer", "id": 484, "confidence": 0.9, "hierarchy": "Sports > Soccer"}
                ],
                "keywords": ["goal", {"keyword": "striker"}, {"text": ""}],
                "sentiment": {"label": "Positive", "score": 0.8},
                "brand_safety": {"risk_level": "low", "categories": ["crime_harmful_acts"]},
                "entities": [{"name": "FIFA"}],
                "topics": ["world cup"]
            }
        }))
        .unwrap();

        assert_eq!(response.document_id().as_deref(), Some("doc_123"));
        let signals = response
            .enrichments
            .unwrap()
            .merge_into(ContentSignals::default());

        assert_eq!(signals.taxonomy.label, "Soccer");
        assert_eq!(signals.taxonomy.node_id, "484");
        assert_eq!(signals.taxonomy.path, vec!["Sports", "Soccer"]);
        assert_eq!(signals.keywords, vec!["goal", "striker"]);
        assert_eq!(signals.sentiment.label, SentimentLabel::Positive);
        assert_eq!(signals.brand_safety.level, RiskLevel::Low);
        assert!(signals.brand_safety.safe);
        assert_eq!(signals.entities, vec!["FIFA"]);
        assert_eq!(signals.topics, vec!["world cup"]);
    }

    #[test]
    fn missing_sections_keep_local_values() {
        let mut local = ContentSignals::default();
        local.keywords = vec!["local".to_string()];
        let merged = Enrichments::default().merge_into(local);
        assert_eq!(merged.keywords, vec!["local"]);
        assert!(merged.taxonomy.is_general());
    }

    #[test]
    fn remote_brand_safety_cannot_clear_a_local_block() {
        let mut local = ContentSignals::default();
        local.brand_safety = BrandSafetyResult {
            level: RiskLevel::Floor,
            score: 0.0,
            categories: vec!["adult_explicit_sexual_content".to_string()],
            blocked: true,
            safe: false,
            flagged_keywords: Vec::new(),
            blocked_category_ids: vec![1008],
        };
        let enrichments = Enrichments {
            brand_safety: Some(RemoteBrandSafety {
                level: Some("low".to_string()),
                blocked: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let merged = enrichments.merge_into(local).brand_safety;
        assert_eq!(merged.level, RiskLevel::Floor);
        assert!(merged.blocked);
        assert!(!merged.safe);
        assert_eq!(merged.blocked_category_ids, vec![1008]);
    }

    #[test]
    fn unknown_sentiment_label_is_ignored() {
        let sentiment = RemoteSentiment {
            label: Some("mixed".to_string()),
            score: Some(0.4),
        };
        assert!(sentiment.to_result().is_none());
    }

    #[test]
    fn floor_brand_safety_blocks_by_default() {
        let safety = RemoteBrandSafety {
            level: Some("FLOOR".to_string()),
            ..Default::default()
        };
        let result = safety.to_result().unwrap();
        assert!(result.blocked);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn normalizes_alternate_category_fields() {
        let response: ClassifyResponse = serde_json::from_value(json!({
            "results": [
                {"category_id": "IAB-AP-1118", "category_name": "Smartphones", "score": 0.82, "level": 2},
                {"id": 1116, "name": "Computers", "confidence": 0.4},
                {"id": 99999, "name": "Unknown", "confidence": 0.9},
                {"name": "No id"}
            ]
        }))
        .unwrap();

        let candidates = response.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id, 1118);
        assert!((candidates[0].confidence - 0.82).abs() < 1e-6);
        assert_eq!(candidates[1].name, "Computers");
    }

    #[test]
    fn classify_request_shape() {
        let json = serde_json::to_value(ClassifyRequest::product("Product: Phone", 0.3)).unwrap();
        assert_eq!(json["taxonomy"], PRODUCT_TAXONOMY);
        assert_eq!(json["content"]["text"], "Product: Phone");
        assert_eq!(json["options"]["max_categories"], 3);
    }

    #[test]
    fn document_request_skips_empty_fields() {
        let input = ContentInput::from_text("hello");
        let json = serde_json::to_value(DocumentRequest::from(&input)).unwrap();
        assert_eq!(json["text"], "hello");
        assert!(json.get("url").is_none());
        assert_eq!(json["metadata"], json!({}));
    }

    #[test]
    fn extracts_error_messages() {
        assert_eq!(error_message(r#"{"message": "bad key"}"#), "bad key");
        assert_eq!(error_message(r#"{"error": {"message": "nested"}}"#), "nested");
        assert_eq!(error_message(r#"{"detail": "not found"}"#), "not found");
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message(""), "empty response body");
    }
}
