//! API request and response models.

use chrono::{DateTime, Utc};
use mixpeek_client::product::MapOptions;
use mixpeek_client::{EngineStats, HealthReport, HealthStatus, MapperStats};
use mixpeek_core::adapters::gam::{Targeting, ValidationReport};
use mixpeek_core::adapters::prebid::Ortb2Fragments;
use mixpeek_core::product::mapper::MappingMode;
use mixpeek_core::product::taxonomy::CategoryInfo;
use mixpeek_core::{AnalysisResult, ContentInput, ProductInput, SignalSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content to analyze: structured fields or a raw HTML page.
///
/// Shared by `/api/analyze`, `/api/gam/targeting` and `/api/prebid/ortb2`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Raw HTML. When present, title, description and text are extracted
    /// from it and the structured fields other than `url` are ignored.
    #[serde(default)]
    pub html: Option<String>,
    #[serde(flatten)]
    pub content: ContentInput,
}

impl AnalyzeRequest {
    /// Returns true if there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        self.html.as_deref().map(str::trim).unwrap_or("").is_empty() && self.content.is_empty()
    }
}

/// Request body for POST /api/brand-safety. Exactly one of the two is used;
/// `product` wins when both are sent.
#[derive(Debug, Default, Deserialize)]
pub struct BrandSafetyRequest {
    #[serde(default)]
    pub content: Option<ContentInput>,
    #[serde(default)]
    pub product: Option<ProductInput>,
}

/// Request body for POST /api/openrtb/enrich.
#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    /// An OpenRTB 2.x bid request.
    pub bid_request: Value,
    /// Content to analyze. Derived from `site` in the bid request when absent.
    #[serde(default)]
    pub content: Option<ContentInput>,
}

/// Response body for POST /api/openrtb/enrich.
#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    pub bid_request: Value,
    pub source: SignalSource,
    pub cached: bool,
    pub latency_ms: u64,
}

/// Response body for POST /api/gam/targeting.
#[derive(Debug, Serialize)]
pub struct TargetingResponse {
    pub targeting: Targeting,
    pub validation: ValidationReport,
    pub source: SignalSource,
}

/// Response body for POST /api/prebid/ortb2.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebidResponse {
    pub ortb2_fragments: Ortb2Fragments,
    pub source: SignalSource,
}

/// Request body for POST /api/products/map.
#[derive(Debug, Default, Deserialize)]
pub struct ProductMapRequest {
    #[serde(flatten)]
    pub product: ProductInput,
    #[serde(default)]
    pub mode: Option<MappingMode>,
    #[serde(default)]
    pub min_confidence: Option<f32>,
    #[serde(default)]
    pub include_secondary: Option<bool>,
}

impl ProductMapRequest {
    pub fn options(&self) -> MapOptions {
        MapOptions {
            mode: self.mode,
            min_confidence: self.min_confidence,
            include_secondary: self.include_secondary,
        }
    }
}

/// Response body for GET /api/products/categories/{id}.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: CategoryInfo,
    /// Root to leaf, including the category itself.
    pub path: Vec<CategoryInfo>,
    pub children: Vec<CategoryInfo>,
}

/// Request body for POST /api/resources/{resource}/{operation}.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub body: Option<Value>,
}

/// Response body for GET /api/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub remote_enabled: bool,
    pub product_mode: MappingMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<HealthReport>,
    pub timestamp: DateTime<Utc>,
}

/// Response body for GET /api/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub analysis: EngineStats,
    pub products: MapperStats,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
}

/// Echoes analysis results verbatim.
pub type AnalyzeResponse = AnalysisResult;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyze_request_flattens_content() {
        let req: AnalyzeRequest = serde_json::from_value(json!({
            "title": "Hello",
            "keywords": ["a"]
        }))
        .unwrap();
        assert_eq!(req.content.title.as_deref(), Some("Hello"));
        assert_eq!(req.content.keywords, vec!["a"]);
        assert!(!req.is_empty());

        let empty: AnalyzeRequest = serde_json::from_value(json!({"html": "  "})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn product_request_reads_options() {
        let req: ProductMapRequest = serde_json::from_value(json!({
            "title": "Running shoes",
            "mode": "deterministic",
            "min_confidence": 0.5
        }))
        .unwrap();
        assert_eq!(req.product.title.as_deref(), Some("Running shoes"));
        let options = req.options();
        assert_eq!(options.mode, Some(MappingMode::Deterministic));
        assert_eq!(options.min_confidence, Some(0.5));
        assert_eq!(options.include_secondary, None);
    }
}
