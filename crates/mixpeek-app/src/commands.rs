//! One-shot commands run from the command line.

use clap::ValueEnum;
use mixpeek_client::product::MapOptions;
use mixpeek_client::{HealthReport, HealthStatus, ProductMapper, SignalEngine};
use mixpeek_core::adapters::{gam, openrtb, prebid};
use mixpeek_core::product::mapper::ProductMapping;
use mixpeek_core::{AnalysisResult, ContentInput, ProductInput};
use serde::Serialize;
use serde_json::{json, Value};

/// Output shape for `analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The full analysis result.
    #[default]
    Signals,
    /// OpenRTB `site.content`.
    Openrtb,
    /// GAM key-values with a validation report.
    Gam,
    /// Prebid `ortb2Fragments`.
    Prebid,
}

/// What to analyze.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeInput {
    pub content: ContentInput,
    pub html: Option<String>,
}

/// Analyzes content and renders it in `format`.
pub async fn analyze(engine: &SignalEngine, input: &AnalyzeInput, format: OutputFormat) -> Value {
    let result = match &input.html {
        Some(html) => engine.analyze_html(html, input.content.url.as_deref()).await,
        None => engine.analyze(&input.content).await,
    };
    render(&result, format)
}

/// Renders an analysis result.
pub fn render(result: &AnalysisResult, format: OutputFormat) -> Value {
    match format {
        OutputFormat::Signals => to_value(result),
        OutputFormat::Openrtb => to_value(&openrtb::site_content_for(result)),
        OutputFormat::Gam => {
            let targeting = gam::build_targeting(&result.signals);
            let validation = gam::validate_targeting(&targeting);
            json!({ "targeting": targeting, "validation": validation })
        }
        OutputFormat::Prebid => json!({ "ortb2Fragments": prebid::ortb2_fragments(result) }),
    }
}

/// Maps one product.
pub async fn map_product(
    mapper: &ProductMapper,
    product: &ProductInput,
    options: &MapOptions,
) -> mixpeek_client::Result<ProductMapping> {
    mapper.map(product, options).await
}

/// Health of the local engine and, when configured, the remote API.
#[derive(Debug, Serialize)]
pub struct HealthSummary {
    pub status: HealthStatus,
    pub remote_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<HealthReport>,
}

pub async fn health(engine: &SignalEngine) -> HealthSummary {
    let api = match engine.client() {
        Some(client) => Some(client.health_check().await),
        None => None,
    };
    let status = match &api {
        Some(report) => report.status,
        None => HealthStatus::Healthy,
    };
    HealthSummary {
        status,
        remote_enabled: engine.remote_enabled(),
        api,
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
