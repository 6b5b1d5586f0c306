//! API route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use mixpeek_client::{HealthStatus, Operation, Resource, ResourceRequest};
use mixpeek_core::adapters::{gam, openrtb, prebid};
use mixpeek_core::product::mapper::ProductMapping;
use mixpeek_core::product::taxonomy::{
    category_path, child_categories, lookup_category, parse_category_ref, CategoryInfo,
};
use mixpeek_core::{AnalysisResult, BrandSafetyResult, ContentInput};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::models::{
    AnalyzeRequest, AnalyzeResponse, BrandSafetyRequest, CategoryResponse, EnrichRequest,
    EnrichResponse, HealthResponse, PrebidResponse, ProductMapRequest, ResourceBody,
    StatsResponse, TargetingResponse,
};
use crate::state::AppState;

/// A JSON body whose parse errors are answered with [`ApiError::BadRequest`].
type Payload<T> = std::result::Result<Json<T>, JsonRejection>;

const EMPTY_CONTENT: &str = "At least one of url, title, description, text, html or keywords is required";

async fn run_analysis(state: &AppState, req: &AnalyzeRequest) -> Result<AnalysisResult> {
    if req.is_empty() {
        return Err(ApiError::BadRequest(EMPTY_CONTENT.to_string()));
    }

    let result = match req.html.as_deref().filter(|h| !h.trim().is_empty()) {
        Some(html) => state.engine.analyze_html(html, req.content.url.as_deref()).await,
        None => state.engine.analyze(&req.content).await,
    };

    debug!(
        source = result.source.as_str(),
        cached = result.cached,
        latency_ms = result.latency_ms,
        category = %result.signals.taxonomy.node_id,
        "Content analyzed"
    );
    Ok(result)
}

/// POST /api/analyze - Full signal analysis.
pub async fn analyze(
    State(state): State<AppState>,
    payload: Payload<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let Json(req) = payload?;
    Ok(Json(run_analysis(&state, &req).await?))
}

/// POST /api/brand-safety - Brand-safety check for content or a product.
pub async fn brand_safety(
    State(state): State<AppState>,
    payload: Payload<BrandSafetyRequest>,
) -> Result<Json<BrandSafetyResult>> {
    let Json(req) = payload?;
    let classifier = state.engine.analyzer().brand_safety();

    let result = match (&req.product, &req.content) {
        (Some(product), _) => {
            if product.title.is_none()
                && product.description.is_none()
                && product.category_id.is_none()
                && product.keywords.is_empty()
            {
                return Err(ApiError::BadRequest(
                    "product needs a title, description, category_id or keywords".to_string(),
                ));
            }
            classifier.classify_product(product)
        }
        (None, Some(content)) if !content.is_empty() => classifier.classify_content(content),
        _ => {
            return Err(ApiError::BadRequest(
                "content or product is required".to_string(),
            ))
        }
    };

    debug!(
        level = result.level.as_str(),
        blocked = result.blocked,
        "Brand safety checked"
    );
    Ok(Json(result))
}

/// POST /api/openrtb/enrich - Adds content signals to a bid request.
pub async fn enrich_openrtb(
    State(state): State<AppState>,
    payload: Payload<EnrichRequest>,
) -> Result<Json<EnrichResponse>> {
    let Json(req) = payload?;
    let mut bid_request = req.bid_request;
    if !bid_request.is_object() {
        return Err(ApiError::BadRequest(
            "bid_request must be a JSON object".to_string(),
        ));
    }

    let content = req
        .content
        .unwrap_or_else(|| content_from_bid_request(&bid_request));
    let analysis = AnalyzeRequest {
        html: None,
        content,
    };
    let result = run_analysis(&state, &analysis).await?;
    openrtb::enrich_bid_request(&mut bid_request, &result);

    Ok(Json(EnrichResponse {
        bid_request,
        source: result.source,
        cached: result.cached,
        latency_ms: result.latency_ms,
    }))
}

/// POST /api/gam/targeting - GAM key-values with a validation report.
pub async fn gam_targeting(
    State(state): State<AppState>,
    payload: Payload<AnalyzeRequest>,
) -> Result<Json<TargetingResponse>> {
    let Json(req) = payload?;
    let result = run_analysis(&state, &req).await?;
    let targeting = gam::build_targeting(&result.signals);
    let validation = gam::validate_targeting(&targeting);

    Ok(Json(TargetingResponse {
        targeting,
        validation,
        source: result.source,
    }))
}

/// POST /api/prebid/ortb2 - Prebid `ortb2Fragments`.
pub async fn prebid_ortb2(
    State(state): State<AppState>,
    payload: Payload<AnalyzeRequest>,
) -> Result<Json<PrebidResponse>> {
    let Json(req) = payload?;
    let result = run_analysis(&state, &req).await?;
    Ok(Json(PrebidResponse {
        ortb2_fragments: prebid::ortb2_fragments(&result),
        source: result.source,
    }))
}

/// POST /api/products/map - Maps a product to an IAB Ad Product category.
pub async fn map_product(
    State(state): State<AppState>,
    payload: Payload<ProductMapRequest>,
) -> Result<Json<ProductMapping>> {
    let Json(req) = payload?;
    let mapping = state.products.map(&req.product, &req.options()).await?;
    Ok(Json(mapping))
}

/// GET /api/products/categories/{id} - Category details by id or code.
pub async fn get_category(Path(id): Path<String>) -> Result<Json<CategoryResponse>> {
    let category_id = parse_category_ref(&id)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid category id: {}", id)))?;
    let category = lookup_category(category_id)
        .ok_or_else(|| ApiError::NotFound(format!("category {}", id)))?;

    Ok(Json(CategoryResponse {
        category,
        path: category_path(category_id)
            .into_iter()
            .map(CategoryInfo::from)
            .collect(),
        children: child_categories(category_id)
            .into_iter()
            .map(CategoryInfo::from)
            .collect(),
    }))
}

/// POST /api/resources/{resource}/{operation} - Workflow API passthrough.
pub async fn execute_resource(
    State(state): State<AppState>,
    Path((resource, operation)): Path<(String, String)>,
    payload: Payload<ResourceBody>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;
    let request = ResourceRequest {
        resource: resource.parse::<Resource>()?,
        operation: operation.parse::<Operation>()?,
        id: body.id,
        parent_id: body.parent_id,
        body: body.body,
    };
    request.endpoint()?;

    let client = state.engine.client().ok_or_else(|| {
        ApiError::NotConfigured("remote API is not configured (MIXPEEK_API_KEY)".to_string())
    })?;

    info!(
        resource = request.resource.as_str(),
        operation = request.operation.as_str(),
        "Executing resource request"
    );
    Ok(Json(client.execute(&request).await?))
}

/// GET /api/health - Service and remote API health.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let api = match state.engine.client() {
        Some(client) => Some(client.health_check().await),
        None => None,
    };
    let status = match &api {
        Some(report) if !report.is_healthy() => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        remote_enabled: state.engine.remote_enabled(),
        product_mode: state.products.mode(),
        api,
        timestamp: Utc::now(),
    })
}

/// GET /api/stats - Engine and mapper counters.
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        analysis: state.engine.stats(),
        products: state.products.stats(),
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

/// Builds content input from `site.page` and `site.content` of a bid request.
fn content_from_bid_request(request: &Value) -> ContentInput {
    let site = &request["site"];
    let content = &site["content"];
    let text = |v: &Value| {
        v.as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let keywords = [&content["keywords"], &site["keywords"]]
        .into_iter()
        .filter_map(Value::as_str)
        .flat_map(|k| k.split(','))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    ContentInput {
        url: text(&site["page"]).or_else(|| text(&content["url"])),
        title: text(&content["title"]),
        keywords,
        ..ContentInput::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_content_from_bid_request() {
        let request = json!({
            "id": "req-1",
            "site": {
                "page": "https://news.example.com/football/final",
                "keywords": "sports, football",
                "content": {"title": "Cup final recap", "keywords": "goal"}
            }
        });
        let content = content_from_bid_request(&request);
        assert_eq!(
            content.url.as_deref(),
            Some("https://news.example.com/football/final")
        );
        assert_eq!(content.title.as_deref(), Some("Cup final recap"));
        assert_eq!(content.keywords, vec!["goal", "sports", "football"]);
    }

    #[test]
    fn bid_request_without_site_is_empty() {
        assert!(content_from_bid_request(&json!({"id": "x"})).is_empty());
    }
}
