//! Mixpeek Server - HTTP connector for content signals.
//!
//! ## Endpoints
//!
//! - `POST /api/analyze` - Keywords, sentiment, taxonomy and brand safety
//! - `POST /api/brand-safety` - Brand-safety check for content or a product
//! - `POST /api/openrtb/enrich` - Enrich an OpenRTB bid request's `site.content`
//! - `POST /api/gam/targeting` - GAM key-values and a validation report
//! - `POST /api/prebid/ortb2` - Prebid `ortb2Fragments`
//! - `POST /api/products/map` - Map a product to an IAB Ad Product category
//! - `GET /api/products/categories/{id}` - Category details
//! - `POST /api/resources/{resource}/{operation}` - Workflow API passthrough
//! - `GET /api/health` - Service and remote API health
//! - `GET /api/stats` - Engine and mapper counters
//!
//! ## Example
//!
//! ```no_run
//! use mixpeek_server::{AppState, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let state = AppState::local().unwrap();
//!     let server = Server::with_state(ServerConfig::default(), state).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod state;

use std::future::Future;
use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use error::{ApiError, Result};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 8787;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 8787).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Engine or mapper could not be built.
    #[error("configuration error: {0}")]
    Config(#[from] mixpeek_client::ClientError),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the API routes without state.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/brand-safety", post(handlers::brand_safety))
        .route("/api/openrtb/enrich", post(handlers::enrich_openrtb))
        .route("/api/gam/targeting", post(handlers::gam_targeting))
        .route("/api/prebid/ortb2", post(handlers::prebid_ortb2))
        .route("/api/products/map", post(handlers::map_product))
        .route("/api/products/categories/{id}", get(handlers::get_category))
        .route(
            "/api/resources/{resource}/{operation}",
            post(handlers::execute_resource),
        )
        .route("/api/health", get(handlers::health))
        .route("/api/stats", get(handlers::get_stats))
}

/// The HTTP API server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a local-only server with default engine settings.
    pub fn new(config: ServerConfig) -> std::result::Result<Self, ServerError> {
        Self::with_state(config, AppState::local()?)
    }

    /// Creates a server with custom application state.
    pub fn with_state(
        config: ServerConfig,
        state: AppState,
    ) -> std::result::Result<Self, ServerError> {
        // Ad-server and Prebid pages call from the browser
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let router = api_routes().layer(cors).with_state(state);

        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self { router, addr })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the server until `shutdown` resolves, then drains connections.
    pub async fn run_until<F>(self, shutdown: F) -> std::result::Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Starting Mixpeek signal server on {}", self.addr);

        let socket = Socket::new(
            Domain::for_address(self.addr),
            Type::STREAM,
            Some(Protocol::TCP),
        )
        .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow address reuse (helps with TIME_WAIT sockets after restarts)
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Set non-blocking for tokio
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }

    /// Returns the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mixpeek_client::{ClientConfig, EngineConfig, RetryConfig};
    use mixpeek_core::product::mapper::MapperConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_app() -> Router {
        api_routes().with_state(AppState::local().unwrap())
    }

    fn remote_app(server: &MockServer) -> Router {
        let client = ClientConfig::new("test-key")
            .with_endpoint(server.uri())
            .with_collection_id("col_1")
            .with_retry(RetryConfig::none());
        let state =
            AppState::from_config(Some(client), EngineConfig::default(), MapperConfig::default())
                .unwrap();
        api_routes().with_state(state)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_analyze_text() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/analyze",
            json!({"text": "excellent amazing wonderful product"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "local");
        assert_eq!(json["sentiment"]["label"], "positive");
        assert!(json["keywords"].is_array());
        assert!(json["latency_ms"].is_number());
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_input() {
        for uri in ["/api/analyze", "/api/products/map", "/api/resources/bucket/list"] {
            let request = Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap();
            let (status, json) = send(create_test_app(), request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["code"], "INVALID_INPUT", "{}", uri);
            assert!(json["error"].is_string(), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid_input() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/gam/targeting")
            .body(Body::from(r#"{"text": "football"}"#))
            .unwrap();
        let (status, json) = send(create_test_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_analyze_html() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/analyze",
            json!({
                "url": "https://example.com/tech",
                "html": "<html><head><title>Software developers</title></head>\
                         <body><p>New programming tools for code</p></body></html>"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["taxonomy"]["node_id"], "technology");
    }

    #[tokio::test]
    async fn test_analyze_empty_is_bad_request() {
        let (status, json) = post_json(create_test_app(), "/api/analyze", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_brand_safety_product_floor_category() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/brand-safety",
            json!({"product": {"title": "Gift set", "category_id": 1008}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["level"], "floor");
        assert_eq!(json["blocked"], true);
        assert_eq!(json["safe"], false);
    }

    #[tokio::test]
    async fn test_brand_safety_requires_input() {
        let (status, _) = post_json(create_test_app(), "/api/brand-safety", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_openrtb_enrich() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/openrtb/enrich",
            json!({
                "bid_request": {
                    "id": "req-1",
                    "site": {
                        "page": "https://example.com/sports",
                        "content": {"title": "Football league match report", "cat": ["IAB1"]}
                    }
                }
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let content = &json["bid_request"]["site"]["content"];
        assert_eq!(json["bid_request"]["id"], "req-1");
        assert!(content["cat"]
            .as_array()
            .unwrap()
            .contains(&json!("IAB1")));
        assert!(content["cattax"].is_number());
        assert!(content["ext"]["data"]["mixpeek"].is_object());
    }

    #[tokio::test]
    async fn test_openrtb_rejects_non_object() {
        let (status, _) = post_json(
            create_test_app(),
            "/api/openrtb/enrich",
            json!({"bid_request": [1, 2]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_gam_targeting_is_valid() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/gam/targeting",
            json!({"title": "Real Estate!", "text": "Mortgage rates and condo listings"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["validation"]["valid"], true);
        assert!(json["targeting"]["mixpeek_category"].is_string());
    }

    #[tokio::test]
    async fn test_prebid_fragments() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/prebid/ortb2",
            json!({"keywords": ["software", "programming", "developer", "code"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let content = &json["ortb2Fragments"]["global"]["site"]["content"];
        assert!(content["cat"].is_array());
        assert_eq!(content["ext"]["data"]["mixpeek"]["category"], "Technology");
    }

    #[tokio::test]
    async fn test_map_product() {
        let (status, json) = post_json(
            create_test_app(),
            "/api/products/map",
            json!({"title": "Apple iPhone 15 Pro", "mode": "deterministic"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["iab_product"]["primary"], "IAB-AP-1118");
        assert_eq!(json["source"], "deterministic");
    }

    #[tokio::test]
    async fn test_map_product_requires_title_or_description() {
        let (status, json) =
            post_json(create_test_app(), "/api/products/map", json!({"brand": "Acme"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_get_category() {
        let (status, json) =
            get_json(create_test_app(), "/api/products/categories/IAB-AP-1121").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["category"]["id"], 1121);
        assert_eq!(json["path"][0]["id"], 1115);

        let (status, _) = get_json(create_test_app(), "/api/products/categories/42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get_json(create_test_app(), "/api/products/categories/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resources_validate_before_remote() {
        let (status, json) =
            post_json(create_test_app(), "/api/resources/widget/get", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_INPUT");

        let (status, json) = post_json(
            create_test_app(),
            "/api/resources/namespace/get",
            json!({"id": "ns_1"}),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["code"], "INVALID_CONFIG");
    }

    #[tokio::test]
    async fn test_resources_pass_remote_errors_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/collections/col_9"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Collection not found"})),
            )
            .mount(&server)
            .await;

        let (status, json) = post_json(
            remote_app(&server),
            "/api/resources/collection/get",
            json!({"id": "col_9"}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "API_ERROR");
        assert_eq!(json["error"], "Collection not found");
        assert_eq!(json["upstream_status"], 404);
    }

    #[tokio::test]
    async fn test_health_local() {
        let (status, json) = get_json(create_test_app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["remote_enabled"], false);
        assert!(json.get("api").is_none());
    }

    #[tokio::test]
    async fn test_health_degraded_when_remote_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (status, json) = get_json(remote_app(&server), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["api"]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_stats_count_requests() {
        let app = create_test_app();
        post_json(app.clone(), "/api/analyze", json!({"text": "hello world"})).await;
        post_json(app.clone(), "/api/analyze", json!({"text": "hello world"})).await;

        let (status, json) = get_json(app, "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["analysis"]["requests"], 2);
        assert_eq!(json["analysis"]["cache_hits"], 1);
        assert!(json["uptime_secs"].is_number());
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_server_config_with_port() {
        let config = ServerConfig::default().with_port(9000);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let config = ServerConfig::default().with_host("not a host");
        assert!(Server::with_state(config, AppState::local().unwrap()).is_err());
    }
}
