//! HTTP client for the remote Mixpeek API.

use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::{
    error_message, ClassifyRequest, ClassifyResponse, DocumentRequest, DocumentResponse,
    HealthReport,
};
use crate::resources::ResourceRequest;
use crate::retry::RetryPolicy;

/// Namespace header name.
pub const NAMESPACE_HEADER: &str = "X-Namespace-Id";

/// Async client for the remote API.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct MixpeekClient {
    http: reqwest::Client,
    config: ClientConfig,
    retry: RetryPolicy,
}

impl MixpeekClient {
    /// Creates a client. Fails if the API key or endpoint is missing or invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(namespace) = config.namespace.as_deref().filter(|n| !n.trim().is_empty()) {
            let value = HeaderValue::from_str(namespace.trim()).map_err(|_| {
                ClientError::InvalidConfig(format!("invalid namespace: {}", namespace))
            })?;
            headers.insert(NAMESPACE_HEADER, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("failed to build client: {}", e)))?;

        let retry = RetryPolicy::from(&config.retry);
        Ok(Self {
            http,
            config,
            retry,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .bearer_auth(self.config.api_key.trim())
    }

    /// Sends one request and decodes the JSON body. No retries.
    async fn send_once(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.request(method.clone(), path);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Sends a request with the configured retry policy.
    pub async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let start = Instant::now();
        let result = self
            .retry
            .execute(|| self.send_once(method.clone(), path, body))
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(%method, path, latency_ms, "Remote request complete"),
            Err(e) => warn!(%method, path, latency_ms, status = e.status(), error = %e, "Remote request failed"),
        }
        result
    }

    async fn send_typed<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        let value = self.send(method, path, Some(&body)).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Creates a document in `collection_id` and returns its enrichments.
    pub async fn create_document(
        &self,
        collection_id: &str,
        document: &DocumentRequest,
    ) -> Result<DocumentResponse> {
        let collection_id = collection_id.trim();
        if collection_id.is_empty() || collection_id.contains('/') {
            return Err(ClientError::InvalidInput(format!(
                "invalid collection id: {:?}",
                collection_id
            )));
        }
        let path = format!("/v1/collections/{}/documents", collection_id);
        self.send_typed(Method::POST, &path, document).await
    }

    /// Classifies text against a taxonomy.
    pub async fn classify(&self, request: &ClassifyRequest) -> Result<ClassifyResponse> {
        self.send_typed(Method::POST, "/v1/classify", request).await
    }

    /// Executes a workflow resource request. Errors carry the remote message.
    pub async fn execute(&self, request: &ResourceRequest) -> Result<Value> {
        let endpoint = request.endpoint()?;
        self.send(endpoint.method, &endpoint.path, request.body.as_ref())
            .await
    }

    /// Probes `GET /v1/health`. Never fails; problems are reported in the result.
    pub async fn health_check(&self) -> HealthReport {
        let start = Instant::now();
        match self.send_once(Method::GET, "/v1/health", None).await {
            Ok(_) => HealthReport::healthy(start.elapsed().as_millis() as u64),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                HealthReport::unhealthy(e.to_string())
            }
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout_ms)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_api_key() {
        let err = MixpeekClient::new(ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_invalid_namespace_header() {
        let config = ClientConfig::new("key").with_namespace("bad\nvalue");
        assert!(MixpeekClient::new(config).is_err());
    }

    #[test]
    fn joins_endpoint_and_path() {
        let client =
            MixpeekClient::new(ClientConfig::new("key").with_endpoint("http://localhost:9/"))
                .unwrap();
        assert_eq!(client.url("/v1/health"), "http://localhost:9/v1/health");
    }

    #[tokio::test]
    async fn create_document_validates_collection() {
        let client = MixpeekClient::new(ClientConfig::new("key")).unwrap();
        let err = client
            .create_document(" ", &DocumentRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
