//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, Result};

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mixpeek.com";

/// Environment variable names read by [`ClientConfig::from_env`].
pub const ENV_API_KEY: &str = "MIXPEEK_API_KEY";
pub const ENV_COLLECTION_ID: &str = "MIXPEEK_COLLECTION_ID";
pub const ENV_NAMESPACE: &str = "MIXPEEK_NAMESPACE";
pub const ENV_ENDPOINT: &str = "MIXPEEK_ENDPOINT";

/// Retry and backoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Randomize each delay by up to 10%.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 200,
            max_delay_ms: 2_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the first backoff delay.
    pub fn with_initial_delay_ms(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_key: String,
    /// Collection that receives analyzed documents.
    pub collection_id: Option<String>,
    /// Sent as `X-Namespace-Id` when set.
    pub namespace: Option<String>,
    pub endpoint: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    pub retry: RetryConfig,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            collection_id: None,
            namespace: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 5_000,
            retry: RetryConfig::default(),
            user_agent: format!("mixpeek-signals/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Creates a config with an API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Settings for ad-serving paths: 250 ms timeout, one quick retry.
    pub fn realtime(api_key: impl Into<String>) -> Self {
        Self {
            timeout_ms: 250,
            retry: RetryConfig {
                max_retries: 1,
                initial_delay_ms: 50,
                max_delay_ms: 200,
                ..RetryConfig::default()
            },
            ..Self::new(api_key)
        }
    }

    /// Settings for batch and workflow paths: 5 s timeout, two retries.
    pub fn batch(api_key: impl Into<String>) -> Self {
        Self {
            timeout_ms: 5_000,
            retry: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 500,
                max_delay_ms: 4_000,
                ..RetryConfig::default()
            },
            ..Self::new(api_key)
        }
    }

    /// Reads the `MIXPEEK_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(api_key) = var(ENV_API_KEY) {
            config.api_key = api_key;
        }
        config.collection_id = var(ENV_COLLECTION_ID);
        config.namespace = var(ENV_NAMESPACE);
        if let Some(endpoint) = var(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        config
    }

    /// Sets the collection id.
    pub fn with_collection_id(mut self, collection_id: impl Into<String>) -> Self {
        self.collection_id = Some(collection_id.into());
        self
    }

    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns true if an API key is set.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Returns the collection id if set and non-blank.
    pub fn collection(&self) -> Option<&str> {
        self.collection_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Checks fields needed by every request.
    pub fn validate(&self) -> Result<()> {
        if !self.has_api_key() {
            return Err(ClientError::InvalidConfig("apiKey is required".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ClientError::InvalidConfig(format!("invalid endpoint: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "endpoint must be http or https: {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_in_timeout() {
        let rt = ClientConfig::realtime("key");
        assert_eq!(rt.timeout_ms, 250);
        assert_eq!(rt.retry.max_retries, 1);
        assert_eq!(rt.retry.initial_delay_ms, 50);

        let batch = ClientConfig::batch("key");
        assert_eq!(batch.timeout(), Duration::from_secs(5));
        assert_eq!(batch.retry.max_retries, 2);
    }

    #[test]
    fn validate_requires_api_key() {
        let err = ClientConfig::default().validate().unwrap_err();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
        assert!(ClientConfig::new("key").validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        assert!(ClientConfig::new("key")
            .with_endpoint("not a url")
            .validate()
            .is_err());
        assert!(ClientConfig::new("key")
            .with_endpoint("ftp://example.com")
            .validate()
            .is_err());
        assert!(ClientConfig::new("key").with_timeout_ms(0).validate().is_err());
    }

    #[test]
    fn blank_collection_is_none() {
        let config = ClientConfig::new("key").with_collection_id("  ");
        assert!(config.collection().is_none());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"api_key": "k", "retry": {"max_retries": 0}}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.retry.max_retries, 0);
        assert_eq!(config.retry.max_delay_ms, 2_000);
    }
}
