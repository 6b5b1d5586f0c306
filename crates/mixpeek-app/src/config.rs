//! Application configuration: JSON file plus command-line overrides.

use std::path::{Path, PathBuf};

use mixpeek_client::{ClientConfig, EngineConfig};
use mixpeek_core::product::mapper::MapperConfig;
use mixpeek_core::{AnalyzerConfig, CacheConfig};
use mixpeek_server::ServerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Contents of the `--config` JSON file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analyzer: AnalyzerConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub products: MapperConfig,
}

impl AppConfig {
    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Engine settings from the analyzer and cache sections.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig::default()
            .with_analyzer(self.analyzer.clone())
            .with_cache(self.cache.clone())
    }
}

/// Remote API options gathered from flags and environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteOptions {
    pub api_key: Option<String>,
    pub collection_id: Option<String>,
    pub namespace: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    /// Use the low-latency ad-serving preset instead of the batch preset.
    pub realtime: bool,
}

impl RemoteOptions {
    /// Builds a client config, or `None` when no API key is set.
    pub fn client_config(&self) -> Option<ClientConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())?;

        let mut config = if self.realtime {
            ClientConfig::realtime(api_key)
        } else {
            ClientConfig::batch(api_key)
        };
        if let Some(collection_id) = non_blank(&self.collection_id) {
            config = config.with_collection_id(collection_id);
        }
        if let Some(namespace) = non_blank(&self.namespace) {
            config = config.with_namespace(namespace);
        }
        if let Some(endpoint) = non_blank(&self.endpoint) {
            config = config.with_endpoint(endpoint);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout_ms(timeout_ms);
        }
        Some(config)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixpeek_core::product::mapper::MappingMode;
    use std::io::Write;

    #[test]
    fn loads_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cache": {{"capacity": 10}}, "server": {{"port": 9100}}, "products": {{"mode": "deterministic"}}}}"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.cache.capacity, 10);
        assert_eq!(config.cache.ttl_secs, CacheConfig::default().ttl_secs);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.products.mode, MappingMode::Deterministic);
        assert_eq!(config.engine().cache.capacity, 10);
    }

    #[test]
    fn reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            AppConfig::load(Path::new("/nonexistent/mixpeek.json")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn no_key_means_local_only() {
        assert!(RemoteOptions::default().client_config().is_none());
        let blank = RemoteOptions {
            api_key: Some("  ".to_string()),
            ..RemoteOptions::default()
        };
        assert!(blank.client_config().is_none());
    }

    #[test]
    fn builds_client_config_from_presets() {
        let options = RemoteOptions {
            api_key: Some("key".to_string()),
            collection_id: Some("col".to_string()),
            namespace: Some(" ".to_string()),
            realtime: true,
            ..RemoteOptions::default()
        };
        let config = options.client_config().unwrap();
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.collection_id.as_deref(), Some("col"));
        assert!(config.namespace.is_none());

        let batch = RemoteOptions {
            timeout_ms: Some(1000),
            realtime: false,
            ..options
        };
        let config = batch.client_config().unwrap();
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.retry.max_retries, 2);
    }
}
