//! Prebid.js real-time data output and module parameters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::openrtb::{site_content_for, SiteContent};
use crate::cache::CacheConfig;
use crate::error::{Result, SignalError};
use crate::signals::AnalysisResult;

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mixpeek.com";

/// Default auction-path timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 250;

/// Content modality the RTD module analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RtdMode {
    Page,
    Video,
    Image,
    #[default]
    Auto,
}

impl RtdMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RtdMode::Page => "page",
            RtdMode::Video => "video",
            RtdMode::Image => "image",
            RtdMode::Auto => "auto",
        }
    }
}

impl FromStr for RtdMode {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(RtdMode::Page),
            "video" => Ok(RtdMode::Video),
            "image" => Ok(RtdMode::Image),
            "auto" => Ok(RtdMode::Auto),
            other => Err(SignalError::InvalidConfig(format!("unknown mode: {}", other))),
        }
    }
}

/// `realTimeData.dataProviders[].params` for the Mixpeek provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RtdParams {
    pub api_key: String,
    pub collection_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub endpoint: String,
    /// Milliseconds.
    pub timeout: u64,
    pub enable_cache: bool,
    /// Seconds.
    #[serde(rename = "cacheTTL")]
    pub cache_ttl: u64,
    pub mode: RtdMode,
    pub feature_extractors: Vec<String>,
}

impl Default for RtdParams {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            collection_id: String::new(),
            namespace: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            enable_cache: true,
            cache_ttl: CacheConfig::default().ttl_secs,
            mode: RtdMode::Auto,
            feature_extractors: vec!["taxonomy".to_string(), "brand_safety".to_string()],
        }
    }
}

impl RtdParams {
    /// Checks required fields.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(SignalError::InvalidConfig("apiKey is required".to_string()));
        }
        if self.collection_id.trim().is_empty() {
            return Err(SignalError::InvalidConfig(
                "collectionId is required".to_string(),
            ));
        }
        if self.timeout == 0 {
            return Err(SignalError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Cache settings implied by `enableCache` and `cacheTTL`.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.enable_cache,
            ttl_secs: self.cache_ttl,
            ..CacheConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub content: SiteContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalOrtb2 {
    pub site: Site,
}

/// The `ortb2Fragments` object merged into a Prebid auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ortb2Fragments {
    pub global: GlobalOrtb2,
}

/// Builds `ortb2Fragments` from an analysis result.
pub fn ortb2_fragments(result: &AnalysisResult) -> Ortb2Fragments {
    Ortb2Fragments {
        global: GlobalOrtb2 {
            site: Site {
                content: site_content_for(result),
            },
        },
    }
}
