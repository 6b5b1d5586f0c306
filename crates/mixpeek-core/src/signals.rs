//! Signal bundles produced by analysis.

use serde::{Deserialize, Serialize};

use crate::classifier::{BrandSafetyResult, SentimentResult, TaxonomyResult};
use crate::error::ErrorInfo;

/// Where a set of signals came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// The remote content-intelligence API.
    Remote,
    /// Local heuristics.
    #[default]
    Local,
}

impl SignalSource {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Remote => "remote",
            SignalSource::Local => "local",
        }
    }
}

/// The five classification outputs for one content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSignals {
    pub keywords: Vec<String>,
    pub sentiment: SentimentResult,
    pub taxonomy: TaxonomyResult,
    pub brand_safety: BrandSafetyResult,
    /// Named entities (remote analysis only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
    /// Topic labels (remote analysis only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

/// Signals plus provenance for one analyzed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Id assigned by the remote API, if it was reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(flatten)]
    pub signals: ContentSignals,
    pub source: SignalSource,
    /// True when served from the cache.
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub latency_ms: u64,
    /// Why the remote path was not used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl AnalysisResult {
    /// Wraps locally computed signals.
    pub fn local(signals: ContentSignals) -> Self {
        Self {
            document_id: None,
            signals,
            source: SignalSource::Local,
            cached: false,
            latency_ms: 0,
            error: None,
        }
    }

    /// Wraps remote signals.
    pub fn remote(document_id: Option<String>, signals: ContentSignals) -> Self {
        Self {
            document_id,
            signals,
            source: SignalSource::Remote,
            cached: false,
            latency_ms: 0,
            error: None,
        }
    }

    /// Attaches the error that forced a fallback.
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Sets the latency.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Returns true if the remote path failed and local heuristics answered.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn default_signals_are_neutral() {
        let signals = ContentSignals::default();
        assert!(signals.keywords.is_empty());
        assert_eq!(signals.sentiment.score, 0.5);
        assert_eq!(signals.taxonomy.label, "General");
        assert!(signals.brand_safety.safe);
    }

    #[test]
    fn analysis_result_flattens_signals() {
        let result = AnalysisResult::local(ContentSignals::default()).with_error(ErrorInfo::new(
            ErrorCode::ApiTimeout,
            "request timed out",
        ));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "local");
        assert_eq!(json["taxonomy"]["label"], "General");
        assert_eq!(json["error"]["code"], "API_TIMEOUT");
        assert!(json.get("document_id").is_none());
        assert!(result.is_degraded());
    }
}
