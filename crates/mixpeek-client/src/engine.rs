//! Content signal engine: cache, then remote API, then local heuristics.
//!
//! [`SignalEngine::analyze`] never fails. When the remote call errors or
//! times out, the local classifiers answer and the result carries the error.

use std::time::Instant;

use mixpeek_core::{
    cache_key, AnalysisResult, AnalyzerConfig, CacheConfig, CacheStats, ContentInput,
    ContentSignals, ExtractedContent, Lexicon, LocalAnalyzer, SharedCache,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::MixpeekClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::DocumentRequest;

/// Engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub analyzer: AnalyzerConfig,
    pub cache: CacheConfig,
}

impl EngineConfig {
    pub fn with_analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    cache_hits: u64,
    remote: u64,
    local: u64,
    fallbacks: u64,
    total_latency_ms: u64,
}

/// Engine counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub requests: u64,
    pub cache_hits: u64,
    /// Results produced by the remote API.
    pub remote: u64,
    /// Results produced locally because no remote is configured.
    pub local: u64,
    /// Results produced locally after a remote failure.
    pub fallbacks: u64,
    pub avg_latency_ms: f64,
    pub cache: CacheStats,
    pub remote_enabled: bool,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    CacheHit,
    Remote,
    Local,
    Fallback,
}

struct Remote {
    client: MixpeekClient,
    collection_id: String,
}

/// Analyzes content with caching and graceful degradation.
pub struct SignalEngine {
    remote: Option<Remote>,
    analyzer: LocalAnalyzer,
    cache: SharedCache<AnalysisResult>,
    counters: Mutex<Counters>,
}

impl SignalEngine {
    /// Creates an engine backed by the remote API.
    ///
    /// Fails with `INVALID_CONFIG` when the API key or collection id is missing.
    pub fn new(client: ClientConfig, config: EngineConfig) -> Result<Self> {
        let collection_id = client
            .collection()
            .ok_or_else(|| ClientError::InvalidConfig("collectionId is required".to_string()))?
            .to_string();
        let client = MixpeekClient::new(client)?;
        let mut engine = Self::local_only(config)?;
        engine.remote = Some(Remote {
            client,
            collection_id,
        });
        Ok(engine)
    }

    /// Creates an engine that only uses local heuristics.
    pub fn local_only(config: EngineConfig) -> Result<Self> {
        let analyzer = LocalAnalyzer::new(Lexicon::shared(), config.analyzer)?;
        Ok(Self {
            remote: None,
            analyzer,
            cache: SharedCache::from_config(&config.cache),
            counters: Mutex::new(Counters::default()),
        })
    }

    /// Uses the remote API when a key and collection are configured,
    /// local heuristics otherwise.
    pub fn from_optional(client: Option<ClientConfig>, config: EngineConfig) -> Result<Self> {
        match client {
            Some(client) if client.has_api_key() => Self::new(client, config),
            _ => Self::local_only(config),
        }
    }

    /// Returns true if a remote API is configured.
    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Returns the remote client, if any.
    pub fn client(&self) -> Option<&MixpeekClient> {
        self.remote.as_ref().map(|r| &r.client)
    }

    /// Returns the local analyzer.
    pub fn analyzer(&self) -> &LocalAnalyzer {
        &self.analyzer
    }

    /// Analyzes structured content.
    pub async fn analyze(&self, input: &ContentInput) -> AnalysisResult {
        let start = Instant::now();
        let key = content_key(input);

        if let Some(mut cached) = self.cache.get(&key) {
            cached.cached = true;
            cached.latency_ms = start.elapsed().as_millis() as u64;
            self.record(Outcome::CacheHit, cached.latency_ms);
            debug!(source = cached.source.as_str(), "Analysis served from cache");
            return cached;
        }

        let extracted = self.analyzer.extractor().extract(input);
        let local = self
            .analyzer
            .analyze_extracted(&extracted, &input.keywords, &input.categories);

        let (result, outcome) = match &self.remote {
            None => (AnalysisResult::local(local), Outcome::Local),
            Some(remote) => match self.analyze_remote(remote, input, local.clone()).await {
                Ok(result) => (result, Outcome::Remote),
                Err(err) => {
                    warn!(
                        code = err.code().as_str(),
                        error = %err,
                        "Remote analysis failed, using local signals"
                    );
                    (
                        AnalysisResult::local(local).with_error(err.info()),
                        Outcome::Fallback,
                    )
                }
            },
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        let result = result.with_latency_ms(latency_ms);
        self.record(outcome, latency_ms);

        // degraded results are not cached so a recovered remote is used next time
        if !result.is_degraded() {
            self.cache.set(key, result.clone());
        }
        result
    }

    /// Analyzes an HTML page.
    pub async fn analyze_html(&self, html: &str, url: Option<&str>) -> AnalysisResult {
        let extracted = self.analyzer.extractor().extract_html(html, url);
        self.analyze(&content_input(extracted)).await
    }

    async fn analyze_remote(
        &self,
        remote: &Remote,
        input: &ContentInput,
        local: ContentSignals,
    ) -> Result<AnalysisResult> {
        let response = remote
            .client
            .create_document(&remote.collection_id, &DocumentRequest::from(input))
            .await?;

        let document_id = response.document_id();
        let signals = match &response.enrichments {
            Some(enrichments) => enrichments.merge_into(local),
            None => local,
        };
        Ok(AnalysisResult::remote(document_id, signals))
    }

    /// Returns the counters.
    pub fn stats(&self) -> EngineStats {
        let c = self.counters.lock();
        EngineStats {
            requests: c.requests,
            cache_hits: c.cache_hits,
            remote: c.remote,
            local: c.local,
            fallbacks: c.fallbacks,
            avg_latency_ms: if c.requests == 0 {
                0.0
            } else {
                c.total_latency_ms as f64 / c.requests as f64
            },
            cache: self.cache.stats(),
            remote_enabled: self.remote_enabled(),
        }
    }

    /// Zeroes the counters, including the cache's.
    pub fn reset_stats(&self) {
        *self.counters.lock() = Counters::default();
        self.cache.reset_stats();
    }

    /// Drops every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn record(&self, outcome: Outcome, latency_ms: u64) {
        let mut c = self.counters.lock();
        c.requests += 1;
        c.total_latency_ms += latency_ms;
        match outcome {
            Outcome::CacheHit => c.cache_hits += 1,
            Outcome::Remote => c.remote += 1,
            Outcome::Local => c.local += 1,
            Outcome::Fallback => c.fallbacks += 1,
        }
    }
}

fn content_key(input: &ContentInput) -> String {
    let keywords = input.keywords.join(",");
    let categories = input
        .categories
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    cache_key(
        "content",
        &[
            input.url.as_deref().unwrap_or(""),
            input.title.as_deref().unwrap_or(""),
            input.description.as_deref().unwrap_or(""),
            input.text.as_deref().unwrap_or(""),
            &keywords,
            &categories,
        ],
    )
}

fn content_input(extracted: ExtractedContent) -> ContentInput {
    let some = |s: String| (!s.is_empty()).then_some(s);
    ContentInput {
        url: extracted.url,
        title: some(extracted.title),
        text: some(extracted.full_text.unwrap_or(extracted.text)),
        description: some(extracted.full_description.unwrap_or(extracted.description)),
        ..ContentInput::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixpeek_core::{SentimentLabel, SignalSource};

    fn local_engine() -> SignalEngine {
        SignalEngine::local_only(EngineConfig::default()).unwrap()
    }

    #[test]
    fn requires_collection_for_remote() {
        let err = SignalEngine::new(ClientConfig::new("key"), EngineConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ClientError::InvalidConfig(_)));

        let err = SignalEngine::new(
            ClientConfig::default().with_collection_id("col"),
            EngineConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ClientError::InvalidConfig(_)));
    }

    #[test]
    fn missing_key_falls_back_to_local() {
        let engine =
            SignalEngine::from_optional(Some(ClientConfig::default()), EngineConfig::default())
                .unwrap();
        assert!(!engine.remote_enabled());
    }

    #[tokio::test]
    async fn local_engine_analyzes() {
        let engine = local_engine();
        let result = engine
            .analyze(&ContentInput::from_text("An excellent and wonderful day"))
            .await;
        assert_eq!(result.source, SignalSource::Local);
        assert_eq!(result.signals.sentiment.label, SentimentLabel::Positive);
        assert!(!result.cached);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn second_call_is_cached() {
        let engine = local_engine();
        let input = ContentInput::from_text("Football league news");
        engine.analyze(&input).await;
        let second = engine.analyze(&input).await;
        assert!(second.cached);

        let stats = engine.stats();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.local, 1);
        assert_eq!(stats.cache.size, 1);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let engine =
            SignalEngine::local_only(EngineConfig::default().with_cache(CacheConfig::disabled()))
                .unwrap();
        let input = ContentInput::from_text("Same text");
        engine.analyze(&input).await;
        assert!(!engine.analyze(&input).await.cached);
    }

    #[tokio::test]
    async fn analyzes_html() {
        let engine = local_engine();
        let result = engine
            .analyze_html(
                "<html><head><title>Mortgage rates</title></head><body>Condo listing</body></html>",
                Some("https://example.com/homes"),
            )
            .await;
        assert_eq!(result.signals.taxonomy.node_id, "real_estate");
    }

    #[tokio::test]
    async fn long_html_keeps_late_blocked_terms() {
        let html = format!(
            "<html><body><p>{}</p><p>cocaine</p></body></html>",
            "gardening ".repeat(1100)
        );
        let result = local_engine().analyze_html(&html, None).await;
        assert!(result.signals.brand_safety.blocked);
        assert_eq!(result.signals.brand_safety.flagged_keywords, vec!["cocaine"]);
    }

    #[tokio::test]
    async fn reset_clears_counters() {
        let engine = local_engine();
        engine.analyze(&ContentInput::from_text("text")).await;
        engine.reset_stats();
        engine.clear_cache();
        let stats = engine.stats();
        assert_eq!(stats.requests, 0);
        assert_eq!(stats.cache.size, 0);
    }
}
