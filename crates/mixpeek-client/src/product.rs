//! Product to IAB Ad Product category mapping with remote assistance.

use std::time::Instant;

use mixpeek_core::product::mapper::{
    format_mapping, merge_candidates, DeterministicMapper, MapperConfig, MappingMode,
    MappingOutcome, MappingSource, ProductMapping, ProductQuery,
};
use mixpeek_core::product::taxonomy::{is_valid_category, lookup_category, CategoryInfo};
use mixpeek_core::{CacheConfig, CacheStats, Lexicon, ProductInput, SharedCache};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::client::MixpeekClient;
use crate::error::{ClientError, Result};
use crate::models::{ClassifyRequest, HealthReport, HealthStatus};

/// Per-call overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub mode: Option<MappingMode>,
    pub min_confidence: Option<f32>,
    pub include_secondary: Option<bool>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    cache_hits: u64,
    deterministic_matches: u64,
    semantic_matches: u64,
    no_matches: u64,
    errors: u64,
    total_latency_ms: u64,
}

/// Mapper counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapperStats {
    pub requests: u64,
    pub cache_hits: u64,
    pub deterministic_matches: u64,
    pub semantic_matches: u64,
    pub no_matches: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub cache: CacheStats,
}

/// Mapper health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperHealth {
    pub status: HealthStatus,
    pub mode: MappingMode,
    pub cache: CacheStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<HealthReport>,
}

/// Maps products to IAB Ad Product categories.
pub struct ProductMapper {
    client: Option<MixpeekClient>,
    config: MapperConfig,
    deterministic: DeterministicMapper,
    cache: SharedCache<ProductMapping>,
    counters: Mutex<Counters>,
}

impl ProductMapper {
    /// Creates a mapper. Semantic mode requires a client.
    pub fn new(
        config: MapperConfig,
        client: Option<MixpeekClient>,
        cache: &CacheConfig,
    ) -> Result<Self> {
        if config.mode == MappingMode::Semantic && client.is_none() {
            return Err(ClientError::InvalidConfig(
                "semantic mode requires an API key".to_string(),
            ));
        }
        Ok(Self {
            deterministic: DeterministicMapper::new(Lexicon::shared(), config.keyword_limit),
            client,
            config,
            cache: SharedCache::from_config(cache),
            counters: Mutex::new(Counters::default()),
        })
    }

    /// A deterministic-only mapper with default settings.
    pub fn deterministic() -> Self {
        Self {
            client: None,
            config: MapperConfig::default().with_mode(MappingMode::Deterministic),
            deterministic: DeterministicMapper::with_defaults(),
            cache: SharedCache::from_config(&CacheConfig::default()),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Returns the default mode.
    pub fn mode(&self) -> MappingMode {
        self.config.mode
    }

    /// Maps one product.
    ///
    /// Fails only on invalid input or when semantic mode is requested without
    /// a client. Remote failures in hybrid mode fall back to the keyword
    /// result; in semantic mode they yield an unsuccessful mapping.
    pub async fn map(&self, input: &ProductInput, options: &MapOptions) -> Result<ProductMapping> {
        let start = Instant::now();
        self.counters.lock().requests += 1;

        let query = match ProductQuery::from_input(input) {
            Ok(query) => query,
            Err(err) => {
                self.counters.lock().errors += 1;
                return Err(err.into());
            }
        };

        let key = query.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            self.counters.lock().cache_hits += 1;
            return Ok(cached
                .with_cached(true)
                .with_latency_ms(start.elapsed().as_millis() as u64));
        }

        let mode = options.mode.unwrap_or(self.config.mode);
        let min_confidence = options.min_confidence.unwrap_or(self.config.min_confidence);
        let include_secondary = options
            .include_secondary
            .unwrap_or(self.config.include_secondary);

        let (outcome, remote_error) = match mode {
            MappingMode::Deterministic => (self.map_deterministic(&query, min_confidence), None),
            MappingMode::Semantic => {
                let client = self.client.as_ref().ok_or_else(|| {
                    self.counters.lock().errors += 1;
                    ClientError::InvalidConfig("semantic mode requires an API key".to_string())
                })?;
                match self.map_semantic(client, &query, min_confidence).await {
                    Ok(outcome) => (outcome, None),
                    Err(err) => {
                        warn!(error = %err, "Semantic mapping failed");
                        self.counters.lock().errors += 1;
                        (MappingOutcome::empty(MappingSource::Semantic), Some(err))
                    }
                }
            }
            MappingMode::Hybrid => (self.map_hybrid(&query, min_confidence).await, None),
        };

        let mut mapping = format_mapping(&outcome, &query, include_secondary);
        if let Some(err) = remote_error {
            mapping.error = Some(err.to_string());
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        self.counters.lock().total_latency_ms += latency_ms;

        if mapping.success {
            self.cache.set(key, mapping.clone());
        }
        debug!(
            mode = mode.as_str(),
            success = mapping.success,
            latency_ms,
            "Product mapped"
        );
        Ok(mapping.with_cached(false).with_latency_ms(latency_ms))
    }

    fn map_deterministic(&self, query: &ProductQuery, min_confidence: f32) -> MappingOutcome {
        let outcome = self.deterministic.map(query, min_confidence);
        let mut c = self.counters.lock();
        if outcome.is_empty() {
            c.no_matches += 1;
        } else {
            c.deterministic_matches += 1;
        }
        outcome
    }

    async fn map_semantic(
        &self,
        client: &MixpeekClient,
        query: &ProductQuery,
        min_confidence: f32,
    ) -> Result<MappingOutcome> {
        let request = ClassifyRequest::product(query.classification_text(), min_confidence);
        let response = client.classify(&request).await?;

        let categories: Vec<_> = response
            .candidates()
            .into_iter()
            .filter(|c| c.confidence >= min_confidence)
            .collect();

        let mut c = self.counters.lock();
        if categories.is_empty() {
            c.no_matches += 1;
        } else {
            c.semantic_matches += 1;
        }
        Ok(MappingOutcome {
            source: MappingSource::Semantic,
            categories,
        })
    }

    async fn map_hybrid(&self, query: &ProductQuery, min_confidence: f32) -> MappingOutcome {
        let deterministic = self.map_deterministic(query, min_confidence);
        if deterministic.has_confidence(self.config.high_confidence) {
            return deterministic;
        }

        if let Some(client) = &self.client {
            match self.map_semantic(client, query, min_confidence).await {
                Ok(semantic) if !semantic.is_empty() => {
                    return MappingOutcome {
                        source: MappingSource::Hybrid,
                        categories: merge_candidates(
                            &deterministic.categories,
                            &semantic.categories,
                        ),
                    };
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "Semantic mapping failed, using keyword result");
                }
            }
        }

        MappingOutcome {
            source: MappingSource::Hybrid,
            categories: deterministic.categories,
        }
    }

    /// Looks up a category by id.
    pub fn lookup_category(&self, id: u32) -> Option<CategoryInfo> {
        lookup_category(id)
    }

    /// Returns true if `value` names a known category.
    pub fn validate_category(&self, value: &str) -> bool {
        is_valid_category(value)
    }

    /// Returns the counters.
    pub fn stats(&self) -> MapperStats {
        let c = self.counters.lock();
        MapperStats {
            requests: c.requests,
            cache_hits: c.cache_hits,
            deterministic_matches: c.deterministic_matches,
            semantic_matches: c.semantic_matches,
            no_matches: c.no_matches,
            errors: c.errors,
            avg_latency_ms: if c.requests == 0 {
                0.0
            } else {
                c.total_latency_ms as f64 / c.requests as f64
            },
            cache: self.cache.stats(),
        }
    }

    /// Zeroes the counters, including the cache's.
    pub fn reset_stats(&self) {
        *self.counters.lock() = Counters::default();
        self.cache.reset_stats();
    }

    /// Drops every cached mapping.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Reports `degraded` when the remote API is configured but unhealthy.
    pub async fn health_check(&self) -> MapperHealth {
        let api = match &self.client {
            Some(client) => Some(client.health_check().await),
            None => None,
        };
        let status = match &api {
            Some(report) if !report.is_healthy() => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        };
        MapperHealth {
            status,
            mode: self.config.mode,
            cache: self.cache.stats(),
            api,
        }
    }
}
