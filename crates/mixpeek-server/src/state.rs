//! Application state for the API server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mixpeek_client::{ClientConfig, EngineConfig, ProductMapper, SignalEngine};
use mixpeek_core::product::mapper::MapperConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Content analysis with remote fallback.
    pub engine: Arc<SignalEngine>,
    /// Product category mapping.
    pub products: Arc<ProductMapper>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state from existing components.
    pub fn new(engine: SignalEngine, products: ProductMapper) -> Self {
        Self {
            engine: Arc::new(engine),
            products: Arc::new(products),
            started_at: Utc::now(),
        }
    }

    /// Builds the engine and mapper. Both use the remote API when `client`
    /// carries an API key.
    pub fn from_config(
        client: Option<ClientConfig>,
        engine: EngineConfig,
        mapper: MapperConfig,
    ) -> mixpeek_client::Result<Self> {
        let cache = engine.cache.clone();
        let engine = SignalEngine::from_optional(client, engine)?;
        let products = ProductMapper::new(mapper, engine.client().cloned(), &cache)?;
        Ok(Self::new(engine, products))
    }

    /// Local-only state with default settings.
    pub fn local() -> mixpeek_client::Result<Self> {
        Self::from_config(None, EngineConfig::default(), MapperConfig::default())
    }
}
