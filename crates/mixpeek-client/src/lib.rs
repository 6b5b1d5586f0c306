//! Mixpeek client - remote API access with local fallback.
//!
//! [`SignalEngine`] produces content signals from the remote API when one is
//! configured and from the local classifiers otherwise. [`ProductMapper`]
//! maps products to IAB Ad Product categories. [`MixpeekClient`] also exposes
//! the workflow resources (namespaces, collections, retrievers, ...).

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod product;
pub mod resources;
pub mod retry;

pub use client::MixpeekClient;
pub use config::{ClientConfig, RetryConfig};
pub use engine::{EngineConfig, EngineStats, SignalEngine};
pub use error::{ClientError, Result};
pub use models::{HealthReport, HealthStatus};
pub use product::{MapOptions, MapperHealth, MapperStats, ProductMapper};
pub use resources::{Operation, Resource, ResourceRequest};
pub use retry::RetryPolicy;
