//! Mixpeek Core - content signal engine.
//!
//! Local, synchronous content classification for ad-tech connectors:
//!
//! - Content extraction from text, HTML, or URLs
//! - Keyword, sentiment, taxonomy, and GARM brand-safety classifiers
//! - A bounded TTL cache for request fingerprints
//! - IAB Ad Product Taxonomy 2.0 lookup and deterministic product mapping
//! - OpenRTB, Google Ad Manager, and Prebid output adapters
//!
//! Nothing here performs I/O. The remote API client lives in
//! `mixpeek-client`.
//!
//! # Example
//!
//! ```
//! use mixpeek_core::{ContentInput, LocalAnalyzer};
//!
//! let analyzer = LocalAnalyzer::with_defaults();
//! let signals = analyzer.analyze(&ContentInput::from_text(
//!     "Developers love the new programming tools for cloud software",
//! ));
//! assert_eq!(signals.taxonomy.node_id, "technology");
//! ```

pub mod adapters;
pub mod cache;
pub mod classifier;
pub mod content;
pub mod error;
pub mod lexicon;
pub mod product;
pub mod signals;

pub use cache::{cache_key, CacheConfig, CacheStats, SharedCache, TtlCache};
pub use classifier::{
    AnalyzerConfig, BrandSafetyClassifier, BrandSafetyConfig, BrandSafetyResult, GarmCategory,
    KeywordConfig, KeywordExtractor, LocalAnalyzer, RiskLevel, SentimentAnalyzer,
    SentimentConfig, SentimentLabel, SentimentResult, TaxonomyClassifier, TaxonomyConfig,
    TaxonomyResult,
};
pub use content::{ContentExtractor, ContentInput, ExtractedContent, ExtractorConfig, ProductInput};
pub use error::{ErrorCode, ErrorInfo, Result, SignalError};
pub use lexicon::Lexicon;
pub use signals::{AnalysisResult, ContentSignals, SignalSource};
