//! Local content classifiers.
//!
//! Every classifier here is a pure function of its input and the injected
//! [`Lexicon`](crate::lexicon::Lexicon). They run when the remote API is
//! unavailable or slow, so they never fail: empty input yields a neutral
//! result.

mod brand_safety;
mod keyword;
mod pipeline;
mod sentiment;
mod taxonomy;

pub use brand_safety::{
    BrandSafetyClassifier, BrandSafetyConfig, BrandSafetyResult, GarmCategory, RiskLevel,
};
pub use keyword::{tokenize, KeywordConfig, KeywordExtractor, DEFAULT_KEYWORD_LIMIT};
pub use pipeline::{AnalyzerConfig, LocalAnalyzer};
pub use sentiment::{SentimentAnalyzer, SentimentConfig, SentimentLabel, SentimentResult};
pub use taxonomy::{TaxonomyClassifier, TaxonomyConfig, TaxonomyResult};
