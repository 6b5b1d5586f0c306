//! Local analysis pipeline.
//!
//! Runs extraction and the four classifiers over one content item. This is
//! the path used whenever the remote API is unavailable, so it is total:
//! any input, including an empty one, produces a complete signal set.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    BrandSafetyClassifier, BrandSafetyConfig, KeywordConfig, KeywordExtractor, SentimentAnalyzer,
    SentimentConfig, TaxonomyClassifier, TaxonomyConfig,
};
use crate::content::{ContentExtractor, ContentInput, ExtractedContent, ExtractorConfig};
use crate::error::Result;
use crate::lexicon::Lexicon;
use crate::signals::ContentSignals;

/// Configuration for every local classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub extractor: ExtractorConfig,
    pub keywords: KeywordConfig,
    pub sentiment: SentimentConfig,
    pub taxonomy: TaxonomyConfig,
    pub brand_safety: BrandSafetyConfig,
}

impl AnalyzerConfig {
    /// Enables strict brand-safety mode.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.brand_safety.strict_mode = strict;
        self
    }

    /// Sets the keyword limit.
    pub fn with_keyword_limit(mut self, limit: usize) -> Self {
        self.keywords.limit = limit;
        self
    }
}

/// Runs all local classifiers.
#[derive(Debug, Clone)]
pub struct LocalAnalyzer {
    extractor: ContentExtractor,
    keywords: KeywordExtractor,
    sentiment: SentimentAnalyzer,
    taxonomy: TaxonomyClassifier,
    brand_safety: BrandSafetyClassifier,
}

impl LocalAnalyzer {
    /// Creates an analyzer over the given lexicon.
    ///
    /// Fails if the lexicon's sentiment word lists cannot be compiled.
    pub fn new(lexicon: Arc<Lexicon>, config: AnalyzerConfig) -> Result<Self> {
        Ok(Self {
            extractor: ContentExtractor::new(config.extractor),
            keywords: KeywordExtractor::new(Arc::clone(&lexicon), config.keywords),
            sentiment: SentimentAnalyzer::new(Arc::clone(&lexicon), config.sentiment)?,
            taxonomy: TaxonomyClassifier::new(Arc::clone(&lexicon), config.taxonomy),
            brand_safety: BrandSafetyClassifier::new(lexicon, config.brand_safety),
        })
    }

    /// Creates an analyzer with the shared lexicon and default config.
    pub fn with_defaults() -> Self {
        Self {
            extractor: ContentExtractor::default(),
            keywords: KeywordExtractor::with_defaults(),
            sentiment: SentimentAnalyzer::with_defaults(),
            taxonomy: TaxonomyClassifier::with_defaults(),
            brand_safety: BrandSafetyClassifier::with_defaults(),
        }
    }

    /// Returns the content extractor.
    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    /// Returns the keyword extractor.
    pub fn keywords(&self) -> &KeywordExtractor {
        &self.keywords
    }

    /// Returns the sentiment analyzer.
    pub fn sentiment(&self) -> &SentimentAnalyzer {
        &self.sentiment
    }

    /// Returns the taxonomy classifier.
    pub fn taxonomy(&self) -> &TaxonomyClassifier {
        &self.taxonomy
    }

    /// Returns the brand-safety classifier.
    pub fn brand_safety(&self) -> &BrandSafetyClassifier {
        &self.brand_safety
    }

    /// Analyzes structured content.
    pub fn analyze(&self, input: &ContentInput) -> ContentSignals {
        let extracted = self.extractor.extract(input);
        self.analyze_extracted(&extracted, &input.keywords, &input.categories)
    }

    /// Analyzes an HTML page.
    pub fn analyze_html(&self, html: &str, url: Option<&str>) -> ContentSignals {
        let extracted = self.extractor.extract_html(html, url);
        self.analyze_extracted(&extracted, &[], &[])
    }

    /// Analyzes already-extracted content plus caller hints.
    pub fn analyze_extracted(
        &self,
        content: &ExtractedContent,
        caller_keywords: &[String],
        categories: &[u32],
    ) -> ContentSignals {
        let start = Instant::now();
        let text = content.combined();

        let keywords = self.keywords.extract(&text);

        // caller keywords first, then extracted ones not already present
        let mut taxonomy_terms: Vec<String> = caller_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        for keyword in &keywords {
            if !taxonomy_terms.contains(keyword) {
                taxonomy_terms.push(keyword.clone());
            }
        }

        let sentiment = self.sentiment.analyze(&text);
        let taxonomy = self.taxonomy.classify(&taxonomy_terms);
        let brand_safety = self
            .brand_safety
            .classify(&content.full_combined(), caller_keywords, categories);

        debug!(
            keywords = keywords.len(),
            category = %taxonomy.node_id,
            sentiment = sentiment.label.as_str(),
            risk = brand_safety.level.as_str(),
            duration_us = start.elapsed().as_micros() as u64,
            "Local analysis complete"
        );

        ContentSignals {
            keywords,
            sentiment,
            taxonomy,
            brand_safety,
            entities: Vec::new(),
            topics: Vec::new(),
        }
    }
}

impl Default for LocalAnalyzer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{RiskLevel, SentimentLabel};

    fn analyzer() -> LocalAnalyzer {
        LocalAnalyzer::with_defaults()
    }

    #[test]
    fn empty_input_yields_neutral_signals() {
        let signals = analyzer().analyze(&ContentInput::default());
        assert!(signals.keywords.is_empty());
        assert_eq!(signals.sentiment.label, SentimentLabel::Neutral);
        assert!(signals.taxonomy.is_general());
        assert_eq!(signals.brand_safety.level, RiskLevel::Safe);
    }

    #[test]
    fn analyzes_technology_article() {
        let input = ContentInput::from_text(
            "Cloud software developers love the new programming tools. \
             The software release was an excellent success for developer teams.",
        )
        .with_title("Software news");
        let signals = analyzer().analyze(&input);

        assert_eq!(signals.keywords[0], "software");
        assert_eq!(signals.taxonomy.node_id, "technology");
        assert_eq!(signals.sentiment.label, SentimentLabel::Positive);
        assert!(signals.brand_safety.safe);
    }

    #[test]
    fn caller_keywords_steer_taxonomy() {
        let input = ContentInput::from_text("A short note").with_keywords(["mortgage", "condo"]);
        let signals = analyzer().analyze(&input);
        assert_eq!(signals.taxonomy.node_id, "real_estate");
    }

    #[test]
    fn caller_categories_reach_brand_safety() {
        let input = ContentInput::from_text("Product roundup").with_categories(vec![1008]);
        let signals = analyzer().analyze(&input);
        assert!(signals.brand_safety.blocked);
    }

    #[test]
    fn strict_config_applies() {
        let strict = LocalAnalyzer::new(
            Lexicon::shared(),
            AnalyzerConfig::default().with_strict_mode(true),
        )
        .unwrap();
        let input = ContentInput::from_text("Casino night").with_categories(vec![1441]);
        assert!(strict.analyze(&input).brand_safety.blocked);
        assert!(!analyzer().analyze(&input).brand_safety.blocked);
    }

    #[test]
    fn analyzes_html() {
        let html = "<html><head><title>Championship football</title></head>\
                    <body><p>The league tournament final.</p></body></html>";
        let signals = analyzer().analyze_html(html, None);
        assert_eq!(signals.taxonomy.node_id, "sports");
    }

    #[test]
    fn brand_safety_scans_past_the_text_limit() {
        let text = format!("{} cocaine", "gardening ".repeat(1100));
        let input = ContentInput::from_text(text);

        let signals = analyzer().analyze(&input);
        assert!(signals.brand_safety.blocked);
        assert_eq!(signals.brand_safety.flagged_keywords, vec!["cocaine"]);
        assert_eq!(
            signals.brand_safety,
            analyzer().brand_safety().classify_content(&input)
        );
    }

    #[test]
    fn html_brand_safety_scans_past_the_text_limit() {
        let html = format!(
            "<html><body><p>{}</p><p>cocaine</p></body></html>",
            "gardening ".repeat(1100)
        );
        assert!(analyzer().analyze_html(&html, None).brand_safety.blocked);
    }
}
