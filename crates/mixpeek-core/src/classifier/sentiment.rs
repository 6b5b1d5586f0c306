//! Lexicon-based sentiment scoring.
//!
//! Counts whole-word, case-insensitive hits from a positive and a negative
//! word list and derives a score in `[0, 1]`:
//!
//! ```text
//! score = (positive - negative + total) / (2 * total)    when total > 0
//! score = 0.5                                            otherwise
//! ```

use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::lexicon::Lexicon;

/// Three-way sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Returns the lowercase name of this label.
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
        }
    }
}

/// Result of sentiment scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Score in `[0, 1]`; 0.5 is neutral.
    pub score: f32,
    /// Number of positive word hits.
    #[serde(default)]
    pub positive: usize,
    /// Number of negative word hits.
    #[serde(default)]
    pub negative: usize,
}

impl SentimentResult {
    /// A neutral result with no matches.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
            positive: 0,
            negative: 0,
        }
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Label thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Scores strictly above this are positive.
    pub positive_threshold: f32,
    /// Scores strictly below this are negative.
    pub negative_threshold: f32,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_threshold: 0.6,
            negative_threshold: 0.4,
        }
    }
}

/// Word-list sentiment analyzer.
#[derive(Debug, Clone)]
pub struct SentimentAnalyzer {
    positive: Option<Regex>,
    negative: Option<Regex>,
    config: SentimentConfig,
}

impl SentimentAnalyzer {
    /// Creates an analyzer from the lexicon's word lists.
    pub fn new(lexicon: Arc<Lexicon>, config: SentimentConfig) -> Result<Self> {
        Ok(Self {
            positive: word_list_regex(&lexicon.positive_words)?,
            negative: word_list_regex(&lexicon.negative_words)?,
            config,
        })
    }

    /// Creates an analyzer with the built-in lexicon.
    pub fn with_defaults() -> Self {
        Self::new(Lexicon::shared(), SentimentConfig::default())
            .expect("built-in sentiment word lists are valid")
    }

    /// Scores the text.
    pub fn analyze(&self, text: &str) -> SentimentResult {
        if text.trim().is_empty() {
            return SentimentResult::neutral();
        }

        let positive = count_matches(self.positive.as_ref(), text);
        let negative = count_matches(self.negative.as_ref(), text);
        let total = positive + negative;

        if total == 0 {
            return SentimentResult::neutral();
        }

        let score = (positive as f32 - negative as f32 + total as f32) / (2.0 * total as f32);
        let label = if score > self.config.positive_threshold {
            SentimentLabel::Positive
        } else if score < self.config.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        SentimentResult {
            label,
            score: score.clamp(0.0, 1.0),
            positive,
            negative,
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn word_list_regex(words: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| SignalError::InvalidConfig(format!("sentiment word list: {}", e)))
}

fn count_matches(regex: Option<&Regex>, text: &str) -> usize {
    regex.map(|r| r.find_iter(text).count()).unwrap_or(0)
}
