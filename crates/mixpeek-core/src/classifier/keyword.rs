//! Frequency-ranked keyword extraction.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::Lexicon;

/// Default number of keywords returned.
pub const DEFAULT_KEYWORD_LIMIT: usize = 15;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Lowercases text, replaces punctuation with spaces, and splits on whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    NON_WORD
        .replace_all(&lower, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Configuration for keyword extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    /// Maximum number of keywords returned.
    pub limit: usize,
    /// Minimum token length (in characters) to be considered.
    pub min_len: usize,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_KEYWORD_LIMIT,
            min_len: 4,
        }
    }
}

impl KeywordConfig {
    /// Sets the keyword limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the minimum token length.
    pub fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }
}

/// Extracts the most frequent non-stop-word tokens from text.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    lexicon: Arc<Lexicon>,
    config: KeywordConfig,
}

impl KeywordExtractor {
    /// Creates an extractor over the given lexicon.
    pub fn new(lexicon: Arc<Lexicon>, config: KeywordConfig) -> Self {
        Self { lexicon, config }
    }

    /// Creates an extractor with the shared lexicon and default config.
    pub fn with_defaults() -> Self {
        Self::new(Lexicon::shared(), KeywordConfig::default())
    }

    /// Returns the configured limit.
    pub fn limit(&self) -> usize {
        self.config.limit
    }

    /// Extracts up to `limit` keywords, most frequent first.
    ///
    /// Ties keep the order in which the tokens first appeared.
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.extract_with_limit(text, self.config.limit)
    }

    /// Extracts keywords with an explicit limit.
    pub fn extract_with_limit(&self, text: &str, limit: usize) -> Vec<String> {
        if text.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for token in tokenize(text) {
            if token.chars().count() < self.config.min_len || self.lexicon.is_stop_word(&token) {
                continue;
            }
            match index.get(&token) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(token.clone(), counts.len());
                    counts.push((token, 1));
                }
            }
        }

        // sort_by is stable, so first-seen order survives among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.into_iter().take(limit).map(|(t, _)| t).collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeywordExtractor {
        KeywordExtractor::with_defaults()
    }

    #[test]
    fn empty_text_returns_nothing() {
        assert!(extractor().extract("").is_empty());
        assert!(extractor().extract("   \n\t").is_empty());
    }

    #[test]
    fn drops_short_tokens_and_stop_words() {
        let keywords = extractor().extract("The cat and the dog were there because rust");
        assert_eq!(keywords, vec!["rust"]);
    }

    #[test]
    fn ranks_by_frequency() {
        let keywords = extractor().extract("rust cargo rust crates cargo rust");
        assert_eq!(keywords, vec!["rust", "cargo", "crates"]);
    }

    #[test]
    fn ties_keep_first_occurrence_order() {
        let keywords = extractor().extract("zebra apple mango apple zebra mango");
        assert_eq!(keywords, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn punctuation_splits_tokens() {
        let keywords = extractor().extract("Rust's ownership-model, explained!");
        assert_eq!(keywords, vec!["rust", "ownership", "model", "explained"]);
    }

    #[test]
    fn respects_limit() {
        let text = (0..40)
            .map(|i| format!("token{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extractor().extract(&text).len(), DEFAULT_KEYWORD_LIMIT);

        let ten = KeywordExtractor::new(Lexicon::shared(), KeywordConfig::default().with_limit(10));
        assert_eq!(ten.extract(&text).len(), 10);
    }

    #[test]
    fn output_is_lowercase() {
        let keywords = extractor().extract("SOFTWARE Software software");
        assert_eq!(keywords, vec!["software"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let text = "streaming music concert album streaming music";
        assert_eq!(extractor().extract(text), extractor().extract(text));
    }

    #[test]
    fn tokenize_keeps_all_tokens() {
        assert_eq!(tokenize("A gun, a war."), vec!["a", "gun", "a", "war"]);
    }
}
