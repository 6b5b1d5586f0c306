//! Content inputs and text extraction.
//!
//! Normalizes what callers hand us (raw text, an HTML page, or only a URL)
//! into an [`ExtractedContent`] with `title`, `description`, and `text`.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Page or article content to analyze.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentInput {
    pub url: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub description: Option<String>,
    /// Caller-supplied keywords.
    pub keywords: Vec<String>,
    /// Caller-supplied category ids (IAB Ad Product ids).
    pub categories: Vec<u32>,
}

impl ContentInput {
    /// Creates input from plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates input from a URL only.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the caller keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category ids.
    pub fn with_categories(mut self, categories: impl Into<Vec<u32>>) -> Self {
        self.categories = categories.into();
        self
    }

    /// Title, description, and text joined by spaces, skipping empty parts.
    pub fn combined_text(&self) -> String {
        join_non_empty(&[
            self.title.as_deref(),
            self.description.as_deref(),
            self.text.as_deref(),
        ])
    }

    /// Returns true if there is nothing to analyze.
    pub fn is_empty(&self) -> bool {
        self.combined_text().is_empty()
            && self.url.as_deref().map(str::trim).unwrap_or("").is_empty()
            && self.keywords.is_empty()
            && self.categories.is_empty()
    }
}

/// A product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Merchant category text, e.g. `Electronics > Phones`.
    pub category: Option<String>,
    /// IAB Ad Product category id, when already known.
    pub category_id: Option<u32>,
    pub brand: Option<String>,
    /// Caller-supplied keywords.
    pub keywords: Vec<String>,
}

impl ProductInput {
    /// Creates a product from a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the merchant category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Sets the caller keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// Normalized content ready for classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub description: String,
    pub text: String,
    /// Description before truncation, when it was truncated.
    #[serde(skip)]
    pub full_description: Option<String>,
    /// Body text before truncation, when it was truncated.
    #[serde(skip)]
    pub full_text: Option<String>,
}

impl ExtractedContent {
    /// Title, description, and text joined by spaces.
    pub fn combined(&self) -> String {
        join_non_empty(&[
            Some(self.title.as_str()),
            Some(self.description.as_str()),
            Some(self.text.as_str()),
        ])
    }

    /// Like [`combined`](Self::combined) but without the length limits.
    ///
    /// Brand safety scans this so a blocked term past the limit still counts.
    pub fn full_combined(&self) -> String {
        join_non_empty(&[
            Some(self.title.as_str()),
            Some(self.full_description.as_deref().unwrap_or(&self.description)),
            Some(self.full_text.as_deref().unwrap_or(&self.text)),
        ])
    }

    /// Returns true if no text was extracted.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty() && self.text.is_empty()
    }
}

/// Extraction limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum characters of body text kept.
    pub max_text_len: usize,
    /// Maximum characters of description kept.
    pub max_description_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_text_len: 10_000,
            max_description_len: 1_000,
        }
    }
}

impl ExtractorConfig {
    /// Sets the body text limit.
    pub fn with_max_text_len(mut self, len: usize) -> Self {
        self.max_text_len = len;
        self
    }
}

/// Builds [`ExtractedContent`] from text, HTML, or a URL.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    config: ExtractorConfig,
}

impl ContentExtractor {
    /// Creates an extractor.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Normalizes structured input.
    ///
    /// Missing title and text are derived from the URL path when a URL is
    /// present.
    pub fn extract(&self, input: &ContentInput) -> ExtractedContent {
        let slug = input.url.as_deref().map(url_slug_words).unwrap_or_default();

        let title = non_empty(input.title.as_deref())
            .map(clean_text)
            .or_else(|| slug.last().cloned())
            .unwrap_or_default();
        let description = non_empty(input.description.as_deref())
            .map(clean_text)
            .unwrap_or_default();
        let text = match non_empty(input.text.as_deref()) {
            Some(text) => clean_text(text),
            None => slug.join(" "),
        };

        let (description, full_description) =
            truncate_keeping(description, self.config.max_description_len);
        let (text, full_text) = truncate_keeping(text, self.config.max_text_len);
        ExtractedContent {
            url: input.url.clone(),
            title,
            description,
            text,
            full_description,
            full_text,
        }
    }

    /// Extracts title, description, and visible text from an HTML document.
    pub fn extract_html(&self, html: &str, url: Option<&str>) -> ExtractedContent {
        let document = Html::parse_document(html);

        let title = first_text(&document, "title")
            .or_else(|| meta_content(&document, r#"meta[property="og:title"]"#))
            .or_else(|| first_text(&document, "h1"))
            .unwrap_or_default();
        let description = meta_content(&document, r#"meta[name="description"]"#)
            .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#))
            .unwrap_or_default();

        let body = Selector::parse("body")
            .ok()
            .and_then(|s| document.select(&s).next())
            .unwrap_or_else(|| document.root_element());

        let (description, full_description) =
            truncate_keeping(description, self.config.max_description_len);
        let (text, full_text) = truncate_keeping(visible_text(body), self.config.max_text_len);
        ExtractedContent {
            url: url.map(str::to_string),
            title,
            description,
            text,
            full_description,
            full_text,
        }
    }

    /// Derives content from a URL path alone.
    pub fn extract_url(&self, url: &str) -> ExtractedContent {
        self.extract(&ContentInput::from_url(url))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn join_non_empty(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .filter_map(|p| non_empty(*p))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses runs of whitespace.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to at most `max` characters.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Truncates to `max` characters, returning the original when it was cut.
fn truncate_keeping(text: String, max: usize) -> (String, Option<String>) {
    let truncated = truncate(&text, max);
    if truncated.len() == text.len() {
        (truncated, None)
    } else {
        (truncated, Some(text))
    }
}

/// Words from each path segment of a URL, one string per segment.
///
/// `https://example.com/tech/rust-2024-release.html` yields
/// `["tech", "rust release"]`.
fn url_slug_words(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return Vec::new();
    };
    let Some(segments) = parsed.path_segments() else {
        return Vec::new();
    };

    segments
        .map(|segment| {
            let stem = match segment.rsplit_once('.') {
                Some((stem, ext)) if ext.len() <= 4 && !stem.is_empty() => stem,
                _ => segment,
            };
            stem.split(|c: char| c == '-' || c == '_' || c == '+' || c == '.')
                .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|words| !words.is_empty())
        .collect()
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
    (!text.is_empty()).then_some(text)
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|e| e.value().attr("content"))
        .map(clean_text)
        .find(|c| !c.is_empty())
}

/// Text nodes under `root`, skipping script, style, and template content.
fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
                .unwrap_or(false)
        });
        if !hidden {
            parts.push(&text.text);
        }
    }
    clean_text(&parts.join(" "))
}
