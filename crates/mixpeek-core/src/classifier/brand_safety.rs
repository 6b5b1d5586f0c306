//! GARM brand-safety classification.
//!
//! Two independent checks feed one result, and the final risk level is the
//! most severe level either check found:
//!
//! - **Keyword check**: tokens that exactly match a blocked keyword.
//! - **Category check**: category ids present in the sensitive-category table.
//!
//! Floor-risk categories always block. In strict mode, high-risk categories
//! block as well.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::keyword::tokenize;
use crate::content::{ContentInput, ProductInput};
use crate::lexicon::{BlockedKeyword, Lexicon};

/// GARM risk tier, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    /// Never appropriate for advertising.
    Floor,
}

impl RiskLevel {
    /// Returns all levels from least to most severe.
    pub fn all() -> &'static [RiskLevel] {
        &[
            RiskLevel::Safe,
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Floor,
        ]
    }

    /// Returns the lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Floor => "floor",
        }
    }

    /// Safety score for this level: 1.0 is fully safe, 0.0 is floor.
    pub fn safety_score(&self) -> f32 {
        match self {
            RiskLevel::Safe => 1.0,
            RiskLevel::Low => 0.8,
            RiskLevel::Medium => 0.5,
            RiskLevel::High => 0.2,
            RiskLevel::Floor => 0.0,
        }
    }
}

/// GARM content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmCategory {
    AdultExplicitSexualContent,
    ArmsAmmunition,
    CrimeHarmfulActs,
    DeathInjuryMilitaryConflict,
    OnlinePiracy,
    HateSpeech,
    ObscenityProfanity,
    IllegalDrugsTobaccoAlcohol,
    SpamHarmfulContent,
    Terrorism,
    DebatedSensitiveSocialIssue,
    SensitiveProducts,
    Gambling,
}

impl GarmCategory {
    /// Returns all GARM categories.
    pub fn all() -> &'static [GarmCategory] {
        &[
            GarmCategory::AdultExplicitSexualContent,
            GarmCategory::ArmsAmmunition,
            GarmCategory::CrimeHarmfulActs,
            GarmCategory::DeathInjuryMilitaryConflict,
            GarmCategory::OnlinePiracy,
            GarmCategory::HateSpeech,
            GarmCategory::ObscenityProfanity,
            GarmCategory::IllegalDrugsTobaccoAlcohol,
            GarmCategory::SpamHarmfulContent,
            GarmCategory::Terrorism,
            GarmCategory::DebatedSensitiveSocialIssue,
            GarmCategory::SensitiveProducts,
            GarmCategory::Gambling,
        ]
    }

    /// Returns the snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            GarmCategory::AdultExplicitSexualContent => "adult_explicit_sexual_content",
            GarmCategory::ArmsAmmunition => "arms_ammunition",
            GarmCategory::CrimeHarmfulActs => "crime_harmful_acts",
            GarmCategory::DeathInjuryMilitaryConflict => "death_injury_military_conflict",
            GarmCategory::OnlinePiracy => "online_piracy",
            GarmCategory::HateSpeech => "hate_speech",
            GarmCategory::ObscenityProfanity => "obscenity_profanity",
            GarmCategory::IllegalDrugsTobaccoAlcohol => "illegal_drugs_tobacco_alcohol",
            GarmCategory::SpamHarmfulContent => "spam_harmful_content",
            GarmCategory::Terrorism => "terrorism",
            GarmCategory::DebatedSensitiveSocialIssue => "debated_sensitive_social_issue",
            GarmCategory::SensitiveProducts => "sensitive_products",
            GarmCategory::Gambling => "gambling",
        }
    }

    /// Returns a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            GarmCategory::AdultExplicitSexualContent => "Adult & Explicit Sexual Content",
            GarmCategory::ArmsAmmunition => "Arms & Ammunition",
            GarmCategory::CrimeHarmfulActs => "Crime & Harmful Acts",
            GarmCategory::DeathInjuryMilitaryConflict => "Death, Injury or Military Conflict",
            GarmCategory::OnlinePiracy => "Online Piracy",
            GarmCategory::HateSpeech => "Hate Speech & Acts of Aggression",
            GarmCategory::ObscenityProfanity => "Obscenity and Profanity",
            GarmCategory::IllegalDrugsTobaccoAlcohol => "Illegal Drugs/Tobacco/eCigarettes/Vaping/Alcohol",
            GarmCategory::SpamHarmfulContent => "Spam or Harmful Content",
            GarmCategory::Terrorism => "Terrorism",
            GarmCategory::DebatedSensitiveSocialIssue => "Debated Sensitive Social Issue",
            GarmCategory::SensitiveProducts => "Sensitive Products",
            GarmCategory::Gambling => "Gambling",
        }
    }
}

/// Brand-safety options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandSafetyConfig {
    /// Also block high-risk categories.
    pub strict_mode: bool,
    /// Extra blocked keywords, added to the lexicon's list.
    pub blocked_keywords: Vec<String>,
    /// Risk level assigned to caller-supplied keywords.
    pub custom_keyword_level: RiskLevel,
}

impl Default for BrandSafetyConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            blocked_keywords: Vec::new(),
            custom_keyword_level: RiskLevel::High,
        }
    }
}

impl BrandSafetyConfig {
    /// Enables or disables strict mode.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Adds caller-supplied blocked keywords.
    pub fn with_blocked_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_keywords
            .extend(keywords.into_iter().map(Into::into));
        self
    }
}

/// Outcome of a brand-safety check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandSafetyResult {
    /// Most severe risk found.
    pub level: RiskLevel,
    /// Safety score in `[0, 1]`, derived from `level`.
    pub score: f32,
    /// GARM categories found, in first-seen order.
    pub categories: Vec<String>,
    /// Whether the content should not be monetized.
    pub blocked: bool,
    /// `!blocked && level != floor`.
    pub safe: bool,
    /// Blocked keywords found in the content.
    #[serde(default)]
    pub flagged_keywords: Vec<String>,
    /// Sensitive category ids that were blocked.
    #[serde(default)]
    pub blocked_category_ids: Vec<u32>,
}

impl BrandSafetyResult {
    /// A result with no findings.
    pub fn safe() -> Self {
        Self {
            level: RiskLevel::Safe,
            score: RiskLevel::Safe.safety_score(),
            categories: Vec::new(),
            blocked: false,
            safe: true,
            flagged_keywords: Vec::new(),
            blocked_category_ids: Vec::new(),
        }
    }
}

impl BrandSafetyResult {
    /// Combines two verdicts on the same content.
    ///
    /// The level is the more severe of the two and either side can block, so
    /// a floor finding survives a lenient second opinion. Findings from both
    /// sides are kept.
    pub fn combine(mut self, other: BrandSafetyResult) -> Self {
        self.level = self.level.max(other.level);
        self.score = self.score.min(other.score).min(self.level.safety_score());
        self.blocked |= other.blocked;
        self.safe = !self.blocked && self.level != RiskLevel::Floor;

        for category in other.categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }
        for keyword in other.flagged_keywords {
            if !self.flagged_keywords.contains(&keyword) {
                self.flagged_keywords.push(keyword);
            }
        }
        for id in other.blocked_category_ids {
            if !self.blocked_category_ids.contains(&id) {
                self.blocked_category_ids.push(id);
            }
        }
        self
    }
}

impl Default for BrandSafetyResult {
    fn default() -> Self {
        Self::safe()
    }
}

/// Accumulates findings from both checks.
struct Findings {
    level: RiskLevel,
    categories: Vec<String>,
    blocked: bool,
    flagged_keywords: Vec<String>,
    blocked_category_ids: Vec<u32>,
}

impl Findings {
    fn new() -> Self {
        Self {
            level: RiskLevel::Safe,
            categories: Vec::new(),
            blocked: false,
            flagged_keywords: Vec::new(),
            blocked_category_ids: Vec::new(),
        }
    }

    fn raise(&mut self, level: RiskLevel) {
        self.level = self.level.max(level);
    }

    fn add_category(&mut self, name: &str) {
        if !self.categories.iter().any(|c| c == name) {
            self.categories.push(name.to_string());
        }
    }

    fn finish(self) -> BrandSafetyResult {
        BrandSafetyResult {
            level: self.level,
            score: self.level.safety_score(),
            categories: self.categories,
            blocked: self.blocked,
            safe: !self.blocked && self.level != RiskLevel::Floor,
            flagged_keywords: self.flagged_keywords,
            blocked_category_ids: self.blocked_category_ids,
        }
    }
}

/// Rule-based brand-safety classifier.
#[derive(Debug, Clone)]
pub struct BrandSafetyClassifier {
    lexicon: Arc<Lexicon>,
    config: BrandSafetyConfig,
    blocked: HashMap<String, BlockedKeyword>,
    custom: HashSet<String>,
}

impl BrandSafetyClassifier {
    /// Creates a classifier over the given lexicon.
    pub fn new(lexicon: Arc<Lexicon>, config: BrandSafetyConfig) -> Self {
        let blocked = lexicon
            .blocked_keywords
            .iter()
            .map(|b| (b.term.to_lowercase(), b.clone()))
            .collect();
        let custom = config
            .blocked_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            lexicon,
            config,
            blocked,
            custom,
        }
    }

    /// Creates a classifier with the shared lexicon and default config.
    pub fn with_defaults() -> Self {
        Self::new(Lexicon::shared(), BrandSafetyConfig::default())
    }

    /// Returns true if strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.config.strict_mode
    }

    /// Classifies free text, extra keywords, and category ids.
    pub fn classify<S: AsRef<str>>(
        &self,
        text: &str,
        keywords: &[S],
        category_ids: &[u32],
    ) -> BrandSafetyResult {
        let mut findings = Findings::new();

        let tokens = tokenize(text)
            .into_iter()
            .chain(keywords.iter().flat_map(|k| tokenize(k.as_ref())));
        for token in tokens {
            self.check_keyword(&token, &mut findings);
        }

        for &id in category_ids {
            self.check_category(id, &mut findings);
        }

        findings.finish()
    }

    /// Classifies page or article content.
    pub fn classify_content(&self, input: &ContentInput) -> BrandSafetyResult {
        self.classify(&input.combined_text(), &input.keywords, &input.categories)
    }

    /// Classifies a product listing.
    pub fn classify_product(&self, input: &ProductInput) -> BrandSafetyResult {
        let text = [input.title.as_deref(), input.description.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let ids: Vec<u32> = input.category_id.into_iter().collect();
        self.classify(&text, &input.keywords, &ids)
    }

    fn check_keyword(&self, token: &str, findings: &mut Findings) {
        let level = if let Some(entry) = self.blocked.get(token) {
            findings.add_category(entry.garm_category.as_str());
            entry.level
        } else if self.custom.contains(token) {
            self.config.custom_keyword_level
        } else {
            return;
        };

        findings.raise(level);
        findings.blocked = true;
        if !findings.flagged_keywords.iter().any(|k| k == token) {
            findings.flagged_keywords.push(token.to_string());
        }
    }

    fn check_category(&self, id: u32, findings: &mut Findings) {
        let Some(category) = self.lexicon.sensitive_category(id) else {
            return;
        };

        findings.raise(category.level);
        findings.add_category(category.garm_category.as_str());

        let blocks = category.level == RiskLevel::Floor
            || (self.config.strict_mode && category.level >= RiskLevel::High);
        if blocks {
            findings.blocked = true;
            if !findings.blocked_category_ids.contains(&id) {
                findings.blocked_category_ids.push(id);
            }
        }
    }
}

impl Default for BrandSafetyClassifier {
    fn default() -> Self {
        Self::with_defaults()
    }
}
