//! OpenRTB 2.6 `site.content` enrichment.
//!
//! Categories are emitted as IAB Content Taxonomy 3.x unique ids when the
//! taxonomy result carries one, otherwise as 1.0 codes, with `cattax` set to
//! match.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::signals::{AnalysisResult, ContentSignals};

/// AdCOM `cattax` for IAB Content Taxonomy 1.0.
pub const CATTAX_CONTENT_1_0: u8 = 1;

/// AdCOM `cattax` for IAB Content Taxonomy 3.x.
pub const CATTAX_CONTENT_3_0: u8 = 7;

/// Maximum length of the comma-joined `keywords` field.
pub const MAX_KEYWORDS_LEN: usize = 500;

/// Vendor key under `ext.data`.
pub const EXT_KEY: &str = "mixpeek";

/// Brand-safety detail in the vendor extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyExt {
    pub level: String,
    pub score: f32,
    pub blocked: bool,
    pub categories: Vec<String>,
}

/// Full signal detail carried under `ext.data.mixpeek`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MixpeekExt {
    pub category: String,
    pub node_id: String,
    pub path: Vec<String>,
    pub confidence: f32,
    pub keywords: Vec<String>,
    pub sentiment: String,
    pub sentiment_score: f32,
    pub brand_safety: SafetyExt,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtData {
    pub mixpeek: MixpeekExt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentExt {
    pub data: ExtData,
}

/// An OpenRTB `site.content` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteContent {
    pub cat: Vec<String>,
    pub cattax: u8,
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub ext: ContentExt,
}

/// Builds `site.content` from a signal set.
pub fn site_content(signals: &ContentSignals) -> SiteContent {
    let taxonomy = &signals.taxonomy;
    let (cat, cattax) = match (&taxonomy.iab_v3, &taxonomy.iab_v1) {
        (Some(v3), _) => (vec![v3.clone()], CATTAX_CONTENT_3_0),
        (None, Some(v1)) => (vec![v1.clone()], CATTAX_CONTENT_1_0),
        (None, None) => (Vec::new(), CATTAX_CONTENT_3_0),
    };

    let safety = &signals.brand_safety;
    SiteContent {
        cat,
        cattax,
        keywords: join_keywords(&signals.keywords, MAX_KEYWORDS_LEN),
        genre: (!taxonomy.is_general()).then(|| taxonomy.label.clone()),
        ext: ContentExt {
            data: ExtData {
                mixpeek: MixpeekExt {
                    category: taxonomy.label.clone(),
                    node_id: taxonomy.node_id.clone(),
                    path: taxonomy.path.clone(),
                    confidence: taxonomy.score,
                    keywords: signals.keywords.clone(),
                    sentiment: signals.sentiment.label.as_str().to_string(),
                    sentiment_score: signals.sentiment.score,
                    brand_safety: SafetyExt {
                        level: safety.level.as_str().to_string(),
                        score: safety.score,
                        blocked: safety.blocked,
                        categories: safety.categories.clone(),
                    },
                    topics: signals.topics.clone(),
                    source: None,
                    document_id: None,
                },
            },
        },
    }
}

/// Builds `site.content` with provenance from an analysis result.
pub fn site_content_for(result: &AnalysisResult) -> SiteContent {
    let mut content = site_content(&result.signals);
    let ext = &mut content.ext.data.mixpeek;
    ext.source = Some(result.source.as_str().to_string());
    ext.document_id = result.document_id.clone();
    content
}

/// Joins keywords with commas, dropping whole keywords past `max_len`.
pub fn join_keywords(keywords: &[String], max_len: usize) -> String {
    let mut out = String::new();
    for keyword in keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.len() + extra + keyword.len() > max_len {
            break;
        }
        if extra == 1 {
            out.push(',');
        }
        out.push_str(keyword);
    }
    out
}

/// Merges signals into a bid request's `site.content`.
///
/// Missing `site` and `content` objects are created. Existing categories and
/// keywords are kept and extended; `cattax` and the vendor extension are
/// overwritten. Returns false, leaving the value untouched, when the request
/// is not a JSON object.
pub fn enrich_bid_request(request: &mut Value, result: &AnalysisResult) -> bool {
    let Some(root) = request.as_object_mut() else {
        return false;
    };

    let enrichment = site_content_for(result);

    let site = object_entry(root, "site");
    let content = object_entry(site, "content");

    let mut cats: Vec<Value> = content
        .get("cat")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for cat in &enrichment.cat {
        let value = Value::String(cat.clone());
        if !cats.contains(&value) {
            cats.push(value);
        }
    }
    content.insert("cat".to_string(), Value::Array(cats));
    content.insert("cattax".to_string(), json!(enrichment.cattax));

    let keywords = match content.get("keywords").and_then(Value::as_str) {
        Some(existing) if !existing.trim().is_empty() => {
            let mut all: Vec<String> = existing.split(',').map(|k| k.trim().to_string()).collect();
            for keyword in &result.signals.keywords {
                if !all.contains(keyword) {
                    all.push(keyword.clone());
                }
            }
            join_keywords(&all, MAX_KEYWORDS_LEN)
        }
        _ => enrichment.keywords.clone(),
    };
    content.insert("keywords".to_string(), Value::String(keywords));

    if let Some(genre) = &enrichment.genre {
        content
            .entry("genre")
            .or_insert_with(|| Value::String(genre.clone()));
    }

    let ext = object_entry(content, "ext");
    let data = object_entry(ext, "data");
    data.insert(
        EXT_KEY.to_string(),
        serde_json::to_value(&enrichment.ext.data.mixpeek).unwrap_or(Value::Null),
    );

    true
}

/// Returns the object at `key`, replacing any non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just set to an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LocalAnalyzer;
    use crate::content::ContentInput;

    fn tech_signals() -> ContentSignals {
        LocalAnalyzer::with_defaults().analyze(&ContentInput::from_text(
            "Software developers write code. Programming software is fun for a developer.",
        ))
    }

    #[test]
    fn builds_site_content() {
        let content = site_content(&tech_signals());
        assert_eq!(content.cat, vec!["596"]);
        assert_eq!(content.cattax, CATTAX_CONTENT_3_0);
        assert!(content.keywords.starts_with("software"));
        assert_eq!(content.genre.as_deref(), Some("Technology"));
        assert_eq!(content.ext.data.mixpeek.node_id, "technology");
    }

    #[test]
    fn empty_signals_still_produce_content() {
        let content = site_content(&ContentSignals::default());
        assert_eq!(content.cat, vec!["IAB24"]);
        assert_eq!(content.cattax, CATTAX_CONTENT_1_0);
        assert_eq!(content.keywords, "");
        assert!(content.genre.is_none());

        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["ext"]["data"]["mixpeek"]["sentiment"], "neutral");
        assert_eq!(json["ext"]["data"]["mixpeek"]["brand_safety"]["level"], "safe");
    }

    #[test]
    fn keywords_are_capped_on_word_boundaries() {
        let words: Vec<String> = ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_keywords(&words, 10), "alpha,beta");
        assert_eq!(join_keywords(&words, 4), "");
        assert_eq!(join_keywords(&words, 100), "alpha,beta,gamma");
    }

    #[test]
    fn enriches_empty_request() {
        let mut request = json!({"id": "req-1"});
        let result = AnalysisResult::local(tech_signals());
        assert!(enrich_bid_request(&mut request, &result));

        let content = &request["site"]["content"];
        assert_eq!(content["cat"], json!(["596"]));
        assert_eq!(content["cattax"], 7);
        assert_eq!(content["ext"]["data"]["mixpeek"]["source"], "local");
        assert_eq!(request["id"], "req-1");
    }

    #[test]
    fn enrichment_preserves_existing_fields() {
        let mut request = json!({
            "site": {
                "page": "https://example.com",
                "content": {"cat": ["IAB1"], "keywords": "news,software", "genre": "News"}
            }
        });
        enrich_bid_request(&mut request, &AnalysisResult::local(tech_signals()));

        let content = &request["site"]["content"];
        assert_eq!(content["cat"], json!(["IAB1", "596"]));
        assert_eq!(content["genre"], "News");
        let keywords = content["keywords"].as_str().unwrap();
        assert!(keywords.starts_with("news,software,"));
        assert_eq!(keywords.matches("software").count(), 1);
        assert_eq!(request["site"]["page"], "https://example.com");
    }

    #[test]
    fn non_object_request_is_left_alone() {
        let mut request = json!([1, 2]);
        assert!(!enrich_bid_request(&mut request, &AnalysisResult::local(ContentSignals::default())));
        assert_eq!(request, json!([1, 2]));
    }
}
