//! Local clean-up of model output. The model is asked to strip contact details,
//! this makes sure they are gone before anything is cached or shown.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::GenerationResult;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern"));

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<>]+").expect("url pattern"));

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("phone pattern")
});

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").expect("space pattern"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+([.,;:!?])").expect("punct pattern"));

pub fn scrub_pii(text: &str) -> String {
    let text = EMAIL_PATTERN.replace_all(text, "");
    let text = URL_PATTERN.replace_all(&text, "");
    let text = PHONE_PATTERN.replace_all(&text, "");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    text.trim().to_string()
}

pub fn tidy_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Scrubbed copy of a result, or `None` when nothing usable is left of the description.
pub fn sanitize_result(result: GenerationResult) -> Option<GenerationResult> {
    let description = scrub_pii(&result.description);
    if description.is_empty() {
        return None;
    }
    Some(GenerationResult { description, seo_keywords: tidy_keywords(result.seo_keywords) })
}
