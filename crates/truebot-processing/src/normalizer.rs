//! Deterministic text normalization.
//!
//! Raw text goes through two phases:
//!
//! 1. [`clean_text`]: lowercase, strip URLs, drop everything outside `a-z`
//!    and whitespace, collapse whitespace.
//! 2. Token reduction: split on whitespace, drop stopwords, map each token to
//!    its lemma.
//!
//! The output only ever contains `a-z` and single spaces, and normalizing it a
//! second time returns it unchanged.
//!
//! ```
//! use truebot_processing::normalize;
//!
//! let text = "The Ministry CONFIRMED the budget - see https://gov.example/budget!";
//! assert_eq!(normalize(text), "ministry confirm budget see");
//! ```

use crate::lexicon::{self, LexicalResources};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\.\S+").expect("Invalid regex: url"));

static NON_ALPHA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z\s]").expect("Invalid regex: non-alpha"));

static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace"));

/// Lowercase, strip URLs and non-letters, collapse whitespace.
///
/// Empty or whitespace-only input returns an empty string.
pub fn clean_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let without_urls = URL_PATTERN.replace_all(&lowered, " ");
    let letters_only = NON_ALPHA_PATTERN.replace_all(&without_urls, " ");
    let collapsed = WHITESPACE_PATTERN.replace_all(&letters_only, " ");
    collapsed.trim().to_string()
}

/// Text normalizer bound to a set of lexical resources.
///
/// Cheap to clone; the resources are shared.
#[derive(Debug, Clone)]
pub struct Normalizer {
    resources: Arc<LexicalResources>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Normalizer over the process-wide embedded resources.
    pub fn new() -> Self {
        Self {
            resources: Arc::clone(lexicon::ensure_initialized()),
        }
    }

    /// Normalizer over caller-supplied resources.
    pub fn with_resources(resources: Arc<LexicalResources>) -> Self {
        Self { resources }
    }

    /// The resources this normalizer uses.
    pub fn resources(&self) -> &LexicalResources {
        &self.resources
    }

    /// Normalized token sequence for `text`.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = clean_text(text);
        cleaned
            .split_whitespace()
            .filter(|token| !self.resources.is_stopword(token))
            .map(|token| self.resources.lemma(token).to_string())
            .collect()
    }

    /// Normalized tokens joined by single spaces.
    pub fn normalize(&self, text: &str) -> String {
        self.tokenize(text).join(" ")
    }

    /// Normalize every document of a corpus, preserving order.
    pub fn normalize_corpus<I, S>(&self, corpus: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        corpus
            .into_iter()
            .map(|doc| self.normalize(doc.as_ref()))
            .collect()
    }
}

/// [`Normalizer::normalize`] with the process-wide resources.
pub fn normalize(text: &str) -> String {
    Normalizer::new().normalize(text)
}

/// [`Normalizer::tokenize`] with the process-wide resources.
pub fn tokenize(text: &str) -> Vec<String> {
    Normalizer::new().tokenize(text)
}

/// [`Normalizer::normalize_corpus`] with the process-wide resources.
pub fn normalize_corpus<I, S>(corpus: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Normalizer::new().normalize_corpus(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_clean_text_lowercase_and_strip() {
        let cleaned = clean_text("Hello WORLD!!! Visit https://example.com");
        assert!(cleaned.contains("hello world"));
        assert!(!cleaned.contains("http"));
        assert_eq!(cleaned, "hello world visit");
    }

    #[test]
    fn test_clean_text_removes_www_urls() {
        assert_eq!(clean_text("see www.example.org/page now"), "see now");
    }

    #[test]
    fn test_clean_text_digits_and_punctuation() {
        assert_eq!(
            clean_text("GDP grew 3.5% in Q2, officials said."),
            "gdp grew in q officials said"
        );
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\t\tb \n\n c  "), "a b c");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n\t "), "");
        assert_eq!(clean_text("1234 !!!"), "");
    }

    #[test]
    fn test_clean_text_non_latin_letters_removed() {
        assert_eq!(clean_text("café naïve"), "caf na ve");
    }

    #[test]
    fn test_preprocess_removes_stopwords() {
        let processed = normalize("This is a simple sentence for testing.");
        assert!(!processed.split(' ').any(|t| t == "this"));
        assert!(processed.contains("sentence"));
    }

    #[test]
    fn test_tokenize_lemmatizes() {
        let tokens =
            tokenize("The ministry confirmed the budget according to the official bulletin.");
        assert!(tokens.contains(&"ministry".to_string()));
        assert!(tokens.contains(&"confirm".to_string()));
        assert!(tokens.contains(&"budget".to_string()));
        assert!(tokens.contains(&"bulletin".to_string()));
    }

    #[test]
    fn test_tokenize_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("    ").is_empty());
        assert!(tokenize("the and of").is_empty());
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "Officials CONFIRMED 3 new ministries' budgets at http://x.y/z today!",
            "A viral meme claimed a pop star teleported across continents.",
            "Children were running; leaves fell.",
            "http https httpx www. www.a",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_normalize_corpus_preserves_order() {
        let corpus = normalize_corpus(["Stars shine", "", "Budgets rose"]);
        assert_eq!(corpus, vec!["star shine", "", "budget rise"]);
    }

    #[test]
    fn test_custom_resources() {
        let resources =
            LexicalResources::parse("budget\n", "memes\tmeme\n", Path::new("test")).unwrap();
        let normalizer = Normalizer::with_resources(Arc::new(resources));
        assert_eq!(normalizer.normalize("The budget memes"), "the meme");
    }
}
