//! Term extraction: word tokens of two or more characters, then n-grams.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid regex: token"));

/// Word tokens of `doc`. Single-character words are skipped.
pub fn word_tokens(doc: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(doc).map(|m| m.as_str()).collect()
}

/// All contiguous n-grams of `tokens` for `min_n..=max_n`, joined by a space.
///
/// Unigrams come first, then bigrams, and so on.
pub fn ngrams(tokens: &[&str], (min_n, max_n): (usize, usize)) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n == 0 || n > tokens.len() {
            continue;
        }
        terms.extend(tokens.windows(n).map(|window| window.join(" ")));
    }
    terms
}

/// Terms of `doc` for the given n-gram range.
pub fn analyze(doc: &str, ngram_range: (usize, usize)) -> Vec<String> {
    ngrams(&word_tokens(doc), ngram_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_word_tokens_skip_single_chars() {
        assert_eq!(word_tokens("a ministry q budget"), vec!["ministry", "budget"]);
        assert!(word_tokens("").is_empty());
    }

    #[test]
    fn test_ngrams_unigrams_and_bigrams() {
        let terms = analyze("ministry confirm budget", (1, 2));
        assert_eq!(
            terms,
            vec![
                "ministry",
                "confirm",
                "budget",
                "ministry confirm",
                "confirm budget",
            ]
        );
    }

    #[test]
    fn test_ngrams_longer_than_document() {
        assert!(analyze("budget", (2, 3)).is_empty());
        assert_eq!(analyze("budget", (1, 3)), vec!["budget"]);
    }
}
