//! TF-IDF feature extraction.
//!
//! A [`TfidfVectorizer`] is fitted once on a training corpus and frozen. After
//! fitting, its vocabulary (term → column index) and per-term inverse document
//! frequencies never change, so every call to [`transform`] produces vectors
//! of the same dimensionality.
//!
//! # Weighting
//!
//! For a term `t` in document `d` of a corpus of `n` documents:
//!
//! ```text
//! tf(t, d)  = count of t in d                    (raw)
//!           = 1 + ln(count)                      (sublinear_tf)
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1
//! w(t, d)   = tf(t, d) * idf(t)
//! ```
//!
//! Each row is then scaled to unit L2 norm.
//!
//! # Example
//!
//! ```
//! use truebot_processing::{TfidfVectorizer, VectorizerConfig};
//!
//! let corpus = ["ministry confirm budget", "viral meme claim star"];
//! let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerConfig::default())?;
//!
//! let vector = vectorizer.transform_one("budget meme unknown");
//! assert_eq!(vector.dim(), vectorizer.dimension());
//! assert_eq!(vector.nnz(), 2);
//! # Ok::<(), truebot_processing::ProcessingError>(())
//! ```
//!
//! [`transform`]: TfidfVectorizer::transform

mod analyzer;

pub use analyzer::{analyze, ngrams, word_tokens};

use crate::config::VectorizerConfig;
use crate::error::{ProcessingError, Result};
use crate::types::SparseVector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A fitted TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit vocabulary and idf weights on `corpus`.
    ///
    /// Documents are expected to be normalized already.
    ///
    /// # Errors
    ///
    /// - [`ProcessingError::InvalidConfig`] if `config` does not validate.
    /// - [`ProcessingError::EmptyVocabulary`] if no document yields a term.
    pub fn fit<S: AsRef<str>>(corpus: &[S], config: VectorizerConfig) -> Result<Self> {
        config.validate()?;

        let n_docs = corpus.len();
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            for (term, count) in count_terms(doc.as_ref(), config.ngram_range) {
                *term_freq.entry(term.clone()).or_insert(0) += count;
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if term_freq.is_empty() {
            return Err(ProcessingError::EmptyVocabulary);
        }

        let total_terms = term_freq.len();
        let mut ranked: Vec<(String, usize)> = term_freq.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_features);

        let mut kept: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        kept.sort_unstable();

        let idf = kept
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0);
                smoothed_idf(n_docs, df)
            })
            .collect();

        let vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term, idx))
            .collect::<BTreeMap<_, _>>();

        debug!(
            "Fitted TF-IDF vocabulary: {} of {} terms over {} documents",
            vocabulary.len(),
            total_terms,
            n_docs
        );

        Ok(Self {
            config,
            vocabulary,
            idf,
        })
    }

    /// Fit on `corpus` and return its vectors.
    pub fn fit_transform<S: AsRef<str>>(
        corpus: &[S],
        config: VectorizerConfig,
    ) -> Result<(Self, Vec<SparseVector>)> {
        let vectorizer = Self::fit(corpus, config)?;
        let vectors = vectorizer.transform(corpus);
        Ok((vectorizer, vectors))
    }

    /// Vectorize each document with the frozen vocabulary.
    pub fn transform<S: AsRef<str>>(&self, docs: &[S]) -> Vec<SparseVector> {
        docs.iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect()
    }

    /// Vectorize one document. Terms outside the vocabulary contribute zero.
    pub fn transform_one(&self, doc: &str) -> SparseVector {
        let pairs = count_terms(doc, self.config.ngram_range)
            .into_iter()
            .filter_map(|(term, count)| {
                let idx = *self.vocabulary.get(&term)?;
                Some((idx, self.term_weight(count) * self.idf[idx]))
            })
            .collect();

        let mut vector = SparseVector::from_pairs(self.dimension(), pairs);
        vector.l2_normalize();
        vector
    }

    /// Number of features (vocabulary size).
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// Term → column index.
    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Inverse document frequency per column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Terms ordered by column index.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names = vec![""; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            if let Some(slot) = names.get_mut(idx) {
                *slot = term.as_str();
            }
        }
        names
    }

    /// Whether the vocabulary indices are exactly `0..dimension()` and the
    /// idf table has one entry per column.
    ///
    /// Always true for a fitted vectorizer; used to vet deserialized ones.
    pub fn is_consistent(&self) -> bool {
        let dim = self.vocabulary.len();
        if self.idf.len() != dim {
            return false;
        }
        let mut seen = vec![false; dim];
        for &idx in self.vocabulary.values() {
            match seen.get_mut(idx) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    fn term_weight(&self, count: usize) -> f64 {
        let count = count as f64;
        if self.config.sublinear_tf {
            1.0 + count.ln()
        } else {
            count
        }
    }
}

fn count_terms(doc: &str, ngram_range: (usize, usize)) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for term in analyze(doc, ngram_range) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn smoothed_idf(n_docs: usize, df: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unigram_config(max_features: usize) -> VectorizerConfig {
        VectorizerConfig::builder()
            .max_features(max_features)
            .ngram_range(1, 1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_vocabulary_is_lexicographic() {
        let corpus = ["budget ministry", "ministry bulletin"];
        let vectorizer = TfidfVectorizer::fit(&corpus, unigram_config(10)).unwrap();
        assert_eq!(vectorizer.feature_names(), vec!["budget", "bulletin", "ministry"]);
        assert_eq!(vectorizer.dimension(), 3);
        assert!(vectorizer.is_consistent());
    }

    #[test]
    fn test_bigrams_in_vocabulary() {
        let corpus = ["ministry confirm budget"];
        let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerConfig::default()).unwrap();
        assert!(vectorizer.vocabulary().contains_key("ministry confirm"));
        assert!(vectorizer.vocabulary().contains_key("confirm budget"));
        assert_eq!(vectorizer.dimension(), 5);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let corpus = ["meme meme meme star", "meme star claim", "budget"];
        let vectorizer = TfidfVectorizer::fit(&corpus, unigram_config(2)).unwrap();
        assert_eq!(vectorizer.feature_names(), vec!["meme", "star"]);
    }

    #[test]
    fn test_max_features_ties_broken_lexicographically() {
        let corpus = ["zeta alpha", "beta"];
        let vectorizer = TfidfVectorizer::fit(&corpus, unigram_config(2)).unwrap();
        assert_eq!(vectorizer.feature_names(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let corpus = ["budget ministry", "budget"];
        let vectorizer = TfidfVectorizer::fit(&corpus, unigram_config(10)).unwrap();
        let budget = vectorizer.vocabulary()["budget"];
        let ministry = vectorizer.vocabulary()["ministry"];
        assert!((vectorizer.idf()[budget] - 1.0).abs() < 1e-12);
        let expected = (3.0f64 / 2.0).ln() + 1.0;
        assert!((vectorizer.idf()[ministry] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rows_are_unit_norm() {
        let corpus = ["ministry confirm budget budget", "viral meme claim"];
        let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerConfig::default()).unwrap();
        for vector in vectorizer.transform(&corpus) {
            assert!((vector.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sublinear_tf_dampens_counts() {
        let corpus = ["budget budget budget budget ministry"];
        let linear = TfidfVectorizer::fit(
            &corpus,
            VectorizerConfig::builder()
                .ngram_range(1, 1)
                .sublinear_tf(false)
                .build()
                .unwrap(),
        )
        .unwrap();
        let sublinear = TfidfVectorizer::fit(&corpus, unigram_config(10)).unwrap();

        let ratio = |v: &TfidfVectorizer| {
            let row = v.transform_one(corpus[0]);
            row.get(v.vocabulary()["budget"]) / row.get(v.vocabulary()["ministry"])
        };
        assert!((ratio(&linear) - 4.0).abs() < 1e-9);
        assert!((ratio(&sublinear) - (1.0 + 4.0f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_terms_are_zero() {
        let vectorizer = TfidfVectorizer::fit(&["budget"], unigram_config(10)).unwrap();
        let vector = vectorizer.transform_one("teleport continent");
        assert_eq!(vector.nnz(), 0);
        assert_eq!(vector.dim(), 1);
    }

    #[test]
    fn test_empty_vocabulary() {
        let result = TfidfVectorizer::fit(&["", "a b c"], VectorizerConfig::default());
        assert!(matches!(result, Err(ProcessingError::EmptyVocabulary)));
        let empty: [&str; 0] = [];
        assert!(TfidfVectorizer::fit(&empty, VectorizerConfig::default()).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VectorizerConfig {
            max_features: 0,
            ..VectorizerConfig::default()
        };
        let result = TfidfVectorizer::fit(&["budget"], config);
        assert!(matches!(result, Err(ProcessingError::InvalidConfig(_))));
    }

    #[test]
    fn test_serde_preserves_transform() {
        let corpus = ["ministry confirm budget", "viral meme claim star"];
        let vectorizer = TfidfVectorizer::fit(&corpus, VectorizerConfig::default()).unwrap();
        let json = serde_json::to_string(&vectorizer).unwrap();
        let restored: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vectorizer);
        assert_eq!(
            restored.transform_one("confirm budget meme"),
            vectorizer.transform_one("confirm budget meme")
        );
    }

    #[test]
    fn test_inconsistent_vocabulary_detected() {
        let mut vectorizer =
            TfidfVectorizer::fit(&["budget ministry"], unigram_config(10)).unwrap();
        vectorizer.idf.pop();
        assert!(!vectorizer.is_consistent());
    }
}
