//! Error types for text normalization and vectorization.
//!
//! Everything fallible in this crate returns [`Result<T>`], an alias over
//! [`ProcessingError`]. Normalizing text is infallible; errors come from
//! loading lexical resources, validating configuration, and fitting a
//! vectorizer on a corpus that produces no terms.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the processing crate.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A lexical resource (stopwords or lemma dictionary) could not be loaded.
    #[error("Failed to load lexical resource '{path}': {reason}")]
    Resource { path: PathBuf, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The corpus yielded no terms after analysis.
    ///
    /// Happens when every document is empty, or contains only single-character
    /// tokens once normalized.
    #[error("Empty vocabulary: the corpus produced no terms")]
    EmptyVocabulary,
}

impl ProcessingError {
    /// Get error code for caller-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Resource { .. } => "RESOURCE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::EmptyVocabulary => "EMPTY_VOCABULARY",
        }
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::EmptyVocabulary.error_code(),
            "EMPTY_VOCABULARY"
        );
        assert_eq!(
            ProcessingError::InvalidConfig("x".to_string()).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_resource_error_display() {
        let err = ProcessingError::Resource {
            path: PathBuf::from("lexicon/lemmas.tsv"),
            reason: "line 3 has no tab".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("lemmas.tsv"));
        assert!(msg.contains("line 3"));
    }
}
