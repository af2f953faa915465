//! Text normalization and TF-IDF vectorization for news classification.
//!
//! # Overview
//!
//! This crate turns raw news text into fixed-width numeric features:
//!
//! - **Lexical resources**: an English stopword list and a form → lemma
//!   dictionary, embedded in the crate and parsed once per process
//! - **Normalization**: lowercasing, URL and non-letter removal, stopword
//!   filtering and lemmatization, all deterministic and idempotent
//! - **Vectorization**: TF-IDF over unigrams and bigrams with a capped
//!   vocabulary, sublinear term frequency and L2-normalized rows
//!
//! # Quick Start
//!
//! ```
//! use truebot_processing::{normalize_corpus, TfidfVectorizer, VectorizerConfig};
//!
//! let corpus = normalize_corpus([
//!     "The ministry confirmed the budget according to the official bulletin.",
//!     "A viral meme claimed a pop star teleported across continents.",
//! ]);
//!
//! let config = VectorizerConfig::builder().max_features(5000).build()?;
//! let vectorizer = TfidfVectorizer::fit(&corpus, config)?;
//! let features = vectorizer.transform(&corpus);
//!
//! assert_eq!(features.len(), 2);
//! assert!(features.iter().all(|v| v.dim() == vectorizer.dimension()));
//! # Ok::<(), truebot_processing::ProcessingError>(())
//! ```
//!
//! # Custom resources
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use truebot_processing::{LexicalResources, Normalizer};
//!
//! let resources = LexicalResources::from_dir("/etc/truebot/lexicon")?;
//! let normalizer = Normalizer::with_resources(Arc::new(resources));
//! let text = normalizer.normalize("Officials confirmed the report");
//! ```

pub mod config;
pub mod error;
pub mod lexicon;
pub mod normalizer;
pub mod types;
pub mod vectorizer;

// Re-exports for convenient access
pub use config::{VectorizerConfig, VectorizerConfigBuilder};
pub use error::{ProcessingError, Result as ProcessingResult};
pub use lexicon::{LexicalResources, ensure_initialized};
pub use normalizer::{Normalizer, clean_text, normalize, normalize_corpus, tokenize};
pub use types::SparseVector;
pub use vectorizer::TfidfVectorizer;
