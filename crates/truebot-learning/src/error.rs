//! Error types for the truebot-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return [`Result<T>`].
//!
//! # Recoverability
//!
//! Only [`LearningError::ArtifactNotFound`] is recoverable: the predictor
//! reacts to it by training a fresh model. Every other variant propagates to
//! the caller unchanged.
//!
//! # Example
//!
//! ```no_run
//! use truebot_learning::{ArtifactStore, LearningError};
//!
//! match ArtifactStore::new("model").load() {
//!     Ok(model) => println!("loaded {}", model.algorithm()),
//!     Err(e) if e.is_recoverable() => println!("no artifacts yet: {e}"),
//!     Err(e) => eprintln!("[{}] {e}", e.error_code()),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;
use truebot_processing::ProcessingError;

/// The main error type for truebot-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// A required column is missing from the training data.
    ///
    /// Raised before any fitting starts. Column names are case-sensitive.
    #[error("Schema error: required column '{0}' not found")]
    Schema(String),

    /// No usable rows remain once null text or label rows are dropped.
    #[error("Empty corpus: no labeled rows to train on")]
    EmptyCorpus,

    /// The data cannot be used for training.
    ///
    /// Common causes:
    /// - Only one class is present
    /// - A class has fewer than two examples, so it cannot be stratified
    /// - The label column is not a string column
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Every candidate classifier failed to fit.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// A model or vectorizer artifact is missing.
    ///
    /// Recoverable: the predictor trains a new pair when it sees this.
    #[error("Artifact not found: {path}")]
    ArtifactNotFound {
        /// The missing file.
        path: PathBuf,
    },

    /// The persisted classifier and vectorizer do not belong together.
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// Invalid configuration provided to the pipeline.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Normalization or vectorization failed.
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// Polars error while loading or reading the dataset.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Artifact (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LearningError {
    /// Get error code for caller-side handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::EmptyCorpus => "EMPTY_CORPUS",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::ArtifactMismatch(_) => "ARTIFACT_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Processing(e) => e.error_code(),
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }

    /// Whether the caller can recover by retraining.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ArtifactNotFound { .. })
    }
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;
