//! truebot-learning: real/fake news classifier training and inference.
//!
//! This crate trains several binary classifiers over TF-IDF features from
//! [`truebot_processing`], keeps the most accurate one, persists it next to
//! its vectorizer, and serves cached predictions from the stored pair.
//!
//! # Features
//!
//! - **Model Selection**: Logistic regression, random forest and (with the
//!   `gradient-boosting` feature) boosted trees, compared on a stratified
//!   held-out split
//! - **Paired Artifacts**: Vectorizer and classifier are persisted and loaded
//!   only together
//! - **Cached Inference**: One load (or one training run) per artifact
//!   directory and process
//! - **Deterministic**: Every random step is seeded from the configuration
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use truebot_learning::{ArtifactLocator, TrainingConfig, predict_label, train};
//!
//! // Train every candidate and persist the best pair
//! let scores = train("data/news.csv", "model", &TrainingConfig::default())?;
//! println!("{scores:?}");
//!
//! // Classify with the stored pair (loaded once, then cached)
//! let locator = ArtifactLocator::new("model", "data/news.csv");
//! let result = predict_label("The ministry confirmed the budget.", &locator)?;
//! println!("{} ({:.2}%)", result.label, result.confidence);
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ Dataset  │──►│  Pipeline  │──►│   TrainedModel   │──►│ArtifactStore │
//! │ (polars) │   │ (registry) │   │ vectorizer + clf │   │ model.json   │
//! └──────────┘   └────────────┘   └────────▲─────────┘   │vectorizer.json│
//!                                          │             └──────┬───────┘
//!                                   ┌──────┴──────┐             │
//!                                   │ ModelCache  │◄────────────┘
//!                                   │predict_label│
//!                                   └─────────────┘
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, LearningError>`](Result):
//!
//! - [`LearningError::Schema`] - The corpus lacks a `text` or `label` column
//! - [`LearningError::InvalidData`] - The labels cannot be split
//! - [`LearningError::TrainingFailed`] - No candidate could be fitted
//! - [`LearningError::ArtifactNotFound`] - No stored pair (recoverable)
//! - [`LearningError::ArtifactMismatch`] - Stored files do not belong together
//!
//! # Thread Safety
//!
//! [`TrainedModel`] and [`ModelCache`] are `Send + Sync`. The global cache
//! guarantees that concurrent first callers for one directory share a single
//! initialization.

mod artifacts;
mod config;
mod dataset;
mod error;
mod metrics;
mod model;
pub mod models;
mod pipeline;
mod predictor;
mod registry;
mod split;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{Algorithm, TrainingConfig, TrainingConfigBuilder};
// Error types
pub use error::{LearningError, Result};
// Data loading and splitting
pub use dataset::{Dataset, LABEL_COLUMN, TEXT_COLUMN};
pub use split::{Split, stratified_split};
// Evaluation
pub use metrics::{ClassMetrics, ClassificationReport, accuracy};
// Model types
pub use model::TrainedModel;
pub use models::{Classifier, FittedClassifier};
pub use registry::CandidateRegistry;
// Pipeline types and entry points
pub use pipeline::{Pipeline, PipelineBuilder, train, train_and_persist, train_dataframe};
// Persistence
pub use artifacts::{ArtifactStore, MODEL_FILE, VECTORIZER_FILE};
// Inference
pub use predictor::{
    ArtifactLocator, DATA_PATH_ENV, DEFAULT_DATA_PATH, DEFAULT_MODEL_DIR, MODEL_DIR_ENV,
    ModelCache, predict_label,
};
// Result types
pub use types::{Label, ModelComparison, PredictionResult, TrainingResult};
