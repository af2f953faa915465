//! Trained model: the fitted vectorizer and classifier as one value.
//!
//! A [`TrainedModel`] is only ever constructed from both halves at once and
//! exposes no setters, so the vectorizer that produced the training features
//! is always the one used at inference. The normalizer that cleaned the
//! training corpus travels with the pair for the same reason. The pair is
//! persisted and loaded as a unit by [`ArtifactStore`](crate::ArtifactStore).
//!
//! # Example
//!
//! ```rust,ignore
//! use truebot_learning::{ArtifactStore, TrainedModel};
//!
//! let model: TrainedModel = ArtifactStore::new("model").load()?;
//! let prediction = model.predict("The ministry confirmed the budget.");
//! println!("{} ({:.2}%)", prediction.label, prediction.confidence);
//! ```
//!
//! # Thread Safety
//!
//! `TrainedModel` is immutable after construction and is `Send + Sync`; the
//! predictor shares one instance per artifact directory behind an `Arc`.

use crate::config::Algorithm;
use crate::error::{LearningError, Result};
use crate::models::{Classifier, FittedClassifier};
use crate::types::PredictionResult;
use chrono::{DateTime, Utc};
use truebot_processing::{Normalizer, SparseVector, TfidfVectorizer};

static_assertions::assert_impl_all!(TrainedModel: Send, Sync);

/// A fitted (vectorizer, classifier) pair ready for inference.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    vectorizer: TfidfVectorizer,
    classifier: FittedClassifier,
    trained_at: DateTime<Utc>,
    normalizer: Normalizer,
}

impl TrainedModel {
    /// Pair a vectorizer with the classifier fitted on its output, serving
    /// with the embedded lexical resources.
    ///
    /// # Errors
    ///
    /// [`LearningError::ArtifactMismatch`] if the classifier expects a
    /// different feature dimension than the vectorizer produces.
    pub fn new(vectorizer: TfidfVectorizer, classifier: FittedClassifier) -> Result<Self> {
        Self::with_normalizer(vectorizer, classifier, Normalizer::new())
    }

    /// Like [`new`](Self::new), for a pair fitted on text cleaned by
    /// `normalizer`.
    pub fn with_normalizer(
        vectorizer: TfidfVectorizer,
        classifier: FittedClassifier,
        normalizer: Normalizer,
    ) -> Result<Self> {
        Self::from_parts(vectorizer, classifier, Utc::now(), normalizer)
    }

    pub(crate) fn from_parts(
        vectorizer: TfidfVectorizer,
        classifier: FittedClassifier,
        trained_at: DateTime<Utc>,
        normalizer: Normalizer,
    ) -> Result<Self> {
        if vectorizer.dimension() != classifier.n_features() {
            return Err(LearningError::ArtifactMismatch(format!(
                "vectorizer produces {} features but the {} classifier expects {}",
                vectorizer.dimension(),
                classifier.algorithm(),
                classifier.n_features()
            )));
        }

        Ok(Self {
            vectorizer,
            classifier,
            trained_at,
            normalizer,
        })
    }

    /// Probability that `text` is real news.
    pub fn predict_proba(&self, text: &str) -> f64 {
        self.classifier.predict_proba(&self.featurize(text))
    }

    /// Classify `text`.
    pub fn predict(&self, text: &str) -> PredictionResult {
        PredictionResult::from_probability(self.predict_proba(text))
    }

    /// Classify every document in `texts`, preserving order.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<PredictionResult> {
        texts.iter().map(|t| self.predict(t.as_ref())).collect()
    }

    /// Normalized, vectorized form of `text`.
    pub fn featurize(&self, text: &str) -> SparseVector {
        self.vectorizer
            .transform_one(&self.normalizer.normalize(text))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.classifier.algorithm()
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &FittedClassifier {
        &self.classifier
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// When the pair was fitted.
    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}
