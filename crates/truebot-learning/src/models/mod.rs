//! Binary classifiers over TF-IDF features.
//!
//! Every family implements [`Classifier`]; [`FittedClassifier`] is the closed
//! set of fitted models that can be persisted and loaded. Probabilities are
//! always for the real class.
//!
//! - [`LogisticRegression`]: L2-regularized, truncated Newton
//! - [`RandomForest`]: bootstrap Gini trees
//! - [`GradientBoosting`]: second-order boosted trees (`gradient-boosting` feature)

#[cfg(feature = "gradient-boosting")]
mod boosting;
mod forest;
mod logistic;
mod tree;

#[cfg(feature = "gradient-boosting")]
pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use logistic::{LogisticParams, LogisticRegression};

use crate::config::{Algorithm, TrainingConfig};
use crate::error::{LearningError, Result};
use crate::types::Label;
use serde::{Deserialize, Serialize};
use truebot_processing::SparseVector;

/// A fitted binary classifier.
pub trait Classifier {
    /// Probability that `row` is real, in `[0, 1]`.
    fn predict_proba(&self, row: &SparseVector) -> f64;

    /// Feature dimension the model was fitted on.
    fn n_features(&self) -> usize;

    /// Whether the fitted parameters are usable (finite, in bounds).
    fn is_well_formed(&self) -> bool;

    fn predict(&self, row: &SparseVector) -> Label {
        Label::from_probability(self.predict_proba(row))
    }
}

/// Any fitted model family, tagged by its candidate id when serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "model")]
pub enum FittedClassifier {
    #[serde(rename = "log_reg")]
    LogisticRegression(LogisticRegression),
    #[serde(rename = "random_forest")]
    RandomForest(RandomForest),
    #[cfg(feature = "gradient-boosting")]
    #[serde(rename = "gradient_boosting")]
    GradientBoosting(GradientBoosting),
}

impl FittedClassifier {
    /// Fit `algorithm` with the hyperparameters in `config`.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidConfig`] if `algorithm` is not compiled in
    /// - [`LearningError::InvalidData`] / [`LearningError::TrainingFailed`]
    ///   from the model itself
    pub fn fit(
        algorithm: Algorithm,
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        config: &TrainingConfig,
    ) -> Result<Self> {
        match algorithm {
            Algorithm::LogisticRegression => Ok(Self::LogisticRegression(
                LogisticRegression::fit(rows, labels, n_features, config.into())?,
            )),
            Algorithm::RandomForest => Ok(Self::RandomForest(RandomForest::fit(
                rows,
                labels,
                n_features,
                config.into(),
            )?)),
            #[cfg(feature = "gradient-boosting")]
            Algorithm::GradientBoosting => Ok(Self::GradientBoosting(GradientBoosting::fit(
                rows,
                labels,
                n_features,
                config.into(),
            )?)),
            #[cfg(not(feature = "gradient-boosting"))]
            Algorithm::GradientBoosting => Err(LearningError::InvalidConfig(
                "gradient_boosting requires the 'gradient-boosting' feature".to_string(),
            )),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::LogisticRegression(_) => Algorithm::LogisticRegression,
            Self::RandomForest(_) => Algorithm::RandomForest,
            #[cfg(feature = "gradient-boosting")]
            Self::GradientBoosting(_) => Algorithm::GradientBoosting,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::LogisticRegression(m) => m,
            Self::RandomForest(m) => m,
            #[cfg(feature = "gradient-boosting")]
            Self::GradientBoosting(m) => m,
        }
    }
}

impl Classifier for FittedClassifier {
    fn predict_proba(&self, row: &SparseVector) -> f64 {
        self.inner().predict_proba(row)
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn is_well_formed(&self) -> bool {
        self.inner().is_well_formed()
    }
}

/// Shared preconditions for every `fit`.
fn check_training_input(rows: &[SparseVector], labels: &[Label], n_features: usize) -> Result<()> {
    if rows.is_empty() {
        return Err(LearningError::InvalidData(
            "cannot fit a classifier on zero rows".to_string(),
        ));
    }
    if rows.len() != labels.len() {
        return Err(LearningError::InvalidData(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }
    if n_features == 0 {
        return Err(LearningError::InvalidData(
            "cannot fit a classifier on zero features".to_string(),
        ));
    }
    if let Some(row) = rows.iter().find(|row| row.dim() != n_features) {
        return Err(LearningError::InvalidData(format!(
            "row has dimension {}, expected {n_features}",
            row.dim()
        )));
    }
    Ok(())
}
