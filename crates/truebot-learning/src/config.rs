//! Configuration types for the training pipeline.
//!
//! This module provides [`TrainingConfig`] and its builder, as well as the
//! [`Algorithm`] enum naming the candidate classifier families.
//!
//! # Example
//!
//! ```
//! use truebot_learning::{Algorithm, TrainingConfig};
//!
//! let config = TrainingConfig::builder()
//!     .test_size(0.2)
//!     .random_seed(42)
//!     .n_estimators(100)
//!     .algorithm(Algorithm::RandomForest)
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{LearningError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use truebot_processing::VectorizerConfig;

/// A candidate classifier family.
///
/// The declaration order is the selection priority: when two candidates score
/// the same accuracy, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    /// L2-regularized logistic regression.
    #[serde(rename = "log_reg")]
    LogisticRegression,

    /// Bagged Gini decision trees.
    #[serde(rename = "random_forest")]
    RandomForest,

    /// Second-order gradient-boosted trees. Only trainable when the
    /// `gradient-boosting` feature is compiled in. Also accepts the legacy
    /// id `xgboost` on input.
    #[serde(rename = "gradient_boosting", alias = "xgboost")]
    GradientBoosting,
}

impl Algorithm {
    /// Every family in priority order, whether or not it is compiled in.
    pub const ALL: [Algorithm; 3] = [
        Algorithm::LogisticRegression,
        Algorithm::RandomForest,
        Algorithm::GradientBoosting,
    ];

    /// Candidate id used in score maps and artifacts.
    ///
    /// ```
    /// use truebot_learning::Algorithm;
    ///
    /// assert_eq!(Algorithm::LogisticRegression.as_str(), "log_reg");
    /// assert_eq!(Algorithm::RandomForest.as_str(), "random_forest");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::LogisticRegression => "log_reg",
            Algorithm::RandomForest => "random_forest",
            Algorithm::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score key the boosted candidate had in earlier trainers.
const LEGACY_BOOSTING_ID: &str = "xgboost";

impl FromStr for Algorithm {
    type Err = LearningError;

    fn from_str(s: &str) -> Result<Self> {
        if s == LEGACY_BOOSTING_ID {
            return Ok(Algorithm::GradientBoosting);
        }
        Algorithm::ALL
            .into_iter()
            .find(|algo| algo.as_str() == s)
            .ok_or_else(|| {
                LearningError::InvalidConfig(format!(
                    "unknown algorithm '{s}', expected one of: log_reg, random_forest, gradient_boosting"
                ))
            })
    }
}

/// Configuration for the training pipeline.
///
/// Use [`TrainingConfig::builder()`] to construct a configuration with the
/// builder pattern. Every field has a default matching the production model.
///
/// # Validation
///
/// The builder validates the following constraints on [`build()`](TrainingConfigBuilder::build):
/// - `test_size` must be in range `(0.0, 1.0)` (exclusive)
/// - the vectorizer settings must validate
/// - `c`, `tolerance` and `learning_rate` must be positive
/// - `max_iter`, `n_estimators` and `max_depth` must be at least 1
/// - `min_samples_split` must be at least 2
/// - `subsample` must be in range `(0.0, 1.0]`
/// - `reg_lambda` must not be negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for scoring (default: 0.2).
    pub test_size: f64,

    /// Seed for the split and every randomized model (default: 42).
    pub random_seed: u64,

    /// TF-IDF settings used for every candidate.
    pub vectorizer: VectorizerConfig,

    /// Train only this family (if `None`, every registered family competes).
    pub algorithm: Option<Algorithm>,

    /// Inverse regularization strength for logistic regression (default: 1.0).
    pub c: f64,

    /// Maximum gradient steps for logistic regression (default: 1000).
    pub max_iter: usize,

    /// Gradient max-norm below which logistic regression stops (default: 1e-4).
    pub tolerance: f64,

    /// Trees in the forest and boosting rounds (default: 200).
    pub n_estimators: usize,

    /// Depth limit of boosted trees (default: 6). Forest trees are unbounded.
    pub max_depth: usize,

    /// Minimum samples a forest node needs to be split (default: 2).
    pub min_samples_split: usize,

    /// Boosting shrinkage (default: 0.1).
    pub learning_rate: f64,

    /// Fraction of rows sampled per boosting round (default: 0.8).
    pub subsample: f64,

    /// L2 penalty on boosted leaf weights (default: 1.0).
    pub reg_lambda: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: 42,
            vectorizer: VectorizerConfig::default(),
            algorithm: None,
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            n_estimators: 200,
            max_depth: 6,
            min_samples_split: 2,
            learning_rate: 0.1,
            subsample: 0.8,
            reg_lambda: 1.0,
        }
    }
}

impl TrainingConfig {
    /// Create a new builder for `TrainingConfig`.
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }

    /// Check every constraint listed on the type.
    pub fn validate(&self) -> Result<()> {
        if self.test_size <= 0.0 || self.test_size >= 1.0 || self.test_size.is_nan() {
            return invalid("test_size must be between 0.0 and 1.0 (exclusive)");
        }

        self.vectorizer
            .validate()
            .map_err(|e| LearningError::InvalidConfig(e.to_string()))?;

        if !(self.c > 0.0) {
            return invalid("c must be positive");
        }
        if self.max_iter == 0 {
            return invalid("max_iter must be at least 1");
        }
        if !(self.tolerance > 0.0) {
            return invalid("tolerance must be positive");
        }
        if self.n_estimators == 0 {
            return invalid("n_estimators must be at least 1");
        }
        if self.max_depth == 0 {
            return invalid("max_depth must be at least 1");
        }
        if self.min_samples_split < 2 {
            return invalid("min_samples_split must be at least 2");
        }
        if !(self.learning_rate > 0.0) {
            return invalid("learning_rate must be positive");
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return invalid("subsample must be in (0.0, 1.0]");
        }
        if !(self.reg_lambda >= 0.0) {
            return invalid("reg_lambda must not be negative");
        }

        Ok(())
    }
}

fn invalid(message: &str) -> Result<()> {
    Err(LearningError::InvalidConfig(message.to_string()))
}

/// Builder for [`TrainingConfig`].
///
/// Created via [`TrainingConfig::builder()`]. All setters return `self` to
/// allow method chaining.
#[derive(Debug, Clone, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Set the test size fraction (default: 0.2).
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the random seed for reproducibility (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Replace the vectorizer settings.
    #[must_use]
    pub fn vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.config.vectorizer = vectorizer;
        self
    }

    /// Set the vocabulary cap (default: 5000).
    #[must_use]
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.config.vectorizer.max_features = max_features;
        self
    }

    /// Train a single family instead of running selection.
    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = Some(algorithm);
        self
    }

    /// Set the logistic regression inverse regularization strength (default: 1.0).
    #[must_use]
    pub fn c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set the logistic regression iteration cap (default: 1000).
    #[must_use]
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.config.max_iter = max_iter;
        self
    }

    /// Set the logistic regression stopping tolerance (default: 1e-4).
    #[must_use]
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the number of forest trees and boosting rounds (default: 200).
    #[must_use]
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    /// Set the boosted tree depth limit (default: 6).
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the minimum node size for forest splits (default: 2).
    #[must_use]
    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    /// Set the boosting learning rate (default: 0.1).
    #[must_use]
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.learning_rate = rate;
        self
    }

    /// Set the boosting row subsample fraction (default: 0.8).
    #[must_use]
    pub fn subsample(mut self, fraction: f64) -> Self {
        self.config.subsample = fraction;
        self
    }

    /// Set the boosting leaf L2 penalty (default: 1.0).
    #[must_use]
    pub fn reg_lambda(mut self, lambda: f64) -> Self {
        self.config.reg_lambda = lambda;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if any constraint listed on
    /// [`TrainingConfig`] is violated.
    pub fn build(self) -> Result<TrainingConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
