//! Common types used throughout the truebot-learning crate.
//!
//! # Overview
//!
//! - [`Label`]: The two classes, `Real` and `Fake`
//! - [`TrainingResult`]: Complete result from [`Pipeline::train()`](crate::Pipeline::train)
//! - [`ModelComparison`]: Scores of one evaluated candidate
//! - [`PredictionResult`]: Result from [`predict_label()`](crate::predict_label)

use crate::metrics::ClassificationReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The class of a news passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Fake,
    Real,
}

impl Label {
    /// Binarize a raw label: case-insensitive `"real"` is [`Label::Real`],
    /// anything else is [`Label::Fake`].
    ///
    /// ```
    /// use truebot_learning::Label;
    ///
    /// assert_eq!(Label::from_raw("REAL"), Label::Real);
    /// assert_eq!(Label::from_raw(" Real "), Label::Real);
    /// assert_eq!(Label::from_raw("FAKE"), Label::Fake);
    /// assert_eq!(Label::from_raw("satire"), Label::Fake);
    /// ```
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("real") {
            Label::Real
        } else {
            Label::Fake
        }
    }

    /// Class index used by the classifiers: `Fake = 0`, `Real = 1`.
    pub fn index(self) -> usize {
        match self {
            Label::Fake => 0,
            Label::Real => 1,
        }
    }

    /// Decision rule on the probability of the real class.
    pub fn from_probability(probability_real: f64) -> Self {
        if probability_real >= 0.5 {
            Label::Real
        } else {
            Label::Fake
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Fake => "Fake",
            Label::Real => "Real",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class.
    pub label: Label,

    /// Probability of the predicted class, as a percentage in `[0, 100]`
    /// rounded to two decimals.
    pub confidence: f64,

    /// Raw model probability of the real class.
    #[serde(skip_serializing)]
    #[serde(default)]
    pub probability_real: f64,
}

impl PredictionResult {
    /// Apply the decision rule to `probability_real`.
    pub fn from_probability(probability_real: f64) -> Self {
        let probability_real = probability_real.clamp(0.0, 1.0);
        let label = Label::from_probability(probability_real);
        let top = probability_real.max(1.0 - probability_real);
        Self {
            label,
            confidence: (top * 100.0 * 100.0).round() / 100.0,
            probability_real,
        }
    }
}

/// Result of a training pipeline run.
///
/// Returned by [`Pipeline::train()`](crate::Pipeline::train) next to the
/// selected [`TrainedModel`](crate::TrainedModel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TrainingResult {
    /// Candidate id of the selected model (e.g. `"log_reg"`).
    pub best_model_name: String,

    /// Test accuracy of each candidate that fitted, keyed by candidate id.
    pub scores: BTreeMap<String, f64>,

    /// Comparison of all evaluated candidates, in priority order.
    pub model_comparison: Vec<ModelComparison>,

    /// Rows used for fitting and for scoring.
    pub train_rows: usize,
    pub test_rows: usize,

    /// Total wall-clock training time in seconds.
    pub training_time_seconds: f64,

    /// Non-fatal issues, such as a candidate that failed to fit.
    pub warnings: Vec<String>,
}

/// Scores of a single evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ModelComparison {
    /// Candidate id.
    pub name: String,

    /// Accuracy on the held-out partition. This is the selection metric.
    pub test_score: f64,

    /// Accuracy on the training partition.
    pub train_score: f64,

    /// Per-class precision, recall and F1 on the held-out partition.
    pub report: ClassificationReport,

    /// Time taken to fit the vectorizer and classifier, in seconds.
    pub training_time_seconds: f64,
}
