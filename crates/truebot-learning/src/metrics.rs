//! Classification metrics.
//!
//! [`accuracy`] drives model selection; [`ClassificationReport`] is the
//! per-class breakdown logged for every candidate. Undefined ratios (no
//! predicted or no actual rows of a class) are reported as `0.0`.

use crate::types::Label;
use serde::{Deserialize, Serialize};

/// Fraction of positions where `predicted` equals `actual`.
///
/// Empty input scores `0.0`.
pub fn accuracy(actual: &[Label], predicted: &[Label]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual
        .iter()
        .zip(predicted)
        .filter(|(a, p)| a == p)
        .count();
    correct as f64 / actual.len() as f64
}

/// Precision, recall and F1 of one class (or an average).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class report over both labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(rename = "Fake")]
    pub fake: ClassMetrics,
    #[serde(rename = "Real")]
    pub real: ClassMetrics,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn compute(actual: &[Label], predicted: &[Label]) -> Self {
        let fake = class_metrics(actual, predicted, Label::Fake);
        let real = class_metrics(actual, predicted, Label::Real);
        let support = fake.support + real.support;

        let macro_avg = ClassMetrics {
            precision: (fake.precision + real.precision) / 2.0,
            recall: (fake.recall + real.recall) / 2.0,
            f1_score: (fake.f1_score + real.f1_score) / 2.0,
            support,
        };

        let weight = |f: fn(&ClassMetrics) -> f64| {
            if support == 0 {
                0.0
            } else {
                (f(&fake) * fake.support as f64 + f(&real) * real.support as f64) / support as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1_score: weight(|m| m.f1_score),
            support,
        };

        Self {
            fake,
            real,
            accuracy: accuracy(actual, predicted),
            macro_avg,
            weighted_avg,
        }
    }
}

fn class_metrics(actual: &[Label], predicted: &[Label], class: Label) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&a, &p) in actual.iter().zip(predicted) {
        match (a == class, p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        support: tp + fn_,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
