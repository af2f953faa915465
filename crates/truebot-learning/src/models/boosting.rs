//! Gradient-boosted trees with logistic loss.
//!
//! Each round fits a depth-limited regression tree to the first and second
//! derivatives of the log loss at the current margins, on a random row
//! subsample. Splits maximize
//!
//! ```text
//! gain = G_L^2 / (H_L + lambda) + G_R^2 / (H_R + lambda) - G^2 / (H + lambda)
//! ```
//!
//! (the constant 1/2 is dropped), each child must carry a hessian sum of at
//! least 1, and leaves hold `-G / (H + lambda)` shrunk by the learning rate.
//! The starting margin is the log-odds of the training positive rate.

use super::logistic::sigmoid;
use super::tree::{DecisionTree, SplitCriterion, TreeParams};
use super::{Classifier, check_training_input};
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::types::Label;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use tracing::debug;
use truebot_processing::SparseVector;

const MIN_CHILD_WEIGHT: f64 = 1.0;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub subsample: f64,
    pub reg_lambda: f64,
    pub random_seed: u64,
}

impl From<&TrainingConfig> for BoostingParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_rounds: config.n_estimators,
            max_depth: config.max_depth,
            learning_rate: config.learning_rate,
            subsample: config.subsample,
            reg_lambda: config.reg_lambda,
            random_seed: config.random_seed,
        }
    }
}

/// Gradient and hessian sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GradPair {
    grad: f64,
    hess: f64,
}

impl Add for GradPair {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        GradPair {
            grad: self.grad + other.grad,
            hess: self.hess + other.hess,
        }
    }
}

impl Sub for GradPair {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        GradPair {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
        }
    }
}

struct SecondOrder {
    lambda: f64,
}

impl SplitCriterion for SecondOrder {
    type Stats = GradPair;

    fn score(&self, stats: &GradPair) -> f64 {
        stats.grad * stats.grad / (stats.hess + self.lambda)
    }

    fn leaf_value(&self, stats: &GradPair) -> f64 {
        -stats.grad / (stats.hess + self.lambda)
    }

    fn valid_child(&self, stats: &GradPair) -> bool {
        stats.hess >= MIN_CHILD_WEIGHT
    }

    fn accepts(&self, gain: f64) -> bool {
        gain > 0.0
    }
}

/// A fitted boosted ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    n_features: usize,
    base_margin: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoosting {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        params: BoostingParams,
    ) -> Result<Self> {
        check_training_input(rows, labels, n_features)?;

        let n = rows.len();
        let targets: Vec<f64> = labels.iter().map(|l| l.index() as f64).collect();
        let positive_rate = (targets.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let base_margin = (positive_rate / (1.0 - positive_rate)).ln();

        let criterion = SecondOrder {
            lambda: params.reg_lambda,
        };
        let tree_params = TreeParams {
            max_depth: Some(params.max_depth),
            min_samples_split: 2,
            max_features: None,
        };

        let mut rng = StdRng::seed_from_u64(params.random_seed);
        let mut margins = vec![base_margin; n];
        let mut pairs = vec![GradPair::default(); n];
        let mut trees = Vec::with_capacity(params.n_rounds);

        for _ in 0..params.n_rounds {
            for ((pair, &margin), &y) in pairs.iter_mut().zip(&margins).zip(&targets) {
                let p = sigmoid(margin);
                *pair = GradPair {
                    grad: p - y,
                    hess: (p * (1.0 - p)).max(1e-16),
                };
            }

            let mut sample: Vec<usize> = (0..n)
                .filter(|_| rng.r#gen::<f64>() < params.subsample)
                .collect();
            if sample.is_empty() {
                sample.push(rng.gen_range(0..n));
            }

            let mut tree =
                DecisionTree::grow(rows, &pairs, sample, &criterion, tree_params, &mut rng);
            tree.scale_leaves(params.learning_rate);

            for (margin, row) in margins.iter_mut().zip(rows) {
                *margin += tree.predict(row);
            }
            trees.push(tree);
        }

        debug!(
            "Gradient boosting: {} rounds, base margin {:.4}",
            trees.len(),
            base_margin
        );

        Ok(Self {
            n_features,
            base_margin,
            trees,
        })
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for GradientBoosting {
    fn predict_proba(&self, row: &SparseVector) -> f64 {
        let margin = self.base_margin + self.trees.iter().map(|t| t.predict(row)).sum::<f64>();
        sigmoid(margin)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn is_well_formed(&self) -> bool {
        self.base_margin.is_finite()
            && self.trees.iter().all(|tree| {
                tree.is_well_formed()
                    && tree.max_feature().is_none_or(|f| f < self.n_features)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::separable_toy_data;

    fn params(n_rounds: usize) -> BoostingParams {
        BoostingParams {
            n_rounds,
            max_depth: 6,
            learning_rate: 0.1,
            subsample: 0.8,
            reg_lambda: 1.0,
            random_seed: 42,
        }
    }

    #[test]
    fn test_leaf_weight() {
        let criterion = SecondOrder { lambda: 1.0 };
        let stats = GradPair { grad: 3.0, hess: 2.0 };
        assert_eq!(criterion.leaf_value(&stats), -1.0);
        assert_eq!(criterion.score(&stats), 3.0);
        assert!(!criterion.valid_child(&GradPair { grad: 0.0, hess: 0.5 }));
    }

    #[test]
    fn test_base_margin_only_without_rounds() {
        let (rows, labels, dim) = separable_toy_data();
        let model = GradientBoosting::fit(&rows, &labels, dim, params(0)).unwrap();
        let real_rate =
            labels.iter().filter(|l| **l == Label::Real).count() as f64 / labels.len() as f64;
        assert!((model.predict_proba(&rows[0]) - real_rate).abs() < 1e-9);
    }

    #[test]
    fn test_boosting_separates_toy_data() {
        let (rows, labels, dim) = separable_toy_data();
        let model = GradientBoosting::fit(&rows, &labels, dim, params(50)).unwrap();
        assert_eq!(model.n_rounds(), 50);
        assert!(model.is_well_formed());

        for (row, label) in rows.iter().zip(&labels) {
            assert_eq!(model.predict(row), *label);
        }
    }
}
