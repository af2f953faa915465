//! Random forest of Gini trees.
//!
//! Each tree is grown on a bootstrap sample (rows drawn with replacement,
//! duplicates carried as weights) and examines `floor(sqrt(n_features))`
//! non-constant features per split. Trees are grown until leaves are pure or
//! hold a single distinct row. The forest probability is the mean of the leaf
//! class frequencies.

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

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub min_samples_split: usize,
    pub random_seed: u64,
}

impl From<&TrainingConfig> for ForestParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            min_samples_split: config.min_samples_split,
            random_seed: config.random_seed,
        }
    }
}

/// Weighted class counts `[fake, real]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ClassWeights([f64; 2]);

impl ClassWeights {
    fn total(&self) -> f64 {
        self.0[0] + self.0[1]
    }
}

impl Add for ClassWeights {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        ClassWeights([self.0[0] + other.0[0], self.0[1] + other.0[1]])
    }
}

impl Sub for ClassWeights {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        ClassWeights([self.0[0] - other.0[0], self.0[1] - other.0[1]])
    }
}

struct Gini;

impl SplitCriterion for Gini {
    type Stats = ClassWeights;

    // Negative weighted impurity: -(W * gini) = sum(w_k^2) / W - W.
    fn score(&self, stats: &ClassWeights) -> f64 {
        let total = stats.total();
        if total <= 0.0 {
            return 0.0;
        }
        (stats.0[0] * stats.0[0] + stats.0[1] * stats.0[1]) / total - total
    }

    fn leaf_value(&self, stats: &ClassWeights) -> f64 {
        let total = stats.total();
        if total <= 0.0 { 0.5 } else { stats.0[1] / total }
    }

    fn is_terminal(&self, stats: &ClassWeights) -> bool {
        stats.0[0] <= 0.0 || stats.0[1] <= 0.0
    }

    fn accepts(&self, _gain: f64) -> bool {
        true
    }
}

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        params: ForestParams,
    ) -> Result<Self> {
        check_training_input(rows, labels, n_features)?;

        let n = rows.len();
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let tree_params = TreeParams {
            max_depth: None,
            min_samples_split: params.min_samples_split,
            max_features: Some(max_features),
        };

        let mut rng = StdRng::seed_from_u64(params.random_seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut weights = vec![ClassWeights::default(); n];

        for _ in 0..params.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.r#gen());

            let mut counts = vec![0u32; n];
            for _ in 0..n {
                counts[tree_rng.gen_range(0..n)] += 1;
            }

            let mut sample = Vec::with_capacity(n);
            for (row, &count) in counts.iter().enumerate() {
                let mut w = [0.0; 2];
                w[labels[row].index()] = f64::from(count);
                weights[row] = ClassWeights(w);
                if count > 0 {
                    sample.push(row);
                }
            }

            trees.push(DecisionTree::grow(
                rows,
                &weights,
                sample,
                &Gini,
                tree_params,
                &mut tree_rng,
            ));
        }

        debug!(
            "Random forest: {} trees, {} features per split, mean {:.1} nodes",
            trees.len(),
            max_features,
            trees.iter().map(DecisionTree::node_count).sum::<usize>() as f64
                / trees.len().max(1) as f64
        );

        Ok(Self { n_features, trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, row: &SparseVector) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn is_well_formed(&self) -> bool {
        !self.trees.is_empty()
            && self.trees.iter().all(|tree| {
                tree.is_well_formed()
                    && tree.max_feature().is_none_or(|f| f < self.n_features)
            })
    }
}
