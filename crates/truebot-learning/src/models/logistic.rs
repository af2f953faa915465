//! L2-regularized logistic regression.
//!
//! Minimizes
//!
//! ```text
//! C * sum_i logloss(y_i, w.x_i + b) + 0.5 * |w|^2
//! ```
//!
//! with an unpenalized intercept, by truncated Newton on the objective
//! divided by `C * n`: each outer step solves the Newton system with
//! conjugate gradients over Hessian-vector products, to a relative accuracy of
//! `min(0.5, sqrt(|g|))`, then backtracks until the Armijo condition holds.
//! This is the primal solver liblinear uses for L2R logistic regression.
//! Iteration stops once the largest gradient component falls below the
//! tolerance.

use super::{Classifier, check_training_input};
use crate::config::TrainingConfig;
use crate::error::{LearningError, Result};
use crate::types::Label;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use truebot_processing::SparseVector;

const MAX_CG_STEPS: usize = 250;
const MAX_BACKTRACKS: usize = 30;
const ARMIJO: f64 = 1e-4;

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticParams {
    pub c: f64,
    /// Newton iterations.
    pub max_iter: usize,
    pub tolerance: f64,
}

impl From<&TrainingConfig> for LogisticParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            c: config.c,
            max_iter: config.max_iter,
            tolerance: config.tolerance,
        }
    }
}

/// A fitted logistic regression model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    /// Newton iterations taken during fitting.
    n_iter: usize,
    converged: bool,
}

impl LogisticRegression {
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        params: LogisticParams,
    ) -> Result<Self> {
        check_training_input(rows, labels, n_features)?;

        let objective = Objective::new(rows, labels, n_features, params.c);
        // Weights followed by the intercept.
        let mut theta = vec![0.0; n_features + 1];
        let mut value = objective.value(&theta);
        let mut n_iter = 0;
        let mut converged = false;

        while n_iter < params.max_iter {
            let (grad, curvature) = objective.gradient(&theta);
            if max_abs(&grad) < params.tolerance {
                converged = true;
                break;
            }

            let grad_norm = dot(&grad, &grad).sqrt();
            let forcing = grad_norm.sqrt().min(0.5) * grad_norm;
            let direction = objective.newton_direction(&grad, &curvature, forcing);
            let slope = dot(&grad, &direction);
            if !(slope < 0.0) {
                break;
            }

            let mut step = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_BACKTRACKS {
                let candidate: Vec<f64> = theta
                    .iter()
                    .zip(&direction)
                    .map(|(t, d)| t + step * d)
                    .collect();
                let candidate_value = objective.value(&candidate);
                if candidate_value <= value + ARMIJO * step * slope {
                    theta = candidate;
                    value = candidate_value;
                    accepted = true;
                    break;
                }
                step *= 0.5;
            }
            n_iter += 1;
            if !accepted {
                // No representable decrease left along the Newton direction.
                break;
            }
        }

        if !theta.iter().all(|t| t.is_finite()) {
            return Err(LearningError::TrainingFailed(
                "logistic regression diverged".to_string(),
            ));
        }

        if converged {
            debug!(
                "Logistic regression converged after {} iterations (objective {:.6})",
                n_iter, value
            );
        } else {
            warn!(
                "Logistic regression stopped after {} iterations without reaching tolerance {}",
                n_iter, params.tolerance
            );
        }

        let intercept = theta.pop().unwrap_or_default();
        Ok(Self {
            weights: theta,
            intercept,
            n_iter,
            converged,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether fitting stopped on the gradient tolerance.
    pub fn converged(&self) -> bool {
        self.converged
    }
}

/// The scaled objective over `theta = [w, b]`.
struct Objective<'a> {
    rows: &'a [SparseVector],
    targets: Vec<f64>,
    ridge: f64,
    n_features: usize,
}

impl<'a> Objective<'a> {
    fn new(rows: &'a [SparseVector], labels: &[Label], n_features: usize, c: f64) -> Self {
        Self {
            rows,
            targets: labels.iter().map(|l| l.index() as f64).collect(),
            ridge: 1.0 / (c * rows.len() as f64),
            n_features,
        }
    }

    fn margin(&self, row: &SparseVector, theta: &[f64]) -> f64 {
        row.dot(&theta[..self.n_features]) + theta[self.n_features]
    }

    fn value(&self, theta: &[f64]) -> f64 {
        let penalty = 0.5 * self.ridge * dot(&theta[..self.n_features], &theta[..self.n_features]);
        let loss: f64 = self
            .rows
            .iter()
            .zip(&self.targets)
            .map(|(row, &y)| {
                let z = self.margin(row, theta);
                softplus(z) - y * z
            })
            .sum();
        penalty + loss / self.rows.len() as f64
    }

    /// Gradient at `theta`, plus the per-row curvature weights the Hessian
    /// products need.
    fn gradient(&self, theta: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let d = self.n_features;
        let n = self.rows.len() as f64;
        let mut grad = vec![0.0; d + 1];
        for (g, w) in grad[..d].iter_mut().zip(&theta[..d]) {
            *g = self.ridge * w;
        }

        let mut curvature = Vec::with_capacity(self.rows.len());
        for (row, &y) in self.rows.iter().zip(&self.targets) {
            let p = sigmoid(self.margin(row, theta));
            let residual = (p - y) / n;
            for (idx, value) in row.iter() {
                grad[idx] += residual * value;
            }
            grad[d] += residual;
            curvature.push(p * (1.0 - p) / n);
        }
        (grad, curvature)
    }

    fn hessian_product(&self, curvature: &[f64], v: &[f64]) -> Vec<f64> {
        let d = self.n_features;
        let mut out = vec![0.0; d + 1];
        for (o, x) in out[..d].iter_mut().zip(&v[..d]) {
            *o = self.ridge * x;
        }
        for (row, &c) in self.rows.iter().zip(curvature) {
            let scaled = c * self.margin(row, v);
            for (idx, value) in row.iter() {
                out[idx] += scaled * value;
            }
            out[d] += scaled;
        }
        out
    }

    /// Approximate solution of `H x = -grad` by conjugate gradients, stopped
    /// once the residual norm drops below `tolerance`.
    fn newton_direction(&self, grad: &[f64], curvature: &[f64], tolerance: f64) -> Vec<f64> {
        let mut x = vec![0.0; grad.len()];
        let mut residual: Vec<f64> = grad.iter().map(|g| -g).collect();
        let mut search = residual.clone();
        let mut rr = dot(&residual, &residual);

        for _ in 0..MAX_CG_STEPS.min(grad.len()) {
            if rr.sqrt() <= tolerance {
                break;
            }
            let hs = self.hessian_product(curvature, &search);
            let along = dot(&search, &hs);
            if along <= f64::EPSILON * dot(&search, &search) {
                break;
            }
            let alpha = rr / along;
            for (xi, si) in x.iter_mut().zip(&search) {
                *xi += alpha * si;
            }
            for (ri, hi) in residual.iter_mut().zip(&hs) {
                *ri -= alpha * hi;
            }
            let next_rr = dot(&residual, &residual);
            let beta = next_rr / rr;
            for (si, ri) in search.iter_mut().zip(&residual) {
                *si = ri + beta * *si;
            }
            rr = next_rr;
        }

        if x.iter().all(|v| *v == 0.0) {
            // Curvature vanished before the first step; fall back to descent.
            return grad.iter().map(|g| -g).collect();
        }
        x
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, row: &SparseVector) -> f64 {
        let margin: f64 = row
            .iter()
            .filter_map(|(idx, value)| self.weights.get(idx).map(|w| w * value))
            .sum();
        sigmoid(margin + self.intercept)
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn is_well_formed(&self) -> bool {
        self.intercept.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
