//! Candidate model families, in selection priority order.
//!
//! The registry is populated from compiled features: without the
//! `gradient-boosting` feature the boosted-tree family is simply absent, and
//! a warning says so once per process.

use crate::config::{Algorithm, TrainingConfig};
use crate::error::{LearningError, Result};
use std::sync::Once;
use tracing::warn;

static MISSING_FAMILY_WARNING: Once = Once::new();

/// Ordered list of families a pipeline trains and compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRegistry {
    candidates: Vec<Algorithm>,
}

impl CandidateRegistry {
    /// Every compiled-in family, in priority order.
    pub fn available() -> Self {
        let candidates: Vec<Algorithm> = Algorithm::ALL
            .into_iter()
            .filter(|algo| is_compiled(*algo))
            .collect();

        let missing: Vec<&str> = Algorithm::ALL
            .into_iter()
            .filter(|algo| !is_compiled(*algo))
            .map(|algo| algo.as_str())
            .collect();
        if !missing.is_empty() {
            MISSING_FAMILY_WARNING.call_once(|| {
                warn!(
                    "Candidate families not compiled in, skipping: {}",
                    missing.join(", ")
                );
            });
        }

        Self { candidates }
    }

    /// Registry for `config`: a single family when `config.algorithm` is set,
    /// otherwise every compiled-in family.
    ///
    /// # Errors
    ///
    /// [`LearningError::InvalidConfig`] if the requested family is not
    /// compiled in.
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        let available = Self::available();
        match config.algorithm {
            None => Ok(available),
            Some(algo) if available.contains(algo) => Ok(Self {
                candidates: vec![algo],
            }),
            Some(algo) => Err(LearningError::InvalidConfig(format!(
                "algorithm '{algo}' is not available in this build"
            ))),
        }
    }

    pub fn candidates(&self) -> &[Algorithm] {
        &self.candidates
    }

    pub fn contains(&self, algorithm: Algorithm) -> bool {
        self.candidates.contains(&algorithm)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

fn is_compiled(algorithm: Algorithm) -> bool {
    match algorithm {
        Algorithm::LogisticRegression | Algorithm::RandomForest => true,
        Algorithm::GradientBoosting => cfg!(feature = "gradient-boosting"),
    }
}
