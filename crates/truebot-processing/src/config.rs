//! Configuration types for the TF-IDF vectorizer.
//!
//! Uses the builder pattern: every setter is optional and
//! [`VectorizerConfigBuilder::build`] validates the result.
//!
//! ```
//! use truebot_processing::VectorizerConfig;
//!
//! let config = VectorizerConfig::builder()
//!     .max_features(2000)
//!     .ngram_range(1, 2)
//!     .sublinear_tf(true)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.max_features, 2000);
//! ```

use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for [`TfidfVectorizer`](crate::TfidfVectorizer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Maximum vocabulary size, chosen by global term frequency.
    /// Default: 5000
    pub max_features: usize,

    /// Smallest and largest n-gram length, inclusive.
    /// Default: (1, 2)
    pub ngram_range: (usize, usize),

    /// Replace raw term frequency with `1 + ln(tf)`.
    /// Default: true
    pub sublinear_tf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
            sublinear_tf: true,
        }
    }
}

impl VectorizerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> VectorizerConfigBuilder {
        VectorizerConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(ProcessingError::InvalidConfig(
                "max_features must be at least 1".to_string(),
            ));
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ProcessingError::InvalidConfig(format!(
                "ngram_range ({min_n}, {max_n}) must satisfy 1 <= min <= max"
            )));
        }

        Ok(())
    }
}

/// Builder for [`VectorizerConfig`].
#[derive(Debug, Default)]
pub struct VectorizerConfigBuilder {
    max_features: Option<usize>,
    ngram_range: Option<(usize, usize)>,
    sublinear_tf: Option<bool>,
}

impl VectorizerConfigBuilder {
    /// Set the maximum vocabulary size.
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set the n-gram range (inclusive on both ends).
    pub fn ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = Some((min_n, max_n));
        self
    }

    /// Enable or disable log-dampened term frequency.
    pub fn sublinear_tf(mut self, enable: bool) -> Self {
        self.sublinear_tf = Some(enable);
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessingError::InvalidConfig`] if `max_features` is zero or
    /// the n-gram range is empty.
    pub fn build(self) -> Result<VectorizerConfig> {
        let defaults = VectorizerConfig::default();
        let config = VectorizerConfig {
            max_features: self.max_features.unwrap_or(defaults.max_features),
            ngram_range: self.ngram_range.unwrap_or(defaults.ngram_range),
            sublinear_tf: self.sublinear_tf.unwrap_or(defaults.sublinear_tf),
        };

        config.validate()?;
        Ok(config)
    }
}
