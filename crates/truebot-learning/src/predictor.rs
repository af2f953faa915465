//! Cached inference entry point.
//!
//! [`predict_label`] classifies one document against the pair stored in an
//! artifact directory. The pair is loaded at most once per directory and
//! process through [`ModelCache::global`]; when no artifacts exist yet, the
//! first caller trains on the canonical corpus and persists the result.
//!
//! # Concurrency
//!
//! Each directory owns a slot holding a `OnceCell`, keyed by its canonical
//! path once it exists and its absolute path before, so aliases such as
//! `model` and `./model` share a slot. The map lock is only held
//! while fetching the slot, so callers for different directories never wait
//! on each other, and concurrent first callers for the same directory block
//! on a single load/train. A failed initialization leaves the slot empty and
//! the next caller retries.

use crate::artifacts::ArtifactStore;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::model::TrainedModel;
use crate::pipeline::train_and_persist;
use crate::types::PredictionResult;
use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Env var overriding the artifact directory.
pub const MODEL_DIR_ENV: &str = "TRUEBOT_MODEL_DIR";

/// Env var overriding the canonical training corpus.
pub const DATA_PATH_ENV: &str = "TRUEBOT_DATA_PATH";

pub const DEFAULT_MODEL_DIR: &str = "model";
pub const DEFAULT_DATA_PATH: &str = "data/news.csv";

static GLOBAL_CACHE: Lazy<ModelCache> = Lazy::new(|| ModelCache::new(TrainingConfig::default()));

static_assertions::assert_impl_all!(ModelCache: Send, Sync);

/// Where a pair lives and which corpus rebuilds it when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocator {
    pub model_dir: PathBuf,
    pub dataset_path: PathBuf,
}

impl ArtifactLocator {
    pub fn new(model_dir: impl AsRef<Path>, dataset_path: impl AsRef<Path>) -> Self {
        Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            dataset_path: dataset_path.as_ref().to_path_buf(),
        }
    }

    /// Locations from `TRUEBOT_MODEL_DIR` / `TRUEBOT_DATA_PATH`, falling back
    /// to `model` and `data/news.csv`.
    pub fn from_env() -> Self {
        let model_dir =
            std::env::var(MODEL_DIR_ENV).unwrap_or_else(|_| DEFAULT_MODEL_DIR.to_string());
        let dataset_path =
            std::env::var(DATA_PATH_ENV).unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
        Self::new(model_dir, dataset_path)
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.model_dir)
    }
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR, DEFAULT_DATA_PATH)
    }
}

type Slot = Arc<OnceCell<Arc<TrainedModel>>>;

/// Artifact directory → once-initialized model.
#[derive(Debug)]
pub struct ModelCache {
    config: TrainingConfig,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl ModelCache {
    /// An empty cache that trains with `config` when artifacts are missing.
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide cache used by [`predict_label`].
    pub fn global() -> &'static ModelCache {
        &GLOBAL_CACHE
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// The model for `locator`, loading or training it on first use.
    ///
    /// # Errors
    ///
    /// Any load error other than a missing artifact, or any training error
    /// when artifacts had to be rebuilt. Nothing is cached on error.
    pub fn get_or_load(&self, locator: &ArtifactLocator) -> Result<Arc<TrainedModel>> {
        let slot = self.slot(&locator.model_dir);
        let model = slot.get_or_try_init(|| self.initialize(locator).map(Arc::new))?;
        Ok(Arc::clone(model))
    }

    /// Classify `text` with the model for `locator`.
    pub fn predict(&self, text: &str, locator: &ArtifactLocator) -> Result<PredictionResult> {
        let model = self.get_or_load(locator)?;
        let prediction = model.predict(text);
        debug!(
            "Predicted {} ({:.2}%) with {}",
            prediction.label,
            prediction.confidence,
            model.algorithm()
        );
        Ok(prediction)
    }

    /// Whether a model for `model_dir` is already initialized.
    pub fn is_loaded(&self, model_dir: impl AsRef<Path>) -> bool {
        self.slots
            .lock()
            .get(&cache_key(model_dir.as_ref()))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Drop the cached model for `model_dir`; the next call reloads it.
    pub fn invalidate(&self, model_dir: impl AsRef<Path>) -> bool {
        self.slots
            .lock()
            .remove(&cache_key(model_dir.as_ref()))
            .is_some()
    }

    /// Number of directories with a slot.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn slot(&self, model_dir: &Path) -> Slot {
        let key = cache_key(model_dir);
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key).or_default())
    }

    fn initialize(&self, locator: &ArtifactLocator) -> Result<TrainedModel> {
        let store = locator.store();
        match store.load() {
            Ok(model) => {
                info!(
                    "Loaded {} model from {}",
                    model.algorithm(),
                    store.dir().display()
                );
                Ok(model)
            }
            Err(e) if e.is_recoverable() => {
                info!(
                    "{}; training from {}",
                    e,
                    locator.dataset_path.display()
                );
                let dataset = Dataset::from_csv(&locator.dataset_path)?;
                let (model, result) = train_and_persist(&dataset, &store, &self.config)?;
                info!(
                    "Trained {} in {:.2}s",
                    result.best_model_name, result.training_time_seconds
                );
                Ok(model)
            }
            Err(e) => Err(e),
        }
    }
}

fn cache_key(model_dir: &Path) -> PathBuf {
    fs::canonicalize(model_dir)
        .or_else(|_| std::path::absolute(model_dir))
        .unwrap_or_else(|_| model_dir.to_path_buf())
}

/// Classify `text` with the process-wide cache.
///
/// # Example
///
/// ```rust,ignore
/// use truebot_learning::{ArtifactLocator, predict_label};
///
/// let result = predict_label("The ministry confirmed the budget.", &ArtifactLocator::from_env())?;
/// println!("{} {:.2}", result.label, result.confidence);
/// ```
pub fn predict_label(text: &str, locator: &ArtifactLocator) -> Result<PredictionResult> {
    ModelCache::global().predict(text, locator)
}
