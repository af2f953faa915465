//! On-disk storage for a [`TrainedModel`].
//!
//! A store directory holds exactly two JSON files:
//!
//! - `model.json`: the fitted classifier plus metadata
//! - `vectorizer.json`: the fitted TF-IDF vectorizer
//!
//! Both are staged in uniquely named temporary files in the same directory
//! and only persisted over the targets once both have been flushed, so a
//! failed write never replaces just one half of the pair.
//!
//! # Pair identity
//!
//! Each file carries the same `pair_id`, derived from the vectorizer and the
//! training timestamp. The model file also records the fingerprint of the
//! lexical resources the pair was trained on. [`ArtifactStore::load_with`]
//! refuses files from different runs and a normalizer that would featurize
//! differently than training did. Publishing and loading take a process-wide
//! lock, so readers in this process never see half of a swap; another
//! process reading mid-swap gets [`LearningError::ArtifactMismatch`].

use crate::error::{LearningError, Result};
use crate::model::TrainedModel;
use crate::models::{Classifier, FittedClassifier};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use truebot_processing::{LexicalResources, Normalizer, TfidfVectorizer};

/// Classifier file name inside a store directory.
pub const MODEL_FILE: &str = "model.json";

/// Vectorizer file name inside a store directory.
pub const VECTORIZER_FILE: &str = "vectorizer.json";

const FORMAT_VERSION: u32 = 1;

static PUBLISH_LOCK: Mutex<()> = parking_lot::const_mutex(());

#[derive(Serialize)]
struct ModelEnvelopeRef<'a> {
    format_version: u32,
    pair_id: &'a str,
    lexicon: String,
    trained_at: DateTime<Utc>,
    n_features: usize,
    classifier: &'a FittedClassifier,
}

#[derive(Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    pair_id: String,
    lexicon: String,
    trained_at: DateTime<Utc>,
    n_features: usize,
    classifier: FittedClassifier,
}

#[derive(Serialize)]
struct VectorizerEnvelopeRef<'a> {
    format_version: u32,
    pair_id: &'a str,
    vectorizer: &'a TfidfVectorizer,
}

#[derive(Deserialize)]
struct VectorizerEnvelope {
    format_version: u32,
    pair_id: String,
    vectorizer: TfidfVectorizer,
}

/// A directory holding one persisted (vectorizer, classifier) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    /// Whether both files are present.
    pub fn exists(&self) -> bool {
        self.model_path().is_file() && self.vectorizer_path().is_file()
    }

    /// Write `model` into the store, replacing any previous pair.
    ///
    /// The directory is created if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::Json`] if serialization fails or
    /// [`LearningError::Io`] if the directory or files cannot be written.
    pub fn persist(&self, model: &TrainedModel) -> Result<()> {
        let vectorizer = model.vectorizer();
        let pair_id = pair_id(&serde_json::to_vec(vectorizer)?, model.trained_at());

        let model_json = serde_json::to_vec(&ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            pair_id: &pair_id,
            lexicon: lexicon_id(model.normalizer().resources()),
            trained_at: model.trained_at(),
            n_features: model.classifier().n_features(),
            classifier: model.classifier(),
        })?;
        let vectorizer_json = serde_json::to_vec(&VectorizerEnvelopeRef {
            format_version: FORMAT_VERSION,
            pair_id: &pair_id,
            vectorizer,
        })?;

        fs::create_dir_all(&self.dir)?;

        // An unpersisted temp file is deleted on drop.
        let model_tmp = self.stage(&model_json)?;
        let vectorizer_tmp = self.stage(&vectorizer_json)?;
        {
            let _publishing = PUBLISH_LOCK.lock();
            vectorizer_tmp
                .persist(self.vectorizer_path())
                .map_err(|e| e.error)?;
            model_tmp.persist(self.model_path()).map_err(|e| e.error)?;
        }

        info!(
            "Persisted {} model ({} features, pair {}) to {}",
            model.algorithm(),
            vectorizer.dimension(),
            pair_id,
            self.dir.display()
        );
        Ok(())
    }

    /// Read the pair back, serving with the embedded lexical resources.
    ///
    /// # Errors
    ///
    /// - [`LearningError::ArtifactNotFound`] if either file is missing
    /// - [`LearningError::ArtifactMismatch`] if the files are from an
    ///   unsupported format, do not belong together, or were trained with
    ///   other lexical resources
    /// - [`LearningError::Json`] if a file is not valid JSON for its type
    pub fn load(&self) -> Result<TrainedModel> {
        self.load_with(Normalizer::new())
    }

    /// Read the pair back, serving with `normalizer`.
    ///
    /// `normalizer` must use the same lexical resources the pair was trained
    /// with. Errors as for [`load`](Self::load).
    pub fn load_with(&self, normalizer: Normalizer) -> Result<TrainedModel> {
        let (model_bytes, vectorizer_bytes) = {
            let _publishing = PUBLISH_LOCK.lock();
            (
                read_artifact(&self.model_path())?,
                read_artifact(&self.vectorizer_path())?,
            )
        };

        let envelope: ModelEnvelope = serde_json::from_slice(&model_bytes)?;
        check_version(envelope.format_version, &self.model_path())?;
        if envelope.n_features != envelope.classifier.n_features() {
            return Err(LearningError::ArtifactMismatch(format!(
                "model header declares {} features but the classifier has {}",
                envelope.n_features,
                envelope.classifier.n_features()
            )));
        }
        if !envelope.classifier.is_well_formed() {
            return Err(LearningError::ArtifactMismatch(format!(
                "{} classifier in {} is malformed",
                envelope.classifier.algorithm(),
                self.model_path().display()
            )));
        }

        let stored: VectorizerEnvelope = serde_json::from_slice(&vectorizer_bytes)?;
        check_version(stored.format_version, &self.vectorizer_path())?;
        if stored.pair_id != envelope.pair_id {
            return Err(LearningError::ArtifactMismatch(format!(
                "{} belongs to pair {} but {} belongs to pair {}",
                MODEL_FILE, envelope.pair_id, VECTORIZER_FILE, stored.pair_id
            )));
        }
        if !stored.vectorizer.is_consistent() {
            return Err(LearningError::ArtifactMismatch(format!(
                "vectorizer in {} is inconsistent",
                self.vectorizer_path().display()
            )));
        }

        let serving = lexicon_id(normalizer.resources());
        if envelope.lexicon != serving {
            return Err(LearningError::ArtifactMismatch(format!(
                "pair was trained with lexicon {} but the normalizer uses {}",
                envelope.lexicon, serving
            )));
        }

        debug!(
            "Loaded {} model trained at {} (pair {}) from {}",
            envelope.classifier.algorithm(),
            envelope.trained_at,
            envelope.pair_id,
            self.dir.display()
        );
        TrainedModel::from_parts(
            stored.vectorizer,
            envelope.classifier,
            envelope.trained_at,
            normalizer,
        )
    }

    fn stage(&self, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        Ok(file)
    }
}

fn pair_id(vectorizer_json: &[u8], trained_at: DateTime<Utc>) -> String {
    let mut seed = Vec::with_capacity(vectorizer_json.len() + 40);
    seed.extend_from_slice(vectorizer_json);
    seed.extend_from_slice(trained_at.to_rfc3339().as_bytes());
    format!("{:016x}", twox_hash::xxh3::hash64(&seed))
}

fn lexicon_id(resources: &LexicalResources) -> String {
    format!("{:016x}", resources.fingerprint())
}

fn check_version(version: u32, path: &Path) -> Result<()> {
    if version == FORMAT_VERSION {
        Ok(())
    } else {
        Err(LearningError::ArtifactMismatch(format!(
            "unsupported format version {version} in {} (expected {FORMAT_VERSION})",
            path.display()
        )))
    }
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LearningError::ArtifactNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}
