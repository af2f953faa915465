//! Training pipeline implementation.
//!
//! This module provides the [`Pipeline`] struct and its builder. The pipeline
//! turns a labeled [`Dataset`] into a [`TrainedModel`] by fitting every
//! candidate family and keeping the most accurate one.
//!
//! # Overview
//!
//! The training pipeline executes these stages in order:
//!
//! 1. **Normalization** - Clean, filter and lemmatize every document
//! 2. **Split** - Seeded stratified train/test partition
//! 3. **Vectorization** - Fit TF-IDF on the training partition only
//! 4. **Candidates** - Fit each registered family, score it on the test partition
//! 5. **Selection** - Highest test accuracy wins; ties go to the earlier family
//!
//! # Example
//!
//! ```rust,ignore
//! use truebot_learning::{Dataset, Pipeline, TrainingConfig};
//!
//! let dataset = Dataset::from_csv("data/news.csv")?;
//! let pipeline = Pipeline::builder()
//!     .config(TrainingConfig::default())
//!     .build()?;
//!
//! let (model, result) = pipeline.train(&dataset)?;
//! println!("Best model: {} {:?}", result.best_model_name, result.scores);
//! ```

use crate::artifacts::ArtifactStore;
use crate::config::{Algorithm, TrainingConfig};
use crate::dataset::Dataset;
use crate::error::{LearningError, Result};
use crate::metrics::{ClassificationReport, accuracy};
use crate::model::TrainedModel;
use crate::models::{Classifier, FittedClassifier};
use crate::registry::CandidateRegistry;
use crate::split::stratified_split;
use crate::types::{Label, ModelComparison, TrainingResult};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use truebot_processing::{Normalizer, SparseVector, TfidfVectorizer};

/// The training pipeline.
///
/// Use [`Pipeline::builder()`] to construct a pipeline with the builder pattern.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: TrainingConfig,
    registry: CandidateRegistry,
    normalizer: Normalizer,
}

struct Candidate {
    classifier: FittedClassifier,
    comparison: ModelComparison,
}

impl Pipeline {
    /// Create a new builder for `Pipeline`.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Fit every candidate on `dataset` and return the best pair.
    ///
    /// # Errors
    ///
    /// - [`LearningError::EmptyCorpus`] if the dataset has no rows
    /// - [`LearningError::InvalidData`] if the labels cannot be stratified
    /// - [`LearningError::Processing`] if the training partition yields no terms
    /// - [`LearningError::TrainingFailed`] if no candidate could be fitted
    pub fn train(&self, dataset: &Dataset) -> Result<(TrainedModel, TrainingResult)> {
        let started = Instant::now();
        if dataset.is_empty() {
            return Err(LearningError::EmptyCorpus);
        }

        info!(
            "Training on {} rows with candidates: {:?}",
            dataset.len(),
            self.registry
                .candidates()
                .iter()
                .map(Algorithm::as_str)
                .collect::<Vec<_>>()
        );

        let documents = self.normalizer.normalize_corpus(dataset.texts());
        let labels = dataset.labels();

        let split = stratified_split(labels, self.config.test_size, self.config.random_seed)?;
        let train_docs: Vec<&str> = split.train.iter().map(|&i| documents[i].as_str()).collect();
        let test_docs: Vec<&str> = split.test.iter().map(|&i| documents[i].as_str()).collect();
        let train_labels: Vec<Label> = split.train.iter().map(|&i| labels[i]).collect();
        let test_labels: Vec<Label> = split.test.iter().map(|&i| labels[i]).collect();

        // Fitting is deterministic, so every candidate shares one fitted vocabulary.
        let vectorize_started = Instant::now();
        let (vectorizer, train_rows) =
            TfidfVectorizer::fit_transform(&train_docs, self.config.vectorizer.clone())?;
        let test_rows = vectorizer.transform(&test_docs);
        let vectorize_seconds = vectorize_started.elapsed().as_secs_f64();
        info!(
            "Vectorized {} train / {} test documents into {} features",
            train_rows.len(),
            test_rows.len(),
            vectorizer.dimension()
        );

        let mut warnings = Vec::new();
        let mut candidates: Vec<Candidate> = Vec::with_capacity(self.registry.len());

        for &algorithm in self.registry.candidates() {
            let fit_started = Instant::now();
            let classifier = match FittedClassifier::fit(
                algorithm,
                &train_rows,
                &train_labels,
                vectorizer.dimension(),
                &self.config,
            ) {
                Ok(classifier) => classifier,
                Err(e) => {
                    let message = format!("{algorithm} failed to fit: {e}");
                    warn!("{}", message);
                    warnings.push(message);
                    continue;
                }
            };
            let fit_seconds = fit_started.elapsed().as_secs_f64() + vectorize_seconds;

            let test_pred = predict_rows(&classifier, &test_rows);
            let train_pred = predict_rows(&classifier, &train_rows);
            let report = ClassificationReport::compute(&test_labels, &test_pred);
            let comparison = ModelComparison {
                name: algorithm.as_str().to_string(),
                test_score: accuracy(&test_labels, &test_pred),
                train_score: accuracy(&train_labels, &train_pred),
                report,
                training_time_seconds: fit_seconds,
            };

            info!(
                "{} accuracy: {:.4} (train {:.4}, {:.2}s)",
                algorithm, comparison.test_score, comparison.train_score, fit_seconds
            );
            match serde_json::to_string(&comparison.report) {
                Ok(json) => info!("{} classification report: {}", algorithm, json),
                Err(e) => debug!("Could not serialize report for {}: {}", algorithm, e),
            }

            candidates.push(Candidate {
                classifier,
                comparison,
            });
        }

        let best = select_best(
            &candidates
                .iter()
                .map(|c| c.comparison.test_score)
                .collect::<Vec<_>>(),
        )
        .ok_or_else(|| {
            LearningError::TrainingFailed(format!(
                "no candidate could be fitted: {}",
                warnings.join("; ")
            ))
        })?;

        let scores: BTreeMap<String, f64> = candidates
            .iter()
            .map(|c| (c.comparison.name.clone(), c.comparison.test_score))
            .collect();
        let model_comparison: Vec<ModelComparison> =
            candidates.iter().map(|c| c.comparison.clone()).collect();

        let winner = candidates.swap_remove(best);
        let best_model_name = winner.comparison.name.clone();
        info!(
            "Selected {} with accuracy {:.4}",
            best_model_name, winner.comparison.test_score
        );

        let model =
            TrainedModel::with_normalizer(vectorizer, winner.classifier, self.normalizer.clone())?;
        let result = TrainingResult {
            best_model_name,
            scores,
            model_comparison,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            training_time_seconds: started.elapsed().as_secs_f64(),
            warnings,
        };

        Ok((model, result))
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Families this pipeline trains, in priority order.
    pub fn registry(&self) -> &CandidateRegistry {
        &self.registry
    }
}

/// Builder for [`Pipeline`].
///
/// # Required Configuration
///
/// - [`config()`](Self::config): Training configuration (required)
///
/// # Optional Configuration
///
/// - [`normalizer()`](Self::normalizer): Normalizer with custom lexical
///   resources (default: the embedded ones)
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<TrainingConfig>,
    normalizer: Option<Normalizer>,
}

impl PipelineBuilder {
    /// Set the training configuration (required).
    #[must_use]
    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom normalizer (optional).
    ///
    /// The resulting [`TrainedModel`] serves with the same normalizer. Load
    /// its persisted pair with
    /// [`ArtifactStore::load_with`](crate::ArtifactStore::load_with).
    #[must_use]
    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if no configuration was
    /// provided, it does not validate, or it names a family that is not
    /// compiled in.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.ok_or_else(|| {
            LearningError::InvalidConfig("Pipeline config is required".to_string())
        })?;
        config.validate()?;
        let registry = CandidateRegistry::from_config(&config)?;

        Ok(Pipeline {
            config,
            registry,
            normalizer: self.normalizer.unwrap_or_default(),
        })
    }
}

/// Index of the highest score; the earliest wins ties.
fn select_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if best.is_none_or(|b| score > scores[b]) {
            best = Some(idx);
        }
    }
    best
}

fn predict_rows(classifier: &FittedClassifier, rows: &[SparseVector]) -> Vec<Label> {
    rows.iter().map(|row| classifier.predict(row)).collect()
}

/// Train on the CSV at `dataset_path`, persist the best pair into
/// `artifact_dir`, and return the accuracy of every candidate.
///
/// Prior artifacts are only replaced once training has fully succeeded.
pub fn train(
    dataset_path: impl AsRef<Path>,
    artifact_dir: impl AsRef<Path>,
    config: &TrainingConfig,
) -> Result<BTreeMap<String, f64>> {
    let dataset = Dataset::from_csv(dataset_path)?;
    let (_, result) = train_and_persist(&dataset, &ArtifactStore::new(artifact_dir), config)?;
    Ok(result.scores)
}

/// [`train`] for an in-memory DataFrame with `text` and `label` columns.
pub fn train_dataframe(
    df: &DataFrame,
    artifact_dir: impl AsRef<Path>,
    config: &TrainingConfig,
) -> Result<BTreeMap<String, f64>> {
    let dataset = Dataset::from_dataframe(df)?;
    let (_, result) = train_and_persist(&dataset, &ArtifactStore::new(artifact_dir), config)?;
    Ok(result.scores)
}

/// Train on `dataset` and persist the winner into `store`.
pub fn train_and_persist(
    dataset: &Dataset,
    store: &ArtifactStore,
    config: &TrainingConfig,
) -> Result<(TrainedModel, TrainingResult)> {
    let pipeline = Pipeline::builder().config(config.clone()).build()?;
    let (model, result) = pipeline.train(dataset)?;
    store.persist(&model)?;
    Ok((model, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use truebot_processing::LexicalResources;

    fn news_dataset(per_class: usize) -> Dataset {
        let real = [
            "The ministry confirmed the budget according to the official bulletin",
            "Officials confirmed the new budget in parliament on Tuesday",
            "The ministry published its annual report on public spending",
            "Government officials announced the infrastructure budget",
        ];
        let fake = [
            "A viral meme claimed a pop star teleported across continents",
            "Shocking video claims aliens replaced the pop star",
            "Viral post claims miracle cure hidden by doctors",
            "Secret memes reveal the star can teleport",
        ];
        let mut records = Vec::new();
        for i in 0..per_class {
            records.push((format!("{} statement", real[i % real.len()]), Label::Real));
            records.push((format!("{} rumor", fake[i % fake.len()]), Label::Fake));
        }
        Dataset::from_records(records)
    }

    fn quick_config() -> TrainingConfig {
        TrainingConfig::builder().n_estimators(10).build().unwrap()
    }

    #[test]
    fn test_pipeline_builder_requires_config() {
        let err = Pipeline::builder().build().unwrap_err();
        assert!(matches!(err, LearningError::InvalidConfig(_)));
        assert!(err.to_string().contains("config is required"));
    }

    #[test]
    fn test_pipeline_builder_validates_config() {
        let config = TrainingConfig {
            test_size: 2.0,
            ..TrainingConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_select_best_ties_go_to_earliest() {
        assert_eq!(select_best(&[0.9, 0.9, 0.8]), Some(0));
        assert_eq!(select_best(&[0.8, 0.9, 0.9]), Some(1));
        assert_eq!(select_best(&[0.7, 0.8, 0.95]), Some(2));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_train_scores_every_candidate() {
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let (model, result) = pipeline.train(&news_dataset(20)).unwrap();

        assert_eq!(result.scores.len(), pipeline.registry().len());
        assert!(result.scores.contains_key("log_reg"));
        assert!(result.scores.contains_key("random_forest"));
        assert!(result.scores.values().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(result.train_rows + result.test_rows, 40);
        assert_eq!(result.test_rows, 8);
        assert_eq!(model.algorithm().as_str(), result.best_model_name);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_best_model_has_max_accuracy() {
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let (_, result) = pipeline.train(&news_dataset(20)).unwrap();

        let best = result.scores[&result.best_model_name];
        assert!(result.scores.values().all(|s| *s <= best));
        // Earlier families win ties.
        for algo in Algorithm::ALL {
            if algo.as_str() == result.best_model_name {
                break;
            }
            if let Some(score) = result.scores.get(algo.as_str()) {
                assert!(*score < best);
            }
        }
    }

    #[test]
    fn test_train_restricted_algorithm() {
        let config = TrainingConfig::builder()
            .algorithm(Algorithm::RandomForest)
            .n_estimators(5)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();
        let (model, result) = pipeline.train(&news_dataset(10)).unwrap();
        assert_eq!(model.algorithm(), Algorithm::RandomForest);
        assert_eq!(result.scores.keys().collect::<Vec<_>>(), vec!["random_forest"]);
    }

    #[test]
    fn test_train_is_deterministic() {
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let dataset = news_dataset(15);
        let (a, ra) = pipeline.train(&dataset).unwrap();
        let (b, rb) = pipeline.train(&dataset).unwrap();
        assert_eq!(ra.scores, rb.scores);
        assert_eq!(a.classifier(), b.classifier());
        assert_eq!(a.vectorizer(), b.vectorizer());
    }

    #[test]
    fn test_custom_normalizer_is_served() {
        let resources = LexicalResources::parse(
            "the\nin\non\na\nits\nacross\nby\n",
            "ministries\tministry\n",
            std::path::Path::new("custom"),
        )
        .unwrap();
        let custom = Normalizer::with_resources(Arc::new(resources));
        let pipeline = Pipeline::builder()
            .config(quick_config())
            .normalizer(custom.clone())
            .build()
            .unwrap();
        let (model, _) = pipeline.train(&news_dataset(20)).unwrap();

        let text = "The ministry confirmed the budget";
        let trained_view = model.vectorizer().transform_one(&custom.normalize(text));
        assert_eq!(model.featurize(text), trained_view);
        assert_eq!(
            model.normalizer().resources().fingerprint(),
            custom.resources().fingerprint()
        );
        assert!(model.vectorizer().transform_one("ministry confirmed budget").nnz() >= 3);
    }

    #[test]
    fn test_single_class_rejected() {
        let dataset =
            Dataset::from_records((0..10).map(|i| (format!("budget report {i}"), Label::Real)));
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let err = pipeline.train(&dataset).unwrap_err();
        assert!(matches!(err, LearningError::InvalidData(_)));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let err = pipeline.train(&Dataset::default()).unwrap_err();
        assert!(matches!(err, LearningError::EmptyCorpus));
    }

    #[test]
    fn test_unusable_vocabulary_rejected() {
        let mut records = Vec::new();
        for _ in 0..5 {
            records.push(("the and of", Label::Real));
            records.push(("a b c", Label::Fake));
        }
        let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();
        let err = pipeline.train(&Dataset::from_records(records)).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_VOCABULARY");
    }
}
