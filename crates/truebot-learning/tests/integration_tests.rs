//! Integration tests for training, persistence and cached prediction.
//!
//! The fixture corpus under `tests/fixtures/news.csv` holds 100 official-style
//! real stories and 100 fabricated-claim fake stories with mixed-case labels.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use truebot_learning::models::{LogisticParams, LogisticRegression};
use truebot_learning::{
    Algorithm, ArtifactLocator, ArtifactStore, Dataset, Label, LearningError, ModelCache,
    Pipeline, TrainingConfig, train, train_dataframe,
};
use truebot_processing::{
    LexicalResources, Normalizer, TfidfVectorizer, VectorizerConfig, normalize_corpus, tokenize,
};

const OFFICIAL_SENTENCE: &str =
    "The ministry confirmed the budget according to the official bulletin.";
const VIRAL_SENTENCE: &str = "A viral meme claimed a pop star teleported across continents.";

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn news_csv() -> PathBuf {
    fixtures_path().join("news.csv")
}

fn quick_config() -> TrainingConfig {
    TrainingConfig::builder()
        .n_estimators(25)
        .build()
        .expect("valid config")
}

/// Copy the fixture corpus so tests can delete it.
fn copy_corpus(dir: &Path) -> PathBuf {
    let target = dir.join("news.csv");
    fs::copy(news_csv(), &target).expect("copy fixture");
    target
}

// ============================================================================
// Dataset Loading
// ============================================================================

#[test]
fn test_fixture_loads_with_both_classes() {
    let dataset = Dataset::from_csv(news_csv()).unwrap();
    assert_eq!(dataset.len(), 200);
    assert_eq!(dataset.count(Label::Real), 100);
    assert_eq!(dataset.count(Label::Fake), 100);
    assert_eq!(dataset.dropped_rows(), 0);
}

#[test]
fn test_missing_label_column_is_schema_error() {
    let dir = TempDir::new().unwrap();
    let err = train(
        fixtures_path().join("news_no_label.csv"),
        dir.path().join("model"),
        &quick_config(),
    )
    .unwrap_err();

    match err {
        LearningError::Schema(column) => assert_eq!(column, "label"),
        other => panic!("expected schema error, got {other}"),
    }
    assert!(!ArtifactStore::new(dir.path().join("model")).exists());
}

#[test]
fn test_missing_text_column_in_dataframe() {
    let df = df!("label" => ["REAL", "FAKE"]).unwrap();
    let dir = TempDir::new().unwrap();
    let err = train_dataframe(&df, dir.path(), &quick_config()).unwrap_err();
    assert_eq!(err.error_code(), "SCHEMA_ERROR");
}

// ============================================================================
// End-to-End Training and Prediction
// ============================================================================

#[test]
fn test_official_sentence_predicts_real() {
    let tokens = tokenize(OFFICIAL_SENTENCE);
    for expected in ["ministry", "confirm", "budget"] {
        assert!(tokens.iter().any(|t| t == expected), "missing {expected}");
    }

    let dir = TempDir::new().unwrap();
    let locator = ArtifactLocator::new(dir.path().join("model"), news_csv());
    let cache = ModelCache::new(quick_config());

    let result = cache.predict(OFFICIAL_SENTENCE, &locator).unwrap();
    assert_eq!(result.label, Label::Real);
    assert!(result.confidence >= 50.0);
}

#[test]
fn test_viral_sentence_predicts_fake() {
    let dir = TempDir::new().unwrap();
    let locator = ArtifactLocator::new(dir.path().join("model"), news_csv());
    let cache = ModelCache::new(quick_config());

    let result = cache.predict(VIRAL_SENTENCE, &locator).unwrap();
    assert_eq!(result.label, Label::Fake);
    assert!(result.confidence >= 50.0);
}

#[test]
fn test_predict_without_artifacts_trains_then_reuses() {
    let dir = TempDir::new().unwrap();
    let corpus = copy_corpus(dir.path());
    let locator = ArtifactLocator::new(dir.path().join("model"), &corpus);
    let cache = ModelCache::new(quick_config());
    assert!(!locator.store().exists());

    let first = cache.predict(OFFICIAL_SENTENCE, &locator).unwrap();
    assert!(locator.store().exists());
    assert!((0.0..=100.0).contains(&first.confidence));

    // The corpus is gone, so a second call can only succeed from the cache.
    fs::remove_file(&corpus).unwrap();
    let second = cache.predict(OFFICIAL_SENTENCE, &locator).unwrap();
    assert_eq!(second, first);

    let model = cache.get_or_load(&locator).unwrap();
    assert!(Arc::ptr_eq(&model, &cache.get_or_load(&locator).unwrap()));
}

#[test]
fn test_new_cache_loads_persisted_pair() {
    let dir = TempDir::new().unwrap();
    let model_dir = dir.path().join("model");
    let scores = train(news_csv(), &model_dir, &quick_config()).unwrap();
    assert!(scores.contains_key("log_reg"));

    // Pointing at a missing corpus proves the pair came from disk.
    let locator = ArtifactLocator::new(&model_dir, dir.path().join("absent.csv"));
    let result = ModelCache::new(quick_config())
        .predict(VIRAL_SENTENCE, &locator)
        .unwrap();
    assert_eq!(result.label, Label::Fake);
}

#[test]
fn test_prediction_serializes_label_and_confidence_only() {
    let dir = TempDir::new().unwrap();
    let locator = ArtifactLocator::new(dir.path().join("model"), news_csv());
    let result = ModelCache::new(quick_config())
        .predict(OFFICIAL_SENTENCE, &locator)
        .unwrap();

    let json = serde_json::to_value(result).unwrap();
    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object["label"], "Real");
    assert!(object["confidence"].as_f64().unwrap() >= 50.0);
}

// ============================================================================
// Training Entry Points
// ============================================================================

#[test]
fn test_train_reports_every_candidate() {
    let dir = TempDir::new().unwrap();
    let scores = train(news_csv(), dir.path(), &quick_config()).unwrap();

    let mut expected = vec!["log_reg", "random_forest"];
    if cfg!(feature = "gradient-boosting") {
        expected.insert(0, "gradient_boosting");
    }
    assert_eq!(scores.keys().map(String::as_str).collect::<Vec<_>>(), expected);
    assert!(scores.values().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn test_training_is_reproducible() {
    let dataset = Dataset::from_csv(news_csv()).unwrap();
    let pipeline = Pipeline::builder().config(quick_config()).build().unwrap();

    let (first, first_result) = pipeline.train(&dataset).unwrap();
    let (second, second_result) = pipeline.train(&dataset).unwrap();
    assert_eq!(first_result.scores, second_result.scores);
    assert_eq!(first_result.best_model_name, second_result.best_model_name);
    assert_eq!(first.predict(VIRAL_SENTENCE), second.predict(VIRAL_SENTENCE));
}

#[test]
fn test_train_dataframe_persists_pair() {
    let texts: Vec<String> = (0..10)
        .flat_map(|i| {
            [
                format!("Officials confirmed the ministry budget report {i}"),
                format!("A viral meme claimed the pop star teleported {i}"),
            ]
        })
        .collect();
    let labels: Vec<&str> = (0..10).flat_map(|_| ["REAL", "FAKE"]).collect();
    let df = df!("text" => texts, "label" => labels).unwrap();

    let dir = TempDir::new().unwrap();
    let config = TrainingConfig::builder()
        .algorithm(Algorithm::LogisticRegression)
        .build()
        .unwrap();
    let scores = train_dataframe(&df, dir.path(), &config).unwrap();
    assert_eq!(scores.len(), 1);

    let model = ArtifactStore::new(dir.path()).load().unwrap();
    assert_eq!(model.algorithm(), Algorithm::LogisticRegression);
}

#[test]
fn test_single_class_corpus_fails_without_touching_artifacts() {
    let dir = TempDir::new().unwrap();
    let model_dir = dir.path().join("model");
    train(news_csv(), &model_dir, &quick_config()).unwrap();
    let before = fs::read(model_dir.join("model.json")).unwrap();

    let df = df!(
        "text" => ["budget one", "budget two", "budget three", "budget four"],
        "label" => ["REAL", "REAL", "REAL", "REAL"]
    )
    .unwrap();
    let err = train_dataframe(&df, &model_dir, &quick_config()).unwrap_err();
    assert!(matches!(err, LearningError::InvalidData(_)));

    let after = fs::read(model_dir.join("model.json")).unwrap();
    assert_eq!(before, after);
}

// ============================================================================
// Artifact Integrity
// ============================================================================

#[test]
fn test_vectorizer_from_another_run_is_refused() {
    let dir = TempDir::new().unwrap();
    let first = ArtifactStore::new(dir.path().join("first"));
    let second = ArtifactStore::new(dir.path().join("second"));
    train(news_csv(), first.dir(), &quick_config()).unwrap();
    let config = TrainingConfig::builder()
        .algorithm(Algorithm::LogisticRegression)
        .build()
        .unwrap();
    train(news_csv(), second.dir(), &config).unwrap();

    // Same corpus, so both vectorizers have the same dimension.
    let a = first.load().unwrap();
    let b = second.load().unwrap();
    assert_eq!(a.vectorizer().dimension(), b.vectorizer().dimension());

    fs::copy(second.vectorizer_path(), first.vectorizer_path()).unwrap();
    let err = first.load().unwrap_err();
    assert_eq!(err.error_code(), "ARTIFACT_MISMATCH");
}

#[test]
fn test_custom_lexicon_round_trips_through_store() {
    let resources = LexicalResources::parse("the\na\nof\nto\n", "", Path::new("custom")).unwrap();
    let custom = Normalizer::with_resources(Arc::new(resources));
    let dataset = Dataset::from_csv(news_csv()).unwrap();
    let pipeline = Pipeline::builder()
        .config(quick_config())
        .normalizer(custom.clone())
        .build()
        .unwrap();
    let (model, _) = pipeline.train(&dataset).unwrap();

    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.persist(&model).unwrap();
    assert!(matches!(
        store.load(),
        Err(LearningError::ArtifactMismatch(_))
    ));

    let served = store.load_with(custom.clone()).unwrap();
    let trained_view = model.vectorizer().transform_one(&custom.normalize(OFFICIAL_SENTENCE));
    assert_eq!(served.featurize(OFFICIAL_SENTENCE), trained_view);
    assert_eq!(served.predict(OFFICIAL_SENTENCE), model.predict(OFFICIAL_SENTENCE));
}

// ============================================================================
// Solver Convergence
// ============================================================================

#[test]
fn test_logistic_regression_converges_on_fixture_corpus() {
    let dataset = Dataset::from_csv(news_csv()).unwrap();
    let docs = normalize_corpus(dataset.texts());
    let (vectorizer, rows) =
        TfidfVectorizer::fit_transform(&docs, VectorizerConfig::default()).unwrap();

    let config = TrainingConfig::default();
    let model = LogisticRegression::fit(
        &rows,
        dataset.labels(),
        vectorizer.dimension(),
        LogisticParams::from(&config),
    )
    .unwrap();
    assert!(model.converged());
    assert!(model.n_iter() < config.max_iter);
}
