//! Labeled training corpus.
//!
//! A [`Dataset`] holds `(text, label)` pairs, loaded from a CSV file or a
//! polars [`DataFrame`] with at least a `text` and a `label` column. Other
//! columns are ignored. Rows where either field is null are dropped, and
//! labels are binarized with [`Label::from_raw`].

use crate::error::{LearningError, Result};
use crate::types::Label;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Name of the document column.
pub const TEXT_COLUMN: &str = "text";

/// Name of the class column.
pub const LABEL_COLUMN: &str = "label";

/// A binarized, null-free labeled corpus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    texts: Vec<String>,
    labels: Vec<Label>,
    dropped_rows: usize,
}

impl Dataset {
    /// Read a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// - [`LearningError::Io`] if the file does not exist
    /// - [`LearningError::Polars`] if the file cannot be parsed
    /// - [`LearningError::Schema`] if `text` or `label` is missing
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LearningError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dataset not found: {}", path.display()),
            )));
        }

        debug!("Reading dataset from {}", path.display());
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.into()))?
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Extract the `text` and `label` columns of `df`.
    ///
    /// Both columns are cast to strings, so numeric labels are accepted (and
    /// binarize to [`Label::Fake`]).
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let text = required_column(df, TEXT_COLUMN)?;
        let label = required_column(df, LABEL_COLUMN)?;

        let text = text.cast(&DataType::String)?;
        let label = label.cast(&DataType::String)?;
        let text = text.as_materialized_series().str()?;
        let label = label.as_materialized_series().str()?;

        let mut dataset = Self::default();
        for (text, label) in text.into_iter().zip(label.into_iter()) {
            match (text, label) {
                (Some(text), Some(label)) => dataset.push(text, Label::from_raw(label)),
                _ => dataset.dropped_rows += 1,
            }
        }

        info!(
            "Loaded {} labeled rows ({} real, {} fake), dropped {} with nulls",
            dataset.len(),
            dataset.count(Label::Real),
            dataset.count(Label::Fake),
            dataset.dropped_rows
        );

        Ok(dataset)
    }

    /// Build from already-binarized pairs.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, Label)>,
        S: Into<String>,
    {
        let mut dataset = Self::default();
        for (text, label) in records {
            dataset.push(text, label);
        }
        dataset
    }

    fn push(&mut self, text: impl Into<String>, label: Label) {
        self.texts.push(text.into());
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Rows discarded because the text or label was null.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Number of rows with class `label`.
    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| LearningError::Schema(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_dataframe() {
        let df = df! {
            "text" => ["Ministry confirmed budget", "Viral meme claims", "Officials said"],
            "label" => ["REAL", "FAKE", "real"],
            "source" => ["a", "b", "c"],
        }
        .unwrap();

        let dataset = Dataset::from_dataframe(&df).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels(), &[Label::Real, Label::Fake, Label::Real]);
        assert_eq!(dataset.texts()[1], "Viral meme claims");
        assert_eq!(dataset.dropped_rows(), 0);
    }

    #[test]
    fn test_null_rows_dropped() {
        let df = df! {
            "text" => [Some("budget approved"), None, Some("meme spread")],
            "label" => [Some("REAL"), Some("FAKE"), None],
        }
        .unwrap();

        let dataset = Dataset::from_dataframe(&df).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.dropped_rows(), 2);
    }

    #[test]
    fn test_missing_label_column() {
        let df = df! {
            "text" => ["budget approved"],
            "class" => ["REAL"],
        }
        .unwrap();

        let err = Dataset::from_dataframe(&df).unwrap_err();
        assert!(matches!(err, LearningError::Schema(ref col) if col == "label"));
    }

    #[test]
    fn test_missing_text_column() {
        let df = df! { "label" => ["REAL"] }.unwrap();
        let err = Dataset::from_dataframe(&df).unwrap_err();
        assert!(matches!(err, LearningError::Schema(ref col) if col == "text"));
    }

    #[test]
    fn test_numeric_labels_are_fake() {
        let df = df! {
            "text" => ["a story", "another story"],
            "label" => [1i64, 0i64],
        }
        .unwrap();

        let dataset = Dataset::from_dataframe(&df).unwrap();
        assert_eq!(dataset.count(Label::Fake), 2);
    }

    #[test]
    fn test_from_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,text,label").unwrap();
        writeln!(file, "t1,\"Ministry confirmed the budget, officials said\",REAL").unwrap();
        writeln!(file, "t2,A viral meme claimed a pop star teleported,FAKE").unwrap();
        file.flush().unwrap();

        let dataset = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.texts()[0],
            "Ministry confirmed the budget, officials said"
        );
        assert_eq!(dataset.count(Label::Real), 1);
    }

    #[test]
    fn test_from_csv_missing_file() {
        let err = Dataset::from_csv("/nonexistent/news.csv").unwrap_err();
        assert!(matches!(err, LearningError::Io(_)));
    }

    #[test]
    fn test_from_records() {
        let dataset = Dataset::from_records([("x", Label::Real), ("y", Label::Fake)]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.count(Label::Real), 1);
    }
}
