//! Stopword set and lemma dictionary.
//!
//! Both resources ship inside the crate (`resources/stopwords_en.txt` and
//! `resources/lemmas_en.tsv`) and are parsed at most once per process by
//! [`ensure_initialized`]. Operators can point at their own copies with
//! [`LexicalResources::from_dir`].
//!
//! # Dictionary invariant
//!
//! Every lemma must be a fixed point of the dictionary (it is not itself an
//! inflected form mapping elsewhere) and must not be a stopword. Loading
//! rejects dictionaries that break this, which is what keeps
//! [`normalize`](crate::normalize) idempotent.

use crate::error::{ProcessingError, Result};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const EMBEDDED_STOPWORDS: &str = include_str!("../../resources/stopwords_en.txt");
const EMBEDDED_LEMMAS: &str = include_str!("../../resources/lemmas_en.tsv");

/// File name of the stopword list inside an override directory.
pub const STOPWORDS_FILE: &str = "stopwords.txt";

/// File name of the lemma dictionary inside an override directory.
pub const LEMMAS_FILE: &str = "lemmas.tsv";

static GLOBAL: OnceCell<Arc<LexicalResources>> = OnceCell::new();

static_assertions::assert_impl_all!(LexicalResources: Send, Sync);

/// Stopwords plus a form → lemma dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexicalResources {
    stopwords: HashSet<String>,
    lemmas: HashMap<String, String>,
}

impl LexicalResources {
    /// Parse the resources compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::parse(
            EMBEDDED_STOPWORDS,
            EMBEDDED_LEMMAS,
            Path::new("<embedded>"),
        )
    }

    /// Load `stopwords.txt` and `lemmas.tsv` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let stopwords = read_resource(&dir.join(STOPWORDS_FILE))?;
        let lemmas = read_resource(&dir.join(LEMMAS_FILE))?;
        Self::parse(&stopwords, &lemmas, dir)
    }

    /// Parse resource text. `origin` is only used in error messages.
    ///
    /// Stopwords: one word per line. Lemmas: `form<TAB>lemma` per line.
    /// Blank lines and lines starting with `#` are skipped in both.
    pub fn parse(stopwords: &str, lemmas: &str, origin: &Path) -> Result<Self> {
        let stopwords: HashSet<String> = content_lines(stopwords)
            .map(|(_, line)| line.to_string())
            .collect();

        let mut map = HashMap::new();
        for (line_no, line) in content_lines(lemmas) {
            let Some((form, lemma)) = line.split_once('\t') else {
                return Err(resource_error(
                    origin,
                    format!("line {line_no} is not '<form>\\t<lemma>'"),
                ));
            };
            let (form, lemma) = (form.trim(), lemma.trim());
            if !is_lowercase_word(form) || !is_lowercase_word(lemma) {
                return Err(resource_error(
                    origin,
                    format!("line {line_no} must contain lowercase a-z words only"),
                ));
            }
            if form != lemma {
                map.insert(form.to_string(), lemma.to_string());
            }
        }

        for (form, lemma) in &map {
            if map.contains_key(lemma) {
                return Err(resource_error(
                    origin,
                    format!("lemma '{lemma}' of '{form}' is itself an inflected form"),
                ));
            }
            if stopwords.contains(lemma) {
                return Err(resource_error(
                    origin,
                    format!("lemma '{lemma}' of '{form}' is a stopword"),
                ));
            }
        }

        debug!(
            "Loaded {} stopwords and {} lemma entries from {}",
            stopwords.len(),
            map.len(),
            origin.display()
        );

        Ok(Self {
            stopwords,
            lemmas: map,
        })
    }

    /// Whether `token` is a stopword. Exact, case-sensitive match.
    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Dictionary base form of `token`, or `token` itself when unknown.
    pub fn lemma<'a>(&'a self, token: &'a str) -> &'a str {
        self.lemmas.get(token).map(String::as_str).unwrap_or(token)
    }

    /// Number of stopwords.
    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }

    /// Number of form → lemma entries.
    pub fn lemma_count(&self) -> usize {
        self.lemmas.len()
    }

    /// Content hash of both resources, independent of load order and origin.
    ///
    /// Two values with equal fingerprints normalize every text the same way.
    pub fn fingerprint(&self) -> u64 {
        let mut stopwords: Vec<&str> = self.stopwords.iter().map(String::as_str).collect();
        stopwords.sort_unstable();
        let mut lemmas: Vec<(&str, &str)> = self
            .lemmas
            .iter()
            .map(|(form, lemma)| (form.as_str(), lemma.as_str()))
            .collect();
        lemmas.sort_unstable();

        let mut canonical = String::new();
        for word in stopwords {
            canonical.push_str(word);
            canonical.push('\n');
        }
        canonical.push('\0');
        for (form, lemma) in lemmas {
            canonical.push_str(form);
            canonical.push('\t');
            canonical.push_str(lemma);
            canonical.push('\n');
        }
        twox_hash::xxh3::hash64(canonical.as_bytes())
    }
}

/// Process-wide resources, parsed on first use and shared afterwards.
///
/// Concurrent first callers block until one of them finishes parsing; all
/// later calls are a pointer read.
pub fn ensure_initialized() -> &'static Arc<LexicalResources> {
    GLOBAL.get_or_init(|| {
        debug!("Initializing embedded lexical resources");
        Arc::new(LexicalResources::embedded().expect("Invalid embedded lexical resources"))
    })
}

fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| (idx, line.trim_start()))
}

fn is_lowercase_word(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_lowercase())
}

fn read_resource(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| resource_error(path, e.to_string()))
}

fn resource_error(path: &Path, reason: String) -> ProcessingError {
    ProcessingError::Resource {
        path: PathBuf::from(path),
        reason,
    }
}
