//! Reuters newswire corpus loader.
//!
//! The raw corpus is a JSON document `{"x": [[ids...], ...], "y": [labels...]}` whose token
//! ids are word ranks by corpus frequency (1 = most frequent). Loading applies the usual
//! preprocessing for this corpus: a seeded shuffle, a start marker, an id offset that
//! reserves the low ids, out-of-vocabulary replacement, and a train/test split.

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the corpus location
pub const CORPUS_ENV: &str = "REUTERS_CORPUS";
pub const DEFAULT_SEED: u64 = 113;
pub const START_CHAR: u32 = 1;
pub const OOV_CHAR: u32 = 2;
pub const INDEX_FROM: u32 = 3;

/// Errors that can occur while handling Reuters data
#[derive(Debug, Error)]
pub enum ReutersError {
    /// The corpus file is missing, unreadable, or malformed
    #[error("Corpus unavailable at {}: {reason}", .path.display())]
    DataUnavailable { path: PathBuf, reason: String },
    /// Error for mismatches between sequences and labels
    #[error("Data mismatch: {0}")]
    DataMismatch(String),
    /// Loader options out of range
    #[error("Invalid load options: {0}")]
    InvalidOptions(String),
    /// A label has no column in the one-hot encoding
    #[error("Label {label} out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },
    /// No documents survived loading
    #[error("Corpus contains no documents")]
    EmptyCorpus,
}

/// The corpus as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCorpus {
    pub x: Vec<Vec<u32>>,
    pub y: Vec<usize>,
}

/// A document as a sequence of token ids together with its topic label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExample {
    pub tokens: Vec<u32>,
    pub label: usize,
}

/// One partition of the corpus
#[derive(Debug, Clone, Default)]
pub struct ReutersData {
    examples: Vec<RawExample>,
}

impl ReutersData {
    pub fn new(examples: Vec<RawExample>) -> Self {
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[RawExample] {
        &self.examples
    }

    pub fn labels(&self) -> Vec<usize> {
        self.examples.iter().map(|example| example.label).collect()
    }
}

/// Preprocessing applied while loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Keep only the `num_words` most frequent words; `None` keeps every word
    pub num_words: Option<usize>,
    /// Ids below this are treated as out of vocabulary
    pub skip_top: usize,
    /// Documents with at least this many tokens are dropped
    pub maxlen: Option<usize>,
    /// Fraction of documents assigned to the test partition
    pub test_split: f64,
    pub seed: u64,
    /// Marker prepended to every document
    pub start_char: Option<u32>,
    /// Replacement for out-of-vocabulary ids; `None` removes them instead
    pub oov_char: Option<u32>,
    /// Offset added to every raw id
    pub index_from: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            num_words: None,
            skip_top: 0,
            maxlen: None,
            test_split: 0.2,
            seed: DEFAULT_SEED,
            start_char: Some(START_CHAR),
            oov_char: Some(OOV_CHAR),
            index_from: INDEX_FROM,
        }
    }
}

impl LoadOptions {
    /// Default preprocessing with a vocabulary cap and test fraction.
    pub fn new(num_words: usize, test_split: f64) -> Self {
        Self {
            num_words: Some(num_words),
            test_split,
            ..Self::default()
        }
    }
}

/// Creates a progress bar with a consistent style
pub(crate) fn create_progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Returns the corpus location: `$REUTERS_CORPUS`, else `~/.keras/datasets/reuters.json`.
pub fn default_corpus_path() -> Result<PathBuf, ReutersError> {
    if let Some(path) = std::env::var_os(CORPUS_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME").ok_or_else(|| ReutersError::DataUnavailable {
        path: PathBuf::from("~/.keras/datasets/reuters.json"),
        reason: format!("neither {CORPUS_ENV} nor HOME is set"),
    })?;
    Ok(PathBuf::from(home)
        .join(".keras")
        .join("datasets")
        .join("reuters.json"))
}

/// Reads the raw corpus from `path`.
///
/// # Errors
/// * `ReutersError::DataUnavailable` if the file cannot be opened or parsed, or if the
///   number of sequences and labels differ
pub fn read_corpus(path: impl AsRef<Path>) -> Result<RawCorpus, ReutersError> {
    let path = path.as_ref();
    let unavailable = |reason: String| ReutersError::DataUnavailable {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
    let corpus: RawCorpus =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| unavailable(e.to_string()))?;

    if corpus.x.len() != corpus.y.len() {
        return Err(unavailable(format!(
            "number of sequences ({}) does not match number of labels ({})",
            corpus.x.len(),
            corpus.y.len()
        )));
    }
    Ok(corpus)
}

/// Applies the loading pipeline to an in-memory corpus and splits it.
///
/// # Returns
/// * `Ok((train, test))`; every document lands in exactly one partition
pub fn prepare(
    corpus: RawCorpus,
    options: &LoadOptions,
) -> Result<(ReutersData, ReutersData), ReutersError> {
    if !(0.0..1.0).contains(&options.test_split) {
        return Err(ReutersError::InvalidOptions(format!(
            "test_split must be in [0, 1), got {}",
            options.test_split
        )));
    }
    if corpus.x.len() != corpus.y.len() {
        return Err(ReutersError::DataMismatch(format!(
            "number of sequences ({}) does not match number of labels ({})",
            corpus.x.len(),
            corpus.y.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut documents: Vec<(Vec<u32>, usize)> = corpus.x.into_iter().zip(corpus.y).collect();
    documents.shuffle(&mut rng);

    let offset_tokens = |tokens: Vec<u32>| -> Result<Vec<u32>, ReutersError> {
        let shifted = tokens.into_iter().map(|w| {
            w.checked_add(options.index_from).ok_or_else(|| {
                ReutersError::DataMismatch(format!(
                    "token id {w} overflows when offset by {}",
                    options.index_from
                ))
            })
        });
        match options.start_char {
            Some(start) => std::iter::once(Ok(start)).chain(shifted).collect(),
            None => shifted.collect(),
        }
    };
    let mut documents: Vec<(Vec<u32>, usize)> = documents
        .into_iter()
        .map(|(tokens, label)| Ok((offset_tokens(tokens)?, label)))
        .collect::<Result<_, ReutersError>>()?;

    if let Some(maxlen) = options.maxlen {
        documents.retain(|(tokens, _)| tokens.len() < maxlen);
    }
    if documents.is_empty() {
        return Err(ReutersError::EmptyCorpus);
    }

    let num_words = match options.num_words {
        Some(n) => n,
        None => documents
            .iter()
            .flat_map(|(tokens, _)| tokens.iter().copied())
            .max()
            .map_or(0, |w| w as usize + 1),
    };
    let in_vocabulary = |w: u32| (options.skip_top..num_words).contains(&(w as usize));

    let examples: Vec<RawExample> = documents
        .into_iter()
        .map(|(tokens, label)| {
            let tokens = match options.oov_char {
                Some(oov) => tokens
                    .into_iter()
                    .map(|w| if in_vocabulary(w) { w } else { oov })
                    .collect(),
                None => tokens.into_iter().filter(|&w| in_vocabulary(w)).collect(),
            };
            RawExample { tokens, label }
        })
        .collect();

    let split_at = (examples.len() as f64 * (1.0 - options.test_split)) as usize;
    let mut train = examples;
    let test = train.split_off(split_at.min(train.len()));

    tracing::debug!(
        train = train.len(),
        test = test.len(),
        num_words,
        "corpus prepared"
    );
    Ok((ReutersData::new(train), ReutersData::new(test)))
}

/// Loads the corpus from `path` and returns the (train, test) partitions.
pub fn load_data(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(ReutersData, ReutersData), ReutersError> {
    let progress = ProgressBar::new_spinner();
    progress.set_style(create_progress_style(
        "{spinner:.green} [{elapsed_precise}] {msg}",
    ));
    progress.set_message(format!("Reading {}", path.as_ref().display()));

    let corpus = read_corpus(&path);
    let corpus = match corpus {
        Ok(corpus) => corpus,
        Err(err) => {
            progress.abandon_with_message("Failed to read corpus");
            return Err(err);
        }
    };

    progress.set_message("Preparing sequences...");
    let partitions = prepare(corpus, options)?;
    progress.finish_and_clear();
    Ok(partitions)
}
