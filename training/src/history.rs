use crate::training::{ExperimentError, RunResult};
use crate::training_config::ExperimentConfig;
use neural_network::{EpochRecord, Evaluation, NetworkConfig, TrainingHistory};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// On-disk form of one run: its configuration, test score and per-epoch metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFile {
    pub index: usize,
    pub name: String,
    pub config: NetworkConfig,
    pub score: Evaluation,
    pub epochs: Vec<EpochRecord>,
}

impl From<&RunResult> for HistoryFile {
    fn from(result: &RunResult) -> Self {
        Self {
            index: result.index,
            name: result.name.clone(),
            config: result.config.clone(),
            score: result.score,
            epochs: result.history.records(),
        }
    }
}

impl From<HistoryFile> for RunResult {
    fn from(file: HistoryFile) -> Self {
        Self {
            index: file.index,
            history: TrainingHistory::from_records(&file.epochs),
            name: file.name,
            config: file.config,
            score: file.score,
        }
    }
}

/// Returns `<dir>/history_<name>.json` with the name lowercased.
pub fn history_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("history_{}.json", name.to_lowercase()))
}

fn persistence_error(path: &Path, reason: impl ToString) -> ExperimentError {
    ExperimentError::Persistence {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Writes the history of `result` into `dir`, creating the directory if needed.
///
/// # Returns
/// * The path of the written file
pub fn save_history(dir: &Path, result: &RunResult) -> Result<PathBuf, ExperimentError> {
    std::fs::create_dir_all(dir).map_err(|e| persistence_error(dir, e))?;

    let path = history_path(dir, &result.name);
    let file = File::create(&path).map_err(|e| persistence_error(&path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &HistoryFile::from(result))
        .map_err(|e| persistence_error(&path, e))?;
    writer.flush().map_err(|e| persistence_error(&path, e))?;

    tracing::info!(path = %path.display(), "training history saved");
    Ok(path)
}

/// Reads a history file written by [`save_history`].
pub fn load_history(path: &Path) -> Result<RunResult, ExperimentError> {
    let file = File::open(path).map_err(|e| persistence_error(path, e))?;
    let history: HistoryFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| persistence_error(path, e))?;
    Ok(history.into())
}

/// Loads the saved history of every network in `config` from `dir`.
pub fn load_results(
    dir: &Path,
    config: &ExperimentConfig,
) -> Result<[RunResult; 3], ExperimentError> {
    let [first, second, third] = &config.networks;
    Ok([
        load_history(&history_path(dir, &first.name))?,
        load_history(&history_path(dir, &second.name))?,
        load_history(&history_path(dir, &third.name))?,
    ])
}
