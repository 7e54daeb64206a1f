mod history;
mod training;
mod training_config;

pub use history::{HistoryFile, history_path, load_history, load_results, save_history};
pub use training::{Experiment, ExperimentError, PreparedData, RunResult};
pub use training_config::{ExperimentConfig, NETWORK_COUNT, NamedNetwork, SeedPolicy};

pub mod prelude {
    pub use crate::Experiment;
    pub use crate::ExperimentConfig;
    pub use crate::RunResult;
}
