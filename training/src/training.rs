//! Experiment runner for the activation comparison.
//!
//! This module provides:
//! - Up-front validation of every network configuration
//! - Data preparation: loading, bag-of-words vectorization, one-hot labels
//! - Sequential build / fit / evaluate of the compared networks
//! - Seeding policy across runs

use crate::training_config::{ExperimentConfig, NamedNetwork, SeedPolicy};
use ndarray::Array2;
use neural_network::{
    Evaluation, FitOptions, NetworkConfig, NetworkError, Sequential, TrainingHistory,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reuters::{LabelEncoder, LoadOptions, RawCorpus, ReutersData, ReutersError, Vectorizer};
use std::path::Path;
use thiserror::Error;

/// Errors that abort an experiment
#[derive(Debug, Error)]
pub enum ExperimentError {
    /// A network configuration failed validation
    #[error("Invalid configuration for network {network}: {source}")]
    ConfigInvalid {
        network: String,
        #[source]
        source: NetworkError,
    },
    /// Building, fitting or evaluating a network failed
    #[error("Training failed for network {network}: {source}")]
    TrainingFailed {
        network: String,
        #[source]
        source: NetworkError,
    },
    /// Experiment-wide settings out of range
    #[error("Invalid experiment settings: {0}")]
    InvalidSettings(String),
    #[error(transparent)]
    Data(#[from] ReutersError),
    /// Reading or writing a history file failed
    #[error("Failed to persist history at {}: {reason}", .path.display())]
    Persistence {
        path: std::path::PathBuf,
        reason: String,
    },
}

/// Vectorized train and test partitions
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub y_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array2<f64>,
    pub num_classes: usize,
}

/// Outcome of one build / fit / evaluate cycle
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Position of the network in the experiment
    pub index: usize,
    pub name: String,
    pub config: NetworkConfig,
    pub history: TrainingHistory,
    /// Test loss and accuracy
    pub score: Evaluation,
}

/// Runs the activation comparison described by an [`ExperimentConfig`].
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
}

impl Experiment {
    /// Creates an experiment after validating all of its settings.
    ///
    /// # Errors
    /// * `ExperimentError::ConfigInvalid` naming the first invalid network
    /// * `ExperimentError::InvalidSettings` for shared settings out of range
    pub fn new(config: ExperimentConfig) -> Result<Self, ExperimentError> {
        validate(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Loads the corpus at `corpus_path` and vectorizes it.
    pub fn prepare(&self, corpus_path: &Path) -> Result<PreparedData, ExperimentError> {
        println!("Loading data...");
        let (train, test) = reuters::load_data(corpus_path, &self.load_options())?;
        self.vectorize(&train, &test)
    }

    /// Same as [`Experiment::prepare`] for a corpus already in memory.
    pub fn prepare_corpus(&self, corpus: RawCorpus) -> Result<PreparedData, ExperimentError> {
        println!("Loading data...");
        let (train, test) = reuters::prepare(corpus, &self.load_options())?;
        self.vectorize(&train, &test)
    }

    fn load_options(&self) -> LoadOptions {
        LoadOptions::new(self.config.vocabulary_size, self.config.test_split)
    }

    fn vectorize(
        &self,
        train: &ReutersData,
        test: &ReutersData,
    ) -> Result<PreparedData, ExperimentError> {
        println!("{} train sequences", train.len());
        println!("{} test sequences", test.len());

        let encoder = LabelEncoder::fit(&train.labels())?;
        println!("{} classes", encoder.num_classes());

        println!("Vectorizing sequence data...");
        let vectorizer = Vectorizer::binary(self.config.vocabulary_size);
        let x_train = vectorizer.transform(train.examples());
        let x_test = vectorizer.transform(test.examples());
        println!("x_train shape: {:?}", x_train.dim());
        println!("x_test shape: {:?}", x_test.dim());

        println!("Convert class vector to binary class matrix");
        let y_train = encoder.encode(&train.labels())?;
        let y_test = encoder.encode(&test.labels())?;
        println!("y_train shape: {:?}", y_train.dim());
        println!("y_test shape: {:?}", y_test.dim());

        Ok(PreparedData {
            x_train,
            y_train,
            x_test,
            y_test,
            num_classes: encoder.num_classes(),
        })
    }

    /// Builds, fits and evaluates every network in order.
    ///
    /// The first failure aborts the remaining runs; results are only returned when all
    /// runs succeed.
    pub fn run(&self, data: &PreparedData) -> Result<[RunResult; 3], ExperimentError> {
        let mut shared = StdRng::seed_from_u64(self.shared_seed());
        let [first, second, third] = &self.config.networks;
        Ok([
            self.run_network(0, first, data, &mut shared)?,
            self.run_network(1, second, data, &mut shared)?,
            self.run_network(2, third, data, &mut shared)?,
        ])
    }

    /// Runs every network even when an earlier one fails.
    pub fn run_continuing(&self, data: &PreparedData) -> [Result<RunResult, ExperimentError>; 3] {
        let mut shared = StdRng::seed_from_u64(self.shared_seed());
        let [first, second, third] = &self.config.networks;
        [
            self.run_network(0, first, data, &mut shared),
            self.run_network(1, second, data, &mut shared),
            self.run_network(2, third, data, &mut shared),
        ]
    }

    fn shared_seed(&self) -> u64 {
        match self.config.seed_policy {
            SeedPolicy::PerRun(seed) | SeedPolicy::Shared(seed) => seed,
        }
    }

    fn run_network(
        &self,
        index: usize,
        network: &NamedNetwork,
        data: &PreparedData,
        shared: &mut StdRng,
    ) -> Result<RunResult, ExperimentError> {
        println!("\nBuilding network {index}...");
        let mut isolated;
        let rng: &mut StdRng = match self.config.seed_policy {
            SeedPolicy::PerRun(seed) => {
                isolated = StdRng::seed_from_u64(seed);
                &mut isolated
            }
            SeedPolicy::Shared(_) => shared,
        };

        let failed = |source: NetworkError| ExperimentError::TrainingFailed {
            network: network.name.clone(),
            source,
        };

        let mut model = Sequential::build(
            &network.config,
            self.config.vocabulary_size,
            data.num_classes,
            rng,
        )
        .map_err(|source| ExperimentError::ConfigInvalid {
            network: network.name.clone(),
            source,
        })?;
        tracing::debug!(network = %network.name, "\n{}", model.summary());

        let options = FitOptions {
            batch_size: self.config.batch_size,
            epochs: self.config.epochs,
            validation_split: self.config.validation_split,
            shuffle: true,
            verbose: self.config.verbose,
        };
        let history = model
            .fit(&data.x_train, &data.y_train, &options, rng)
            .map_err(failed)?;
        let score = model
            .evaluate(&data.x_test, &data.y_test, self.config.batch_size)
            .map_err(failed)?;

        tracing::info!(
            network = %network.name,
            test_loss = score.loss,
            test_accuracy = score.accuracy,
            "run complete"
        );

        Ok(RunResult {
            index,
            name: network.name.clone(),
            config: network.config.clone(),
            history,
            score,
        })
    }
}

fn validate(config: &ExperimentConfig) -> Result<(), ExperimentError> {
    for network in &config.networks {
        if network.name.trim().is_empty() {
            return Err(ExperimentError::InvalidSettings(
                "every network needs a name".to_string(),
            ));
        }
        network
            .config
            .validate()
            .map_err(|source| ExperimentError::ConfigInvalid {
                network: network.name.clone(),
                source,
            })?;
    }
    if config.vocabulary_size == 0 {
        return Err(ExperimentError::InvalidSettings(
            "vocabulary size must be at least 1".to_string(),
        ));
    }
    if config.batch_size == 0 || config.epochs == 0 {
        return Err(ExperimentError::InvalidSettings(format!(
            "batch size and epochs must be at least 1, got {} and {}",
            config.batch_size, config.epochs
        )));
    }
    // Both splits must leave data on each side; validation curves are always plotted.
    if !(config.validation_split > 0.0 && config.validation_split < 1.0) {
        return Err(ExperimentError::InvalidSettings(format!(
            "validation split must be in (0, 1), got {}",
            config.validation_split
        )));
    }
    if !(config.test_split > 0.0 && config.test_split < 1.0) {
        return Err(ExperimentError::InvalidSettings(format!(
            "test split must be in (0, 1), got {}",
            config.test_split
        )));
    }
    Ok(())
}
