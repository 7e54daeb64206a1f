use neural_network::{ActivationType, NetworkConfig, OptimizerType, WeightInit};
use serde::{Deserialize, Serialize};

/// Number of networks compared in one experiment
pub const NETWORK_COUNT: usize = 3;

/// How the random generator is seeded across the compared runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedPolicy {
    /// Every run starts from a generator seeded with the same value, so runs are
    /// isolated from each other and individually reproducible
    PerRun(u64),
    /// One generator is seeded once and consumed by all runs in order, so each run's
    /// initialization depends on the runs before it
    Shared(u64),
}

impl Default for SeedPolicy {
    fn default() -> Self {
        SeedPolicy::PerRun(42)
    }
}

/// A network configuration with the name it is reported under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedNetwork {
    pub name: String,
    pub config: NetworkConfig,
}

impl NamedNetwork {
    pub fn new(name: impl Into<String>, config: NetworkConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Configuration shared by every run of the activation comparison.
///
/// Vocabulary size, batch size and epoch count are common to all runs so that the
/// networks differ only in their own hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Vocabulary cap, which is also the width of every feature vector
    pub vocabulary_size: usize,
    pub batch_size: usize,
    pub epochs: usize,
    /// Fraction of the training rows held out for per-epoch validation
    pub validation_split: f64,
    /// Fraction of the corpus held out for the final evaluation
    pub test_split: f64,
    pub seed_policy: SeedPolicy,
    /// Show per-epoch progress bars while fitting
    pub verbose: bool,
    pub networks: [NamedNetwork; NETWORK_COUNT],
}

/// Two hidden layers of 256 units with heavy dropout; only the activation varies.
fn comparison_network(activation: ActivationType) -> NetworkConfig {
    NetworkConfig {
        layer_count: 2,
        layer_width: 256,
        activation,
        dropout_rate: 0.5,
        weight_init: WeightInit::TruncatedNormal,
        optimizer: OptimizerType::Adam,
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            vocabulary_size: 1000,
            batch_size: 16,
            epochs: 20,
            validation_split: 0.1,
            test_split: 0.2,
            seed_policy: SeedPolicy::default(),
            verbose: true,
            networks: [
                NamedNetwork::new("Sigmoid", comparison_network(ActivationType::Sigmoid)),
                NamedNetwork::new("Tanh", comparison_network(ActivationType::Tanh)),
                NamedNetwork::new("ReLU", comparison_network(ActivationType::Relu)),
            ],
        }
    }
}

impl ExperimentConfig {
    /// Label joining the short activation names, e.g. `sigm_tanh_relu`
    pub fn label(&self) -> String {
        self.networks
            .iter()
            .map(|network| network.config.activation.short_name())
            .collect::<Vec<_>>()
            .join("_")
    }
}
