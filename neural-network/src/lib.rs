//! A small feed-forward training framework built on `ndarray`.
//!
//! Supports exactly what dense text classifiers need: dense layers, element-wise
//! activations, dropout, binary cross-entropy, and a handful of first-order optimizers.

// Modules
pub mod activations;
pub mod error;
pub mod initializers;
pub mod layer;
pub mod loss;
pub mod network;
pub mod network_config;
pub mod optimizer;
pub mod regularization;
pub mod training_history;

pub use activations::ActivationType;
pub use error::NetworkError;
pub use initializers::WeightInit;
pub use layer::{Dense, Layer};
pub use loss::Metric;
pub use network::{Evaluation, FitOptions, Sequential};
pub use network_config::{NetworkConfig, NetworkConfigBuilder};
pub use optimizer::OptimizerType;
pub use regularization::Dropout;
pub use training_history::{EpochRecord, TrainingHistory};
