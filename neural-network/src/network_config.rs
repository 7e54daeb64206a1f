use crate::activations::ActivationType;
use crate::error::NetworkError;
use crate::initializers::WeightInit;
use crate::optimizer::OptimizerType;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hyperparameters of a dense classifier.
///
/// The network is `layer_count` blocks of dense → activation → dropout, followed by a
/// dense output layer with a sigmoid.
///
/// Builder defaults describe a generic deep, narrow network; experiments override the
/// fields they care about.
///
/// # Example
///
/// ```
/// use neural_network::{ActivationType, NetworkConfigBuilder, WeightInit};
///
/// let config = NetworkConfigBuilder::default()
///     .layer_count(2)
///     .layer_width(256)
///     .activation(ActivationType::Relu)
///     .dropout_rate(0.5)
///     .weight_init(WeightInit::TruncatedNormal)
///     .build()
///     .unwrap();
/// assert_eq!(config.layer_count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "NetworkError"))]
pub struct NetworkConfig {
    /// Number of hidden dense blocks, at least one
    #[builder(default = "6")]
    pub layer_count: usize,

    /// Units in every hidden dense layer
    #[builder(default = "16")]
    pub layer_width: usize,

    /// Activation applied after every hidden dense layer
    #[builder(default = "ActivationType::Selu")]
    pub activation: ActivationType,

    /// Fraction of activations dropped after each hidden block, in [0, 1)
    #[builder(default = "0.1")]
    pub dropout_rate: f64,

    /// Initializer for every dense kernel
    #[builder(default = "WeightInit::RandomUniform")]
    pub weight_init: WeightInit,

    /// Optimizer used for every gradient step
    #[builder(default = "OptimizerType::Adam")]
    pub optimizer: OptimizerType,
}

impl NetworkConfig {
    /// Checks every hyperparameter against its valid range.
    pub fn validate(&self) -> Result<(), NetworkError> {
        check_layer_count(self.layer_count)?;
        check_layer_width(self.layer_width)?;
        check_dropout_rate(self.dropout_rate)
    }
}

impl NetworkConfigBuilder {
    fn validate(&self) -> Result<(), NetworkError> {
        if let Some(count) = self.layer_count {
            check_layer_count(count)?;
        }
        if let Some(width) = self.layer_width {
            check_layer_width(width)?;
        }
        if let Some(rate) = self.dropout_rate {
            check_dropout_rate(rate)?;
        }
        Ok(())
    }
}

fn check_layer_count(count: usize) -> Result<(), NetworkError> {
    if count < 1 {
        return Err(NetworkError::ConfigInvalid(format!(
            "layer_count must be at least 1, got {count}"
        )));
    }
    Ok(())
}

fn check_layer_width(width: usize) -> Result<(), NetworkError> {
    if width < 1 {
        return Err(NetworkError::ConfigInvalid(format!(
            "layer_width must be at least 1, got {width}"
        )));
    }
    Ok(())
}

fn check_dropout_rate(rate: f64) -> Result<(), NetworkError> {
    if !(0.0..1.0).contains(&rate) {
        return Err(NetworkError::ConfigInvalid(format!(
            "dropout_rate must be in [0, 1), got {rate}"
        )));
    }
    Ok(())
}

impl fmt::Display for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ layer_count: {}, layer_width: {}, activation: {}, dropout_rate: {}, weight_init: {}, optimizer: {} }}",
            self.layer_count,
            self.layer_width,
            self.activation,
            self.dropout_rate,
            self.weight_init,
            self.optimizer
        )
    }
}
