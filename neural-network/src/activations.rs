//! Element-wise activation functions.
//!
//! Activations are a closed set resolved from their conventional string names when a
//! configuration is parsed, so an unknown name is rejected before any model is built.

use crate::error::NetworkError;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SELU_ALPHA: f64 = 1.673_263_242_354_377_2;
const SELU_SCALE: f64 = 1.050_700_987_355_480_5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationType {
    Sigmoid,
    Tanh,
    Relu,
    Selu,
    Linear,
}

impl ActivationType {
    /// Applies the activation to every element of `z`.
    pub fn apply(&self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationType::Sigmoid => z.mapv(sigmoid),
            ActivationType::Tanh => z.mapv(f64::tanh),
            ActivationType::Relu => z.mapv(|x| x.max(0.0)),
            ActivationType::Selu => z.mapv(|x| {
                if x > 0.0 {
                    SELU_SCALE * x
                } else {
                    SELU_SCALE * SELU_ALPHA * (x.exp() - 1.0)
                }
            }),
            ActivationType::Linear => z.clone(),
        }
    }

    /// Derivative of the activation with respect to its input.
    ///
    /// Takes both the pre-activation `z` and the cached output `a = f(z)`; sigmoid and
    /// tanh are cheapest to differentiate from the output, the others from the input.
    pub fn derivative(&self, z: &Array2<f64>, a: &Array2<f64>) -> Array2<f64> {
        match self {
            ActivationType::Sigmoid => a.mapv(|y| y * (1.0 - y)),
            ActivationType::Tanh => a.mapv(|y| 1.0 - y * y),
            ActivationType::Relu => z.mapv(|x| if x > 0.0 { 1.0 } else { 0.0 }),
            ActivationType::Selu => Zip::from(z).and(a).map_collect(|&x, &y| {
                if x > 0.0 {
                    SELU_SCALE
                } else {
                    y + SELU_SCALE * SELU_ALPHA
                }
            }),
            ActivationType::Linear => Array2::ones(z.raw_dim()),
        }
    }

    /// Short name used when composing output file labels.
    pub fn short_name(&self) -> &'static str {
        match self {
            ActivationType::Sigmoid => "sigm",
            ActivationType::Tanh => "tanh",
            ActivationType::Relu => "relu",
            ActivationType::Selu => "selu",
            ActivationType::Linear => "lin",
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl FromStr for ActivationType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ActivationType::Sigmoid),
            "tanh" => Ok(ActivationType::Tanh),
            "relu" => Ok(ActivationType::Relu),
            "selu" => Ok(ActivationType::Selu),
            "linear" => Ok(ActivationType::Linear),
            other => Err(NetworkError::ConfigInvalid(format!(
                "unknown activation '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ActivationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivationType::Sigmoid => "sigmoid",
            ActivationType::Tanh => "tanh",
            ActivationType::Relu => "relu",
            ActivationType::Selu => "selu",
            ActivationType::Linear => "linear",
        };
        f.write_str(name)
    }
}
