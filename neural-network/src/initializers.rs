//! Kernel weight initializers.

use crate::error::NetworkError;
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spread used by the fixed-scale initializers.
const INIT_SCALE: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightInit {
    /// Normal(0, 0.05) with samples beyond two standard deviations redrawn
    TruncatedNormal,
    /// Uniform in [-0.05, 0.05]
    RandomUniform,
    /// Normal(0, 0.05)
    RandomNormal,
    /// Uniform in [-limit, limit] with limit = sqrt(6 / (fan_in + fan_out))
    GlorotUniform,
    Zeros,
}

impl WeightInit {
    /// Samples a `fan_in x fan_out` kernel.
    pub fn kernel<R: Rng + ?Sized>(
        &self,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, NetworkError> {
        let shape = (fan_in, fan_out);
        let kernel = match self {
            WeightInit::TruncatedNormal => {
                let normal = normal(INIT_SCALE)?;
                let bound = 2.0 * INIT_SCALE;
                Array2::from_shape_simple_fn(shape, || loop {
                    let x = normal.sample(rng);
                    if x.abs() <= bound {
                        break x;
                    }
                })
            }
            WeightInit::RandomUniform => {
                let uniform = uniform(INIT_SCALE)?;
                Array2::from_shape_simple_fn(shape, || uniform.sample(rng))
            }
            WeightInit::RandomNormal => {
                let normal = normal(INIT_SCALE)?;
                Array2::from_shape_simple_fn(shape, || normal.sample(rng))
            }
            WeightInit::GlorotUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
                let uniform = uniform(limit)?;
                Array2::from_shape_simple_fn(shape, || uniform.sample(rng))
            }
            WeightInit::Zeros => Array2::zeros(shape),
        };
        Ok(kernel)
    }
}

fn normal(std_dev: f64) -> Result<Normal<f64>, NetworkError> {
    Normal::new(0.0, std_dev).map_err(|e| NetworkError::ConfigInvalid(e.to_string()))
}

fn uniform(limit: f64) -> Result<Uniform<f64>, NetworkError> {
    Uniform::new_inclusive(-limit, limit).map_err(|e| NetworkError::ConfigInvalid(e.to_string()))
}

impl FromStr for WeightInit {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "truncatednormal" => Ok(WeightInit::TruncatedNormal),
            "randomuniform" => Ok(WeightInit::RandomUniform),
            "randomnormal" => Ok(WeightInit::RandomNormal),
            "glorotuniform" => Ok(WeightInit::GlorotUniform),
            "zeros" => Ok(WeightInit::Zeros),
            _ => Err(NetworkError::ConfigInvalid(format!(
                "unknown weight initializer '{s}'"
            ))),
        }
    }
}

impl fmt::Display for WeightInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeightInit::TruncatedNormal => "TruncatedNormal",
            WeightInit::RandomUniform => "RandomUniform",
            WeightInit::RandomNormal => "RandomNormal",
            WeightInit::GlorotUniform => "GlorotUniform",
            WeightInit::Zeros => "Zeros",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_truncated_normal_is_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let kernel = WeightInit::TruncatedNormal.kernel(40, 30, &mut rng).unwrap();
        assert_eq!(kernel.dim(), (40, 30));
        assert!(kernel.iter().all(|w| w.abs() <= 0.1));
        assert!(kernel.iter().any(|w| *w != 0.0));
    }

    #[test]
    fn test_glorot_uniform_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let kernel = WeightInit::GlorotUniform.kernel(10, 14, &mut rng).unwrap();
        let limit = (6.0_f64 / 24.0).sqrt();
        assert!(kernel.iter().all(|w| w.abs() <= limit));
    }

    #[test]
    fn test_same_seed_same_kernel() {
        let a = WeightInit::RandomUniform
            .kernel(5, 5, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let b = WeightInit::RandomUniform
            .kernel(5, 5, &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "TruncatedNormal".parse::<WeightInit>().ok(),
            Some(WeightInit::TruncatedNormal)
        );
        assert_eq!(
            "glorot_uniform".parse::<WeightInit>().ok(),
            Some(WeightInit::GlorotUniform)
        );
        assert!("he_normal".parse::<WeightInit>().is_err());
    }
}
