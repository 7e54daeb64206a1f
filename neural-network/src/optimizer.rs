use crate::error::NetworkError;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of optimizer used to apply gradients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerType {
    Adam,
    Sgd,
    RmsProp,
}

impl OptimizerType {
    /// Creates a new optimizer instance with its conventional default settings
    pub fn create_optimizer(&self) -> Box<dyn Optimizer> {
        match self {
            OptimizerType::Adam => Box::new(Adam::default()),
            OptimizerType::Sgd => Box::new(Sgd::default()),
            OptimizerType::RmsProp => Box::new(RmsProp::default()),
        }
    }
}

impl FromStr for OptimizerType {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerType::Adam),
            "sgd" => Ok(OptimizerType::Sgd),
            "rmsprop" => Ok(OptimizerType::RmsProp),
            other => Err(NetworkError::ConfigInvalid(format!(
                "unknown optimizer '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OptimizerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizerType::Adam => "adam",
            OptimizerType::Sgd => "sgd",
            OptimizerType::RmsProp => "rmsprop",
        };
        f.write_str(name)
    }
}

/// Trait defining the interface for gradient-based optimizers.
///
/// Parameters are addressed by a stable slot index so stateful optimizers can keep
/// per-parameter moments between steps.
pub trait Optimizer: Send + Sync {
    /// Marks the start of a new update step (one mini-batch)
    fn begin_step(&mut self);

    /// Updates `param` in place from its gradient
    fn update(&mut self, slot: usize, param: &mut Array2<f64>, grad: &Array2<f64>);

    /// Returns the type of this optimizer
    fn optimizer_type(&self) -> OptimizerType;
}

/// Plain stochastic gradient descent: `w -= lr * g`
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Default for Sgd {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
        }
    }
}

impl Optimizer for Sgd {
    fn begin_step(&mut self) {}

    fn update(&mut self, _slot: usize, param: &mut Array2<f64>, grad: &Array2<f64>) {
        param.scaled_add(-self.learning_rate, grad);
    }

    fn optimizer_type(&self) -> OptimizerType {
        OptimizerType::Sgd
    }
}

/// Adam (Kingma & Ba, 2015) with bias-corrected moment estimates
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    step: i32,
    moments: Vec<Option<(Array2<f64>, Array2<f64>)>>,
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            step: 0,
            moments: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    fn update(&mut self, slot: usize, param: &mut Array2<f64>, grad: &Array2<f64>) {
        if self.moments.len() <= slot {
            self.moments.resize(slot + 1, None);
        }
        let (beta1, beta2) = (self.beta1, self.beta2);
        let lr_t = self.learning_rate * (1.0 - beta2.powi(self.step)).sqrt()
            / (1.0 - beta1.powi(self.step));
        let epsilon = self.epsilon;

        let Some(entry) = self.moments.get_mut(slot) else {
            return;
        };
        let (m, v) = entry.get_or_insert_with(|| {
            (Array2::zeros(param.raw_dim()), Array2::zeros(param.raw_dim()))
        });

        Zip::from(param)
            .and(m)
            .and(v)
            .and(grad)
            .for_each(|w, m, v, &g| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                *w -= lr_t * *m / (v.sqrt() + epsilon);
            });
    }

    fn optimizer_type(&self) -> OptimizerType {
        OptimizerType::Adam
    }
}

/// RMSprop: gradients scaled by a running average of their magnitude
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f64,
    pub rho: f64,
    pub epsilon: f64,
    averages: Vec<Option<Array2<f64>>>,
}

impl Default for RmsProp {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            rho: 0.9,
            epsilon: 1e-8,
            averages: Vec::new(),
        }
    }
}

impl Optimizer for RmsProp {
    fn begin_step(&mut self) {}

    fn update(&mut self, slot: usize, param: &mut Array2<f64>, grad: &Array2<f64>) {
        if self.averages.len() <= slot {
            self.averages.resize(slot + 1, None);
        }
        let (lr, rho, epsilon) = (self.learning_rate, self.rho, self.epsilon);

        let Some(entry) = self.averages.get_mut(slot) else {
            return;
        };
        let average = entry.get_or_insert_with(|| Array2::zeros(param.raw_dim()));

        Zip::from(param)
            .and(average)
            .and(grad)
            .for_each(|w, a, &g| {
                *a = rho * *a + (1.0 - rho) * g * g;
                *w -= lr * g / (a.sqrt() + epsilon);
            });
    }

    fn optimizer_type(&self) -> OptimizerType {
        OptimizerType::RmsProp
    }
}
