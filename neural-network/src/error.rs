use thiserror::Error;

/// Errors raised while building, training, or evaluating a network
#[derive(Debug, Error)]
pub enum NetworkError {
    /// A hyperparameter is out of range or names an unknown option
    #[error("Invalid network configuration: {0}")]
    ConfigInvalid(String),
    /// Input or target arrays do not have the shape the network expects
    #[error("Shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// No rows were supplied where at least one is required
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),
    /// Validation split outside [0, 1) or leaving no training rows
    #[error("Invalid validation split {0}: must be in [0, 1) and leave training data")]
    InvalidValidationSplit(f64),
    /// Loss became NaN or infinite
    #[error("Non-finite loss encountered in epoch {epoch}")]
    NonFiniteLoss { epoch: usize },
}

impl From<derive_builder::UninitializedFieldError> for NetworkError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        NetworkError::ConfigInvalid(err.to_string())
    }
}
