//! Defines the layers a sequential network is assembled from.
//!
//! Each layer caches what it needs from the forward pass so that `backward` can turn the
//! gradient of its output into the gradient of its input.
use crate::activations::ActivationType;
use crate::error::NetworkError;
use crate::initializers::WeightInit;
use crate::regularization::Dropout;
use ndarray::{Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully-connected layer computing `x · kernel + bias`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// `inputs x units` weight matrix
    kernel: Array2<f64>,
    /// `1 x units` bias row
    bias: Array2<f64>,
    #[serde(skip)]
    input: Option<Array2<f64>>,
    #[serde(skip)]
    grad_kernel: Option<Array2<f64>>,
    #[serde(skip)]
    grad_bias: Option<Array2<f64>>,
}

impl Dense {
    /// Creates a new [`Dense`] layer with an initialized kernel and zero bias.
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        units: usize,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            kernel: init.kernel(inputs, units, rng)?,
            bias: Array2::zeros((1, units)),
            input: None,
            grad_kernel: None,
            grad_bias: None,
        })
    }

    pub fn inputs(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn units(&self) -> usize {
        self.kernel.ncols()
    }

    pub fn kernel(&self) -> &Array2<f64> {
        &self.kernel
    }

    pub fn bias(&self) -> &Array2<f64> {
        &self.bias
    }

    pub fn forward(&mut self, input: &Array2<f64>, training: bool) -> Array2<f64> {
        let output = input.dot(&self.kernel) + &self.bias;
        self.input = training.then(|| input.clone());
        output
    }

    pub fn backward(&mut self, grad: Array2<f64>) -> Array2<f64> {
        if let Some(input) = self.input.take() {
            self.grad_kernel = Some(input.t().dot(&grad));
            self.grad_bias = Some(grad.sum_axis(Axis(0)).insert_axis(Axis(0)));
        }
        grad.dot(&self.kernel.t())
    }

    /// Hands the kernel and bias to `update` together with their pending gradients.
    pub(crate) fn apply_gradients<F>(&mut self, mut update: F)
    where
        F: FnMut(&mut Array2<f64>, &Array2<f64>),
    {
        if let (Some(grad_kernel), Some(grad_bias)) =
            (self.grad_kernel.take(), self.grad_bias.take())
        {
            update(&mut self.kernel, &grad_kernel);
            update(&mut self.bias, &grad_bias);
        }
    }
}

/// An activation step with its cached forward values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activation {
    kind: ActivationType,
    #[serde(skip)]
    cache: Option<(Array2<f64>, Array2<f64>)>,
}

impl Activation {
    pub fn new(kind: ActivationType) -> Self {
        Self { kind, cache: None }
    }

    pub fn kind(&self) -> ActivationType {
        self.kind
    }

    pub fn forward(&mut self, input: &Array2<f64>, training: bool) -> Array2<f64> {
        let output = self.kind.apply(input);
        self.cache = training.then(|| (input.clone(), output.clone()));
        output
    }

    pub fn backward(&mut self, grad: Array2<f64>) -> Array2<f64> {
        match self.cache.take() {
            Some((input, output)) => grad * self.kind.derivative(&input, &output),
            None => grad,
        }
    }
}

/// Represents a single layer in the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Dense(Dense),
    Activation(Activation),
    Dropout(Dropout),
}

impl Layer {
    pub fn forward<R: Rng + ?Sized>(
        &mut self,
        input: &Array2<f64>,
        training: bool,
        rng: &mut R,
    ) -> Array2<f64> {
        match self {
            Layer::Dense(dense) => dense.forward(input, training),
            Layer::Activation(activation) => activation.forward(input, training),
            Layer::Dropout(dropout) => dropout.forward(input, training, rng),
        }
    }

    pub fn backward(&mut self, grad: Array2<f64>) -> Array2<f64> {
        match self {
            Layer::Dense(dense) => dense.backward(grad),
            Layer::Activation(activation) => activation.backward(grad),
            Layer::Dropout(dropout) => dropout.backward(grad),
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Layer::Dense(_))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Layer::Dense(dense) => write!(
                f,
                "{{ dense: {} -> {}, params: {} }}",
                dense.inputs(),
                dense.units(),
                dense.kernel.len() + dense.bias.len()
            ),
            Layer::Activation(activation) => write!(f, "{{ activation: {} }}", activation.kind),
            Layer::Dropout(dropout) => write!(f, "{{ dropout: {} }}", dropout.rate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_dense_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut dense = Dense::new(4, 3, WeightInit::GlorotUniform, &mut rng).unwrap();
        let output = dense.forward(&Array2::ones((2, 4)), true);
        assert_eq!(output.dim(), (2, 3));

        let grad_input = dense.backward(Array2::ones((2, 3)));
        assert_eq!(grad_input.dim(), (2, 4));
    }

    #[test]
    fn test_dense_gradients() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut dense = Dense::new(2, 1, WeightInit::Zeros, &mut rng).unwrap();
        let input = array![[1.0, 2.0], [3.0, 4.0]];
        dense.forward(&input, true);
        dense.backward(array![[1.0], [0.5]]);

        let mut seen = Vec::new();
        dense.apply_gradients(|_, grad| seen.push(grad.clone()));
        assert_eq!(seen.len(), 2);
        assert_relative_eq!(seen[0][[0, 0]], 2.5, epsilon = 1e-12);
        assert_relative_eq!(seen[0][[1, 0]], 4.0, epsilon = 1e-12);
        assert_relative_eq!(seen[1][[0, 0]], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_inference_does_not_cache() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut dense = Dense::new(2, 2, WeightInit::RandomUniform, &mut rng).unwrap();
        dense.forward(&Array2::ones((1, 2)), false);
        dense.backward(Array2::ones((1, 2)));

        let mut calls = 0;
        dense.apply_gradients(|_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_display() {
        let layer = Layer::Activation(Activation::new(ActivationType::Tanh));
        assert_eq!(layer.to_string(), "{ activation: tanh }");
    }
}
