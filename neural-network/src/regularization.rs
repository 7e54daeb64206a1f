use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inverted dropout.
///
/// During training each activation is zeroed with probability `rate` and the survivors
/// are scaled by `1 / (1 - rate)`, so inference is the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    rate: f64,
    #[serde(skip)]
    mask: Option<Array2<f64>>,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self { rate, mask: None }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn forward<R: Rng + ?Sized>(
        &mut self,
        input: &Array2<f64>,
        training: bool,
        rng: &mut R,
    ) -> Array2<f64> {
        if !training || self.rate <= 0.0 {
            self.mask = None;
            return input.clone();
        }

        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let mask = Array2::from_shape_simple_fn(input.raw_dim(), || {
            if rng.random::<f64>() < keep { scale } else { 0.0 }
        });
        let output = input * &mask;
        self.mask = Some(mask);
        output
    }

    pub fn backward(&mut self, grad: Array2<f64>) -> Array2<f64> {
        match self.mask.take() {
            Some(mask) => grad * &mask,
            None => grad,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_inference_is_identity() {
        let mut dropout = Dropout::new(0.5);
        let mut rng = StdRng::seed_from_u64(1);
        let input = Array2::from_elem((4, 8), 2.0);
        assert_eq!(dropout.forward(&input, false, &mut rng), input);
    }

    #[test]
    fn test_training_zeroes_and_scales() {
        let mut dropout = Dropout::new(0.5);
        let mut rng = StdRng::seed_from_u64(1);
        let input = Array2::from_elem((50, 40), 1.0);
        let output = dropout.forward(&input, true, &mut rng);

        assert!(output.iter().all(|&x| x == 0.0 || x == 2.0));
        let kept = output.iter().filter(|&&x| x > 0.0).count() as f64;
        assert_relative_eq!(kept / 2000.0, 0.5, epsilon = 0.05);
    }

    #[test]
    fn test_backward_reuses_mask() {
        let mut dropout = Dropout::new(0.25);
        let mut rng = StdRng::seed_from_u64(9);
        let input = Array2::from_elem((3, 5), 1.0);
        let output = dropout.forward(&input, true, &mut rng);
        let grad = dropout.backward(Array2::from_elem((3, 5), 1.0));
        assert_eq!(grad, output);
    }
}
