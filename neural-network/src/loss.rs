//! Binary cross-entropy and the accuracy metrics tracked alongside it.

use ndarray::{Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Predictions are clipped away from 0 and 1 before taking logarithms
pub const EPSILON: f64 = 1e-7;

/// Mean binary cross-entropy over every output of every row.
pub fn binary_crossentropy(predicted: &Array2<f64>, target: &Array2<f64>) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let total = Zip::from(predicted)
        .and(target)
        .fold(0.0, |acc, &p, &t| {
            let p = p.clamp(EPSILON, 1.0 - EPSILON);
            acc - (t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        });
    total / predicted.len() as f64
}

/// Gradient of [`binary_crossentropy`] with respect to the predictions.
pub fn binary_crossentropy_gradient(predicted: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
    let n = predicted.len().max(1) as f64;
    Zip::from(predicted).and(target).map_collect(|&p, &t| {
        let p = p.clamp(EPSILON, 1.0 - EPSILON);
        (p - t) / (p * (1.0 - p)) / n
    })
}

/// Metric reported next to the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Fraction of individual outputs whose rounded value equals the target
    BinaryAccuracy,
    /// Fraction of rows whose arg-max output matches the arg-max target
    CategoricalAccuracy,
}

impl Metric {
    /// Resolves the generic "accuracy" metric for a network trained with binary
    /// cross-entropy, which compares every output independently.
    pub fn accuracy_for_binary_crossentropy() -> Self {
        Metric::BinaryAccuracy
    }

    pub fn compute(&self, predicted: &Array2<f64>, target: &Array2<f64>) -> f64 {
        match self {
            Metric::BinaryAccuracy => {
                if predicted.is_empty() {
                    return 0.0;
                }
                let hits = Zip::from(predicted).and(target).fold(0usize, |acc, &p, &t| {
                    if (p > 0.5) == (t > 0.5) { acc + 1 } else { acc }
                });
                hits as f64 / predicted.len() as f64
            }
            Metric::CategoricalAccuracy => {
                if predicted.nrows() == 0 {
                    return 0.0;
                }
                let hits = predicted
                    .axis_iter(Axis(0))
                    .zip(target.axis_iter(Axis(0)))
                    .filter(|(p, t)| argmax(*p) == argmax(*t))
                    .count();
                hits as f64 / predicted.nrows() as f64
            }
        }
    }
}

/// Index of the largest value in a row; the first one wins on ties.
pub fn argmax(row: ArrayView1<f64>) -> Option<usize> {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &x)| match best {
            Some((_, b)) if b >= x => best,
            _ => Some((i, x)),
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_binary_crossentropy_value() {
        let predicted = array![[0.8, 0.2]];
        let target = array![[1.0, 0.0]];
        let expected = -(0.8_f64.ln());
        assert_relative_eq!(binary_crossentropy(&predicted, &target), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_binary_crossentropy_is_finite_at_extremes() {
        let predicted = array![[0.0, 1.0]];
        let target = array![[1.0, 0.0]];
        let loss = binary_crossentropy(&predicted, &target);
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let predicted = array![[0.3, 0.6], [0.9, 0.1]];
        let target = array![[0.0, 1.0], [1.0, 0.0]];
        let gradient = binary_crossentropy_gradient(&predicted, &target);
        let h = 1e-7;
        for ((r, c), g) in gradient.indexed_iter() {
            let mut plus = predicted.clone();
            plus[[r, c]] += h;
            let mut minus = predicted.clone();
            minus[[r, c]] -= h;
            let numeric = (binary_crossentropy(&plus, &target)
                - binary_crossentropy(&minus, &target))
                / (2.0 * h);
            assert_relative_eq!(*g, numeric, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_binary_accuracy_counts_every_output() {
        let predicted = array![[0.9, 0.4, 0.6], [0.1, 0.2, 0.3]];
        let target = array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert_relative_eq!(
            Metric::BinaryAccuracy.compute(&predicted, &target),
            4.0 / 6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_categorical_accuracy_uses_argmax() {
        let predicted = array![[0.9, 0.4, 0.6], [0.1, 0.2, 0.3]];
        let target = array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_relative_eq!(
            Metric::CategoricalAccuracy.compute(&predicted, &target),
            0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(array![0.1, 0.7, 0.7].view()), Some(1));
        assert_eq!(argmax(ndarray::Array1::<f64>::zeros(0).view()), None);
    }
}
