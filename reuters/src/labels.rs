//! One-hot label encoding.

use crate::reuters::ReutersError;
use ndarray::Array2;

/// One-hot encoder whose width is fixed from the training labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEncoder {
    num_classes: usize,
}

impl LabelEncoder {
    /// Derives the class count as `max(label) + 1` over the training labels.
    ///
    /// # Errors
    /// * `ReutersError::EmptyCorpus` if there are no labels
    /// * `ReutersError::DataMismatch` if the largest label leaves no room for a class count
    pub fn fit(train_labels: &[usize]) -> Result<Self, ReutersError> {
        let max = train_labels
            .iter()
            .copied()
            .max()
            .ok_or(ReutersError::EmptyCorpus)?;
        let num_classes = max.checked_add(1).ok_or_else(|| {
            ReutersError::DataMismatch(format!("label {max} is too large to encode"))
        })?;
        Ok(Self { num_classes })
    }

    pub fn with_classes(num_classes: usize) -> Self {
        Self { num_classes }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Encodes `labels` as an `(n, num_classes)` one-hot matrix.
    ///
    /// # Errors
    /// * `ReutersError::LabelOutOfRange` for a label without a column
    pub fn encode(&self, labels: &[usize]) -> Result<Array2<f64>, ReutersError> {
        let mut matrix = Array2::zeros((labels.len(), self.num_classes));
        for (mut row, &label) in matrix.rows_mut().into_iter().zip(labels) {
            let cell = row.get_mut(label).ok_or(ReutersError::LabelOutOfRange {
                label,
                num_classes: self.num_classes,
            })?;
            *cell = 1.0;
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_count_from_training_labels() {
        let encoder = LabelEncoder::fit(&[3, 0, 7, 2]).unwrap();
        assert_eq!(encoder.num_classes(), 8);
    }

    #[test]
    fn test_exactly_one_hot_per_row() {
        let labels = [3, 0, 7, 2, 7];
        let encoder = LabelEncoder::fit(&labels).unwrap();
        let matrix = encoder.encode(&labels).unwrap();
        assert_eq!(matrix.dim(), (5, 8));
        for (row, &label) in matrix.rows().into_iter().zip(&labels) {
            assert_eq!(row.sum(), 1.0);
            assert_eq!(row[label], 1.0);
        }
    }

    #[test]
    fn test_test_label_beyond_training_range() {
        let encoder = LabelEncoder::fit(&[0, 1, 2]).unwrap();
        match encoder.encode(&[1, 3]) {
            Err(ReutersError::LabelOutOfRange { label, num_classes }) => {
                assert_eq!(label, 3);
                assert_eq!(num_classes, 3);
            }
            other => panic!("Expected LabelOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn test_largest_possible_label_is_rejected() {
        assert!(matches!(
            LabelEncoder::fit(&[0, usize::MAX]),
            Err(ReutersError::DataMismatch(_))
        ));
    }

    #[test]
    fn test_no_labels() {
        assert!(matches!(LabelEncoder::fit(&[]), Err(ReutersError::EmptyCorpus)));
    }
}
