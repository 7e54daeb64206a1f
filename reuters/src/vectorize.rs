//! Fixed-width bag-of-words features.
//!
//! Each document becomes a row of width `num_words` whose column `j` is 1 when token `j`
//! occurs in the document and 0 otherwise. Ids at or beyond `num_words` are ignored.

use crate::reuters::RawExample;
use ndarray::Array2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vectorizer {
    num_words: usize,
}

impl Vectorizer {
    /// Creates a binary-mode vectorizer over the first `num_words` token ids
    pub fn binary(num_words: usize) -> Self {
        Self { num_words }
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    /// Converts token sequences into an `(n, num_words)` presence matrix.
    pub fn sequences_to_matrix<S: AsRef<[u32]>>(&self, sequences: &[S]) -> Array2<f64> {
        let mut matrix = Array2::zeros((sequences.len(), self.num_words));
        for (mut row, sequence) in matrix.rows_mut().into_iter().zip(sequences) {
            for &token in sequence.as_ref() {
                if let Some(cell) = row.get_mut(token as usize) {
                    *cell = 1.0;
                }
            }
        }
        matrix
    }

    /// Vectorizes the token sequences of `examples`.
    pub fn transform(&self, examples: &[RawExample]) -> Array2<f64> {
        let sequences: Vec<&[u32]> = examples
            .iter()
            .map(|example| example.tokens.as_slice())
            .collect();
        self.sequences_to_matrix(&sequences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_not_counts() {
        let vectorizer = Vectorizer::binary(6);
        let matrix = vectorizer.sequences_to_matrix(&[vec![1u32, 3, 3, 3], vec![0, 5]]);
        assert_eq!(matrix.dim(), (2, 6));
        assert_eq!(matrix.row(0).to_vec(), vec![0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(matrix.row(1).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ids_beyond_width_are_ignored() {
        let vectorizer = Vectorizer::binary(4);
        let matrix = vectorizer.sequences_to_matrix(&[vec![2u32, 4, 1000]]);
        assert_eq!(matrix.row(0).to_vec(), vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_width_and_values_for_many_caps() {
        let examples: Vec<RawExample> = (0..20)
            .map(|i| RawExample {
                tokens: (0..(i * 7 % 13)).map(|t| (t * i) as u32 % 50).collect(),
                label: 0,
            })
            .collect();
        for k in [1, 2, 10, 49, 50, 64] {
            let matrix = Vectorizer::binary(k).transform(&examples);
            assert_eq!(matrix.dim(), (20, k));
            assert!(matrix.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    fn test_empty_document_is_all_zero() {
        let matrix = Vectorizer::binary(3).sequences_to_matrix(&[Vec::<u32>::new()]);
        assert_eq!(matrix.sum(), 0.0);
    }
}
