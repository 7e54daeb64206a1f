use serde::{Deserialize, Serialize};

/// Per-epoch metrics recorded by [`crate::Sequential::fit`].
///
/// The four series always have the same length, one entry per completed epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Training loss for each epoch
    pub loss: Vec<f64>,
    /// Training accuracy for each epoch
    pub accuracy: Vec<f64>,
    /// Validation loss for each epoch
    pub val_loss: Vec<f64>,
    /// Validation accuracy for each epoch
    pub val_accuracy: Vec<f64>,
}

/// One row of a [`TrainingHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, loss: f64, accuracy: f64, val_loss: f64, val_accuracy: f64) {
        self.loss.push(loss);
        self.accuracy.push(accuracy);
        self.val_loss.push(val_loss);
        self.val_accuracy.push(val_accuracy);
    }

    /// Number of recorded epochs
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    /// Returns the history as one record per epoch, numbered from zero.
    pub fn records(&self) -> Vec<EpochRecord> {
        self.loss
            .iter()
            .zip(&self.accuracy)
            .zip(&self.val_loss)
            .zip(&self.val_accuracy)
            .enumerate()
            .map(
                |(epoch, (((&loss, &accuracy), &val_loss), &val_accuracy))| EpochRecord {
                    epoch,
                    loss,
                    accuracy,
                    val_loss,
                    val_accuracy,
                },
            )
            .collect()
    }

    /// Rebuilds a history from per-epoch records, ordered by epoch.
    pub fn from_records(records: &[EpochRecord]) -> Self {
        let mut sorted = records.to_vec();
        sorted.sort_by_key(|record| record.epoch);

        let mut history = Self::new();
        for record in sorted {
            history.record_epoch(
                record.loss,
                record.accuracy,
                record.val_loss,
                record.val_accuracy,
            );
        }
        history
    }

    /// Epoch index and value of the best validation accuracy
    pub fn best_val_accuracy(&self) -> Option<(usize, f64)> {
        self.val_accuracy
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best, (i, acc)| match best {
                Some((_, b)) if b >= acc => best,
                _ => Some((i, acc)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_recording() {
        let mut history = TrainingHistory::new();
        history.record_epoch(0.25, 0.855, 0.30, 0.80);
        history.record_epoch(0.15, 0.900, 0.20, 0.88);
        history.record_epoch(0.18, 0.880, 0.22, 0.86);

        assert_eq!(history.epochs(), 3);
        assert_eq!(history.loss, vec![0.25, 0.15, 0.18]);
        assert_eq!(history.val_accuracy, vec![0.80, 0.88, 0.86]);
        assert_eq!(history.best_val_accuracy(), Some((1, 0.88)));
    }

    #[test]
    fn test_records_are_shape_consistent() {
        let mut history = TrainingHistory::new();
        history.record_epoch(1.0, 0.1, 2.0, 0.2);
        history.record_epoch(0.5, 0.6, 1.5, 0.4);

        let records = history.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].epoch, 1);
        assert_eq!(records[1].val_loss, 1.5);

        let mut shuffled = records.clone();
        shuffled.reverse();
        assert_eq!(TrainingHistory::from_records(&shuffled), history);
    }

    #[test]
    fn test_empty_history() {
        let history = TrainingHistory::new();
        assert_eq!(history.epochs(), 0);
        assert!(history.records().is_empty());
        assert_eq!(history.best_val_accuracy(), None);
    }
}
