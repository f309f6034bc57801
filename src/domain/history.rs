// ============================================================
// Layer 3 — Training History and Progress Events
// ============================================================
// EpochMetrics   — one row per completed epoch
// TrainingHistory — the ordered rows; append-only while a run
//                  is in flight, read-only once it is handed out
// ProgressEvent  — the slimmer per-epoch notification sent to
//                  the Progress Reporter
// TrainingReport — history plus the final held-out evaluation

use serde::{Deserialize, Serialize};

/// Loss and accuracy for one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 0-based epoch index
    pub epoch: usize,

    /// Mean categorical cross-entropy over the training batches
    pub train_loss: f64,

    /// Mean categorical cross-entropy over the test partition
    pub val_loss: f64,

    /// Fraction of training samples classified correctly, in [0, 1]
    pub train_accuracy: f64,

    /// Fraction of test samples classified correctly, in [0, 1]
    pub val_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(
        epoch:          usize,
        train_loss:     f64,
        val_loss:       f64,
        train_accuracy: f64,
        val_accuracy:   f64,
    ) -> Self {
        Self { epoch, train_loss, val_loss, train_accuracy, val_accuracy }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    epochs: Vec<EpochMetrics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the orchestrator appends; everyone else gets `&TrainingHistory`
    pub(crate) fn record(&mut self, metrics: EpochMetrics) {
        self.epochs.push(metrics);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    pub fn train_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.train_loss).collect()
    }

    pub fn val_losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_loss).collect()
    }

    pub fn train_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.train_accuracy).collect()
    }

    pub fn val_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|m| m.val_accuracy).collect()
    }
}

/// Emitted once per completed epoch, consumed by a ProgressSink
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressEvent {
    pub epoch_index: usize,
    pub loss:        f64,
    pub accuracy:    f64,
}

impl From<&EpochMetrics> for ProgressEvent {
    fn from(m: &EpochMetrics) -> Self {
        Self { epoch_index: m.epoch, loss: m.train_loss, accuracy: m.train_accuracy }
    }
}

/// What a successful run hands back to its caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub history:       TrainingHistory,
    pub test_loss:     f64,
    pub test_accuracy: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> TrainingHistory {
        let mut h = TrainingHistory::new();
        h.record(EpochMetrics::new(0, 1.9, 1.7, 0.30, 0.38));
        h.record(EpochMetrics::new(1, 1.4, 1.3, 0.49, 0.52));
        h
    }

    #[test]
    fn test_series_follow_epoch_order() {
        let h = sample_history();
        assert_eq!(h.len(), 2);
        assert_eq!(h.train_losses(), vec![1.9, 1.4]);
        assert_eq!(h.val_losses(), vec![1.7, 1.3]);
        assert_eq!(h.train_accuracies(), vec![0.30, 0.49]);
        assert_eq!(h.val_accuracies(), vec![0.38, 0.52]);
        assert_eq!(h.last().map(|m| m.epoch), Some(1));
    }

    #[test]
    fn test_progress_event_carries_training_metrics() {
        let m = EpochMetrics::new(4, 0.8, 0.9, 0.71, 0.66);
        let event = ProgressEvent::from(&m);
        assert_eq!(event.epoch_index, 4);
        assert_eq!(event.loss, 0.8);
        assert_eq!(event.accuracy, 0.71);
    }

    #[test]
    fn test_empty_history() {
        let h = TrainingHistory::new();
        assert!(h.is_empty());
        assert!(h.last().is_none());
        assert!(h.train_losses().is_empty());
    }
}
