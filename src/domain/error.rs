// ============================================================
// Layer 3 — Pipeline Error Taxonomy
// ============================================================
// Every failure the training pipeline can surface to the caller.
// None of these are retried; they propagate synchronously to
// whoever pulled the trigger.
//
//   CorpusUnavailable      — dataset files missing or malformed
//   InvalidHyperparameters — configuration outside its domain,
//                            raised before any compute is spent
//   InvalidLabel           — class label outside 0..=9
//   MismatchedPartition    — image and label counts disagree
//   TrainingDiverged       — non-finite loss during fit
//
// The outer layers wrap these in anyhow::Error; tests and the
// CLI can still downcast to match on the variant.

use thiserror::Error;

use crate::domain::history::{EpochMetrics, TrainingHistory};

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The backing data source could not be read
    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),

    /// Hyperparameters (or run options) outside their documented ranges
    #[error("invalid hyperparameters: {0}")]
    InvalidHyperparameters(String),

    /// A class label that cannot be one-hot encoded
    #[error("invalid class label {label}: expected a value below {num_classes}")]
    InvalidLabel { label: usize, num_classes: usize },

    /// A partition whose image and label sequences have different lengths
    #[error("partition has {images} images but {labels} labels")]
    MismatchedPartition { images: usize, labels: usize },

    /// Non-finite numbers showed up while fitting.
    /// `history` holds every epoch that completed before the failure.
    #[error(
        "training diverged in epoch {epoch}: non-finite {phase} after {} completed epoch(s)",
        .history.len()
    )]
    TrainingDiverged {
        epoch:   usize,
        phase:   &'static str,
        history: TrainingHistory,
    },
}

impl PipelineError {
    /// Metrics of the last epoch that finished cleanly before a divergence
    pub fn last_good_epoch(&self) -> Option<&EpochMetrics> {
        match self {
            PipelineError::TrainingDiverged { history, .. } => history.last(),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
