// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams between the pipeline and the outside world:
//
//   CorpusProvider — where the labelled images come from
//                    (CIFAR-10 binaries on disk, a synthetic
//                    generator for offline runs and tests)
//   ProgressSink   — where live progress goes
//                    (terminal, nowhere, a recorder in tests)
//
// The application layer only sees these traits, so both ends
// can be swapped without touching the training code.

use crate::domain::corpus::ImageCorpus;
use crate::domain::error::PipelineResult;
use crate::domain::history::ProgressEvent;

// ─── CorpusProvider ───────────────────────────────────────────────────────────
/// Any source of a labelled, pre-split image corpus.
///
/// Implementations:
///   - Cifar10Loader   → CIFAR-10 binary batch files
///   - SyntheticCorpus → seeded random images
pub trait CorpusProvider {
    /// Load the training and test partitions.
    /// Fails with `CorpusUnavailable` when the source cannot be read.
    fn load(&self) -> PipelineResult<ImageCorpus>;

    /// Short description for log lines
    fn describe(&self) -> String;
}

// ─── ProgressSink ─────────────────────────────────────────────────────────────
/// Observer invoked in-line by the training pipeline.
///
/// Neither method can fail: a sink that cannot display something
/// logs the problem and carries on, so a broken terminal never
/// aborts a training run.
pub trait ProgressSink {
    /// Called once after every completed epoch
    fn on_epoch_end(&mut self, event: &ProgressEvent);

    /// Coarse progress in [0, 1] for loading and post-training work
    fn tick(&mut self, fraction: f32);

    /// A new coarse-grained phase starts; ticks restart from 0
    fn begin_phase(&mut self, _label: &str) {}

    /// The current phase is done
    fn finish_phase(&mut self, _message: &str) {}
}
