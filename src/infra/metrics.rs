// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:          0-based epoch index, as in the progress lines
//   - train_loss:     mean categorical cross-entropy over training batches
//   - val_loss:       mean loss over the test partition
//   - train_accuracy: fraction of training images classified correctly
//   - val_accuracy:   fraction of test images classified correctly
//
// Output file: <output_dir>/metrics.csv, recreated for every run
//
// Example CSV output:
//   epoch,train_loss,val_loss,train_accuracy,val_accuracy
//   0,1.612300,1.355100,0.412800,0.517600
//   1,1.221400,1.150900,0.566200,0.592300
//   ...

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::history::{EpochMetrics, TrainingHistory};

pub const CSV_HEADER: &str = "epoch,train_loss,val_loss,train_accuracy,val_accuracy";

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create `dir` if needed and start a fresh `metrics.csv`
    /// containing only the header row.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{CSV_HEADER}")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", csv_row(m))?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    /// Append every epoch of `history` in order
    pub fn log_history(&self, history: &TrainingHistory) -> Result<()> {
        history.epochs().iter().try_for_each(|m| self.log(m))
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Six decimal places for each metric
fn csv_row(m: &EpochMetrics) -> String {
    format!(
        "{},{:.6},{:.6},{:.6},{:.6}",
        m.epoch, m.train_loss, m.val_loss, m.train_accuracy, m.val_accuracy,
    )
}
