// ============================================================
// Layer 6 — Run Store
// ============================================================
// Owns the output directory of a training run. Models are not
// persisted; what gets written is the record of the run:
//
//   <output_dir>/
//     train_config.json     ← effective TrainConfig
//     run_summary.json      ← hyperparameters + outcome
//     metrics.csv           ← per-epoch history (MetricsLogger)
//     training_curves.png   ← loss / accuracy chart
//     samples.png           ← 5 × 5 training images
//     predictions.png       ← 5 × 5 test images with predictions
//
// Every file is rewritten by the next run into the same directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::history::{TrainingHistory, TrainingReport};
use crate::domain::hyperparams::HyperparameterSet;

const CONFIG_FILE:      &str = "train_config.json";
const SUMMARY_FILE:     &str = "run_summary.json";
const CHART_FILE:       &str = "training_curves.png";
const SAMPLES_FILE:     &str = "samples.png";
const PREDICTIONS_FILE: &str = "predictions.png";

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { report: TrainingReport },
    Diverged { epoch: usize, phase: String, history: TrainingHistory },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub hyperparameters: HyperparameterSet,
    pub batch_size:      usize,
    pub learning_rate:   f64,
    pub corpus:          String,
    pub train_images:    usize,
    pub test_images:     usize,
    pub outcome:         RunOutcome,
}

pub struct RunStore {
    dir: PathBuf,
}

impl RunStore {
    /// Create the output directory (and parents) if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chart_path(&self) -> PathBuf {
        self.dir.join(CHART_FILE)
    }

    pub fn samples_path(&self) -> PathBuf {
        self.dir.join(SAMPLES_FILE)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.dir.join(PREDICTIONS_FILE)
    }

    /// Write the effective configuration before training starts
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        write_json(&path, cfg)?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        read_json(&self.dir.join(CONFIG_FILE))
    }

    pub fn save_summary(&self, summary: &RunSummary) -> Result<()> {
        let path = self.dir.join(SUMMARY_FILE);
        write_json(&path, summary)?;
        tracing::info!("Saved run summary to '{}'", path.display());
        Ok(())
    }

    pub fn load_summary(&self) -> Result<RunSummary> {
        read_json(&self.dir.join(SUMMARY_FILE))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::history::EpochMetrics;

    fn summary(outcome: RunOutcome) -> RunSummary {
        RunSummary {
            hyperparameters: HyperparameterSet::default(),
            batch_size:      64,
            learning_rate:   1e-3,
            corpus:          "synthetic".into(),
            train_images:    100,
            test_images:     20,
            outcome,
        }
    }

    #[test]
    fn test_creates_nested_dir() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = RunStore::new(tmp.path().join("a").join("b")).unwrap();
        assert!(store.dir().is_dir());
        assert_eq!(store.chart_path(), store.dir().join("training_curves.png"));
    }

    #[test]
    fn test_config_survives_save_and_load() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = RunStore::new(tmp.path()).unwrap();
        let cfg   = TrainConfig { batch_size: 32, ..TrainConfig::default() };

        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
    }

    #[test]
    fn test_summary_records_divergence() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = RunStore::new(tmp.path()).unwrap();

        let mut history = TrainingHistory::new();
        history.record(EpochMetrics::new(0, 2.0, 2.1, 0.2, 0.2));
        let s = summary(RunOutcome::Diverged { epoch: 1, phase: "training loss".into(), history });

        store.save_summary(&s).unwrap();
        let text = fs::read_to_string(tmp.path().join("run_summary.json")).unwrap();
        assert!(text.contains("\"status\": \"diverged\""));
        assert_eq!(store.load_summary().unwrap(), s);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let tmp   = tempfile::tempdir().unwrap();
        let store = RunStore::new(tmp.path()).unwrap();
        let err   = store.load_config().unwrap_err();
        assert!(err.to_string().contains("train_config.json"));
    }
}
