// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// One trigger = one full run, in order:
//
//   Step 1: Validate hyperparameters        (Layer 3 - domain)
//   Step 2: Save the effective config       (Layer 6 - infra)
//   Step 3: Load the corpus                 (Layer 4 - data)
//   Step 4: Publish training images         (Layer 6 - session)
//   Step 5: Normalize images, encode labels (Layer 4 - data)
//   Step 6: Build the model                 (Layer 5 - ml)
//   Step 7: Run training + evaluation       (Layer 5 - ml)
//   Step 8: Metrics CSV, chart, galleries   (Layer 6 - infra)
//   Step 9: Publish the trained model       (Layer 6 - session)
//
// A diverged run still writes its partial metrics and summary
// and publishes the restored model before the error is returned.

use anyhow::{Context, Result};
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::data::{
    encoder::encode,
    loader::Cifar10Loader,
    synthetic::SyntheticCorpus,
};
use crate::domain::{
    error::PipelineError,
    history::TrainingReport,
    hyperparams::{HyperparameterSet, InputActivation, OutputActivation},
    traits::{CorpusProvider, ProgressSink},
};
use crate::infra::{
    chart::MetricsChart,
    gallery::{self, ImageGallery, GALLERY_SIZE},
    metrics::MetricsLogger,
    progress::sweep,
    run_store::{RunOutcome, RunStore, RunSummary},
    session::{SessionContext, TrainedModel},
};
use crate::ml::{
    inferencer::Inferencer,
    model::build,
    trainer::{self, TrainingOptions, DEFAULT_BATCH_SIZE, DEFAULT_LEARNING_RATE},
};

/// Steps of the fixed-increment bar around loading and decoration
const SWEEP_STEPS: usize = 100;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything one run needs. Missing fields in a JSON config file
// fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub input_activation:    InputActivation,
    pub output_activation:   OutputActivation,
    pub hidden_width:        usize,
    pub epochs:              usize,
    pub batch_size:          usize,
    pub learning_rate:       f64,
    pub seed:                u64,
    pub data_dir:            String,
    pub output_dir:          String,
    pub synthetic:           bool,
    pub synthetic_train_len: usize,
    pub synthetic_test_len:  usize,
    pub progress_delay_ms:   u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let h = HyperparameterSet::default();
        Self {
            input_activation:    h.input_activation,
            output_activation:   h.output_activation,
            hidden_width:        h.hidden_width,
            epochs:              h.epoch_count,
            batch_size:          DEFAULT_BATCH_SIZE,
            learning_rate:       DEFAULT_LEARNING_RATE,
            seed:                42,
            data_dir:            "data/cifar-10-batches-bin".to_string(),
            output_dir:          "runs/latest".to_string(),
            synthetic:           false,
            synthetic_train_len: 5_000,
            synthetic_test_len:  1_000,
            progress_delay_ms:   10,
        }
    }
}

impl TrainConfig {
    /// Read a (possibly partial) config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn hyperparameters(&self) -> HyperparameterSet {
        HyperparameterSet::new(
            self.input_activation,
            self.output_activation,
            self.hidden_width,
            self.epochs,
        )
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            batch_size:    self.batch_size,
            learning_rate: self.learning_rate,
            shuffle_seed:  self.seed,
        }
    }

    /// CIFAR-10 files from `data_dir`, or the seeded synthetic corpus
    pub fn corpus_provider(&self) -> Box<dyn CorpusProvider> {
        if self.synthetic {
            Box::new(SyntheticCorpus::new(
                self.synthetic_train_len,
                self.synthetic_test_len,
                self.seed,
            ))
        } else {
            Box::new(Cifar10Loader::new(&self.data_dir))
        }
    }

    fn progress_delay(&self) -> Duration {
        Duration::from_millis(self.progress_delay_ms)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute one full run on backend `B`. The trained model is
    /// published to `session` on the inner (non-autodiff) backend.
    pub fn execute<B: AutodiffBackend>(
        &self,
        session:  &mut SessionContext<B::InnerBackend>,
        reporter: &mut dyn ProgressSink,
        device:   &B::Device,
    ) -> Result<TrainingReport> {
        let cfg = &self.config;

        // ── Step 1: Validate before touching anything ─────────────────────────
        let hparams = cfg.hyperparameters();
        let options = cfg.training_options();
        hparams.validate().context("Invalid hyperparameters")?;
        options.validate().context("Invalid training options")?;

        // ── Step 2: Output directory + effective config ───────────────────────
        let store = RunStore::new(&cfg.output_dir)?;
        store.save_config(cfg)?;

        // ── Step 3: Load the corpus ───────────────────────────────────────────
        let provider = cfg.corpus_provider();
        tracing::info!("Loading images from {}", provider.describe());
        reporter.begin_phase("Loading images");
        let corpus = provider
            .load()
            .with_context(|| format!("Could not load {}", provider.describe()))?;
        sweep(reporter, SWEEP_STEPS, cfg.progress_delay());
        reporter.finish_phase("Image dataset loading completed!");

        // ── Step 4: Publish raw training images ───────────────────────────────
        session.publish_training_set(corpus.train().clone());

        let train = corpus.train();
        let offset = gallery::DEFAULT_OFFSET.min(train.len().saturating_sub(GALLERY_SIZE));
        ImageGallery::new(store.samples_path())
            .render(train.images(), &gallery::tiles(train.labels(), offset));

        // ── Step 5: Normalize + one-hot encode ────────────────────────────────
        let train_x = train.images().normalize();
        let test_x  = corpus.test().images().normalize();
        let train_y = encode(train.labels()).context("Bad training labels")?;
        let test_y  = encode(corpus.test().labels()).context("Bad test labels")?;

        // ── Step 6: Build the network ─────────────────────────────────────────
        let mut model = build::<B>(&hparams, device)?;
        let logger    = MetricsLogger::new(store.dir())?;

        // ── Step 7: Train ─────────────────────────────────────────────────────
        tracing::info!("Training the model, please wait...");
        let outcome = trainer::run(
            &mut model, &train_x, &train_y, &test_x, &test_y,
            hparams.epoch_count, &options, reporter, device,
        );

        let corpus_name = provider.describe();
        let summary = |outcome| RunSummary {
            hyperparameters: hparams,
            batch_size:      options.batch_size,
            learning_rate:   options.learning_rate,
            corpus:          corpus_name.clone(),
            train_images:    train.len(),
            test_images:     corpus.test().len(),
            outcome,
        };

        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                // ── Diverged: keep what was learned so far ────────────────────
                if let PipelineError::TrainingDiverged { epoch, phase, history } = &err {
                    logger.log_history(history)?;
                    MetricsChart::new(store.chart_path()).render(history);
                    store.save_summary(&summary(RunOutcome::Diverged {
                        epoch:   *epoch,
                        phase:   phase.to_string(),
                        history: history.clone(),
                    }))?;
                    session.publish_model(TrainedModel {
                        model:           model.valid(),
                        hyperparameters: hparams,
                        report:          None,
                    });
                }
                return Err(anyhow::Error::new(err).context("Training failed"));
            }
        };

        // ── Step 8: Record and draw the results ───────────────────────────────
        tracing::info!("Test accuracy: {:.4}", report.test_accuracy);
        reporter.begin_phase("Drawing results");

        logger.log_history(&report.history)?;
        MetricsChart::new(store.chart_path()).render(&report.history);

        let inference_model = model.valid();
        let test_tiles      = gallery::tiles(corpus.test().labels(), 0);
        let indices: Vec<usize> = test_tiles.iter().map(|t| t.index).collect();
        let predicted = Inferencer::new(&inference_model, device.clone())
            .predict_classes(&test_x, &indices);
        ImageGallery::new(store.predictions_path())
            .render(corpus.test().images(), &gallery::with_predictions(test_tiles, &predicted));

        sweep(reporter, SWEEP_STEPS, cfg.progress_delay());
        reporter.finish_phase("Model training completed!");

        store.save_summary(&summary(RunOutcome::Completed { report: report.clone() }))?;

        // ── Step 9: Hand the model to the session ─────────────────────────────
        session.publish_model(TrainedModel {
            model:           inference_model,
            hyperparameters: hparams,
            report:          Some(report.clone()),
        });

        Ok(report)
    }
}
