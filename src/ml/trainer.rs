// ============================================================
// Layer 5 — Training Orchestrator
// ============================================================
// Drives the fit / evaluate cycle synchronously on the calling
// thread:
//
//   for each epoch:
//     shuffle (seeded) → for each batch: forward, loss, backward, Adam
//     validation pass over the test partition (model.valid())
//     record EpochMetrics, notify the ProgressSink
//   final evaluation pass over the test partition
//
// Training uses the AutodiffBackend B; validation and the final
// evaluation run on B::InnerBackend without gradient tracking.
//
// Divergence: a non-finite input batch, training loss or
// validation loss stops the run with TrainingDiverged. The model
// is put back to the snapshot taken at the end of the last
// completed epoch (or its initial weights) and the error carries
// the history of every completed epoch. Nothing is retried.

use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::{ImageDataset, ImageSample},
};
use crate::domain::corpus::{LabelVector, NormalizedImages};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::history::{EpochMetrics, ProgressEvent, TrainingHistory, TrainingReport};
use crate::domain::hyperparams::validate_epoch_count;
use crate::domain::traits::ProgressSink;
use crate::ml::model::{categorical_crossentropy, count_correct, CnnClassifier};

pub const DEFAULT_BATCH_SIZE:    usize = 64;
pub const DEFAULT_LEARNING_RATE: f64   = 1e-3;
pub const DEFAULT_SHUFFLE_SEED:  u64   = 42;

/// Knobs of the fit loop that are not part of the HyperparameterSet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub shuffle_seed:  u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            batch_size:    DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            shuffle_seed:  DEFAULT_SHUFFLE_SEED,
        }
    }
}

impl TrainingOptions {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidHyperparameters("batch_size must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(PipelineError::InvalidHyperparameters(format!(
                "learning_rate {} must be a positive number",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Train `model` in place for `epochs` epochs, then evaluate it on
/// the test partition.
#[allow(clippy::too_many_arguments)]
pub fn run<B: AutodiffBackend>(
    model:        &mut CnnClassifier<B>,
    train_images: &NormalizedImages,
    train_labels: &[LabelVector],
    test_images:  &NormalizedImages,
    test_labels:  &[LabelVector],
    epochs:       usize,
    options:      &TrainingOptions,
    reporter:     &mut dyn ProgressSink,
    device:       &B::Device,
) -> PipelineResult<TrainingReport> {
    // ── Reject bad settings before any compute ────────────────────────────────
    validate_epoch_count(epochs)?;

    let train_dataset = ImageDataset::new(train_images, train_labels)?;
    let test_dataset  = ImageDataset::new(test_images, test_labels)?;

    fit(model, train_dataset, test_dataset, epochs, options, reporter, device)
}

/// The fit / evaluate cycle over any pair of sample sources. The
/// epoch count is not checked here; `run` does that.
#[allow(clippy::too_many_arguments)]
pub fn fit<B, D, T>(
    model:         &mut CnnClassifier<B>,
    train_dataset: D,
    test_dataset:  T,
    epochs:        usize,
    options:       &TrainingOptions,
    reporter:      &mut dyn ProgressSink,
    device:        &B::Device,
) -> PipelineResult<TrainingReport>
where
    B: AutodiffBackend,
    D: Dataset<ImageSample> + 'static,
    T: Dataset<ImageSample> + 'static,
{
    options.validate()?;

    let (train_len, test_len) = (train_dataset.len(), test_dataset.len());
    if train_len == 0 || test_len == 0 {
        return Err(PipelineError::CorpusUnavailable(format!(
            "cannot train on {train_len} training / {test_len} test images",
        )));
    }

    tracing::info!(
        "Training for {} epochs: {} training / {} test images, batch size {}, lr {}",
        epochs, train_len, test_len, options.batch_size, options.learning_rate,
    );

    // ── Data loaders: training on B, evaluation on B::InnerBackend ────────────
    let train_loader = DataLoaderBuilder::new(ImageBatcher::<B>::new(device.clone()))
        .batch_size(options.batch_size)
        .shuffle(options.shuffle_seed)
        .build(train_dataset);

    let test_loader = DataLoaderBuilder::new(ImageBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(options.batch_size)
        .build(test_dataset);

    let mut optim     = AdamConfig::new().init();
    let mut history   = TrainingHistory::new();
    let mut last_good = model.clone();

    for epoch in 0..epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let batch_len = batch.classes.dims()[0];

            if !is_finite(batch.images.clone()) {
                *model = last_good;
                return Err(diverged(epoch, "input batch", history));
            }

            let outputs = model.forward(batch.images);
            let loss    = categorical_crossentropy(outputs.clone(), batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                *model = last_good;
                return Err(diverged(epoch, "training loss", history));
            }

            loss_sum += loss_val;
            batches  += 1;
            correct  += count_correct(outputs, batch.classes);
            seen     += batch_len;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &*model);
            *model = optim.step(options.learning_rate, model.clone(), grads);
        }

        let train_loss     = loss_sum / batches.max(1) as f64;
        let train_accuracy = correct as f64 / seen.max(1) as f64;

        // ── Validation phase ──────────────────────────────────────────────────
        let (val_loss, val_accuracy) = evaluate(&model.valid(), test_loader.as_ref());
        if !val_loss.is_finite() {
            *model = last_good;
            return Err(diverged(epoch, "validation loss", history));
        }

        let metrics = EpochMetrics::new(epoch, train_loss, val_loss, train_accuracy, val_accuracy);
        tracing::debug!(
            "Epoch {}/{} | train_loss={:.4} | val_loss={:.4} | train_acc={:.4} | val_acc={:.4}",
            epoch + 1, epochs, train_loss, val_loss, train_accuracy, val_accuracy,
        );

        reporter.on_epoch_end(&ProgressEvent::from(&metrics));
        history.record(metrics);
        last_good = model.clone();
    }

    // ── Final held-out evaluation ─────────────────────────────────────────────
    let (test_loss, test_accuracy) = evaluate(&model.valid(), test_loader.as_ref());
    tracing::info!("Test loss {:.4}, test accuracy {:.4}", test_loss, test_accuracy);

    Ok(TrainingReport { history, test_loss, test_accuracy })
}

/// Mean loss and accuracy of `model` over every batch of `loader`,
/// weighted by batch size. Returns (NaN, 0) for an empty loader.
pub fn evaluate<B: Backend>(
    model:  &CnnClassifier<B>,
    loader: &dyn DataLoader<ImageBatch<B>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for batch in loader.iter() {
        let batch_len = batch.classes.dims()[0];
        let outputs   = model.forward(batch.images);

        let loss: f64 = categorical_crossentropy(outputs.clone(), batch.targets)
            .into_scalar()
            .elem::<f64>();

        loss_sum += loss * batch_len as f64;
        correct  += count_correct(outputs, batch.classes);
        total    += batch_len;
    }

    if total == 0 {
        return (f64::NAN, 0.0);
    }
    (loss_sum / total as f64, correct as f64 / total as f64)
}

/// NaN or ±inf anywhere in the tensor makes its sum non-finite
fn is_finite<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> bool {
    tensor.sum().into_scalar().elem::<f64>().is_finite()
}

fn diverged(epoch: usize, phase: &'static str, history: TrainingHistory) -> PipelineError {
    tracing::warn!(
        "Non-finite {} in epoch {}; keeping the model from the last completed epoch ({} done)",
        phase,
        epoch,
        history.len(),
    );
    PipelineError::TrainingDiverged { epoch, phase, history }
}
