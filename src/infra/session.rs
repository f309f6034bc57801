// ============================================================
// Layer 6 — Session Context
// ============================================================
// The shared result slot between views: the raw training
// partition published by the corpus step and the model
// published after a training run. Each run overwrites both.
// Writers take `&mut`, readers take `&`; there is no other
// synchronisation.

use burn::prelude::*;

use crate::domain::corpus::{Partition, RawImages};
use crate::domain::history::TrainingReport;
use crate::domain::hyperparams::HyperparameterSet;
use crate::ml::model::CnnClassifier;

/// A trained model together with the settings that produced it
#[derive(Debug)]
pub struct TrainedModel<B: Backend> {
    pub model:           CnnClassifier<B>,
    pub hyperparameters: HyperparameterSet,
    /// None when the run diverged and the model was restored
    pub report:          Option<TrainingReport>,
}

#[derive(Debug)]
pub struct SessionContext<B: Backend> {
    training: Option<Partition>,
    trained:  Option<TrainedModel<B>>,
}

impl<B: Backend> Default for SessionContext<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> SessionContext<B> {
    pub fn new() -> Self {
        Self { training: None, trained: None }
    }

    /// Replace the raw training images (and their labels) of the
    /// previous run
    pub fn publish_training_set(&mut self, partition: Partition) {
        tracing::debug!("Session: {} training images published", partition.len());
        self.training = Some(partition);
    }

    pub fn training_set(&self) -> Option<&Partition> {
        self.training.as_ref()
    }

    pub fn training_images(&self) -> Option<&RawImages> {
        self.training.as_ref().map(Partition::images)
    }

    /// Replace the model of the previous run
    pub fn publish_model(&mut self, trained: TrainedModel<B>) {
        tracing::debug!(
            "Session: model published ({} parameters)",
            trained.model.num_params()
        );
        self.trained = Some(trained);
    }

    pub fn trained(&self) -> Option<&TrainedModel<B>> {
        self.trained.as_ref()
    }

    pub fn model(&self) -> Option<&CnnClassifier<B>> {
        self.trained.as_ref().map(|t| &t.model)
    }
}
