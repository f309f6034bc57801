// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Runs the trained classifier over normalized images and turns
// the activated outputs into class ids. Used by the prediction
// gallery after a training run; it reads the model the session
// context holds and never trains.

use burn::prelude::*;

use crate::data::batcher::images_tensor;
use crate::domain::corpus::{NormalizedImages, NUM_CLASSES};
use crate::ml::model::CnnClassifier;

/// A predicted class with the model's output for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: usize,
    pub score: f32,
}

pub struct Inferencer<'a, B: Backend> {
    model:  &'a CnnClassifier<B>,
    device: B::Device,
}

impl<'a, B: Backend> Inferencer<'a, B> {
    pub fn new(model: &'a CnnClassifier<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Predict the images at `indices`; indices past the end are skipped
    pub fn predict(&self, images: &NormalizedImages, indices: &[usize]) -> Vec<Prediction> {
        let selected: Vec<&[f32]> = indices.iter().filter_map(|&i| images.image(i)).collect();
        if selected.is_empty() {
            return Vec::new();
        }

        let count   = selected.len();
        let pixels  = selected.concat();
        let outputs = self.model.forward(images_tensor::<B>(pixels, count, &self.device));
        let scores: Vec<f32> = outputs.into_data().iter::<f32>().collect();

        scores
            .chunks(NUM_CLASSES)
            .map(|row| {
                let (class, score) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, s)| if s > best.1 { (i, s) } else { best });
                Prediction { class, score }
            })
            .collect()
    }

    /// Class ids only, in the order of `indices`
    pub fn predict_classes(&self, images: &NormalizedImages, indices: &[usize]) -> Vec<usize> {
        self.predict(images, indices).into_iter().map(|p| p.class).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::synthetic::SyntheticCorpus;
    use crate::domain::hyperparams::HyperparameterSet;
    use crate::domain::traits::CorpusProvider;
    use crate::ml::model::build;

    type TestBackend = NdArray;

    #[test]
    fn test_one_prediction_per_index() {
        let device = Default::default();
        let corpus = SyntheticCorpus::new(12, 4, 7).load().unwrap();
        let images = corpus.train().images().normalize();
        let model  = build::<TestBackend>(&HyperparameterSet::default(), &device).unwrap();

        let inferencer  = Inferencer::new(&model, device);
        let predictions = inferencer.predict(&images, &[0, 3, 11, 99]);

        assert_eq!(predictions.len(), 3);
        for p in &predictions {
            assert!(p.class < NUM_CLASSES);
            // Softmax output
            assert!((0.0..=1.0).contains(&p.score));
        }
    }

    #[test]
    fn test_empty_indices() {
        let device = Default::default();
        let corpus = SyntheticCorpus::new(4, 4, 7).load().unwrap();
        let images = corpus.train().images().normalize();
        let model  = build::<TestBackend>(&HyperparameterSet::default(), &device).unwrap();

        assert!(Inferencer::new(&model, device).predict_classes(&images, &[]).is_empty());
    }
}
