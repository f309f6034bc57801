// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack ImageSamples into
// device tensors.
//
//   Input:  Vec of N ImageSamples, each 32 × 32 × 3 (HWC) floats
//   Output: ImageBatch with
//             images  [N, 3, 32, 32]  (NCHW, what Conv2d expects)
//             targets [N, 10]         one-hot, for the loss
//             classes [N]             class ids, for accuracy
//
// The pixels are flattened in HWC order, loaded as [N, 32, 32, 3]
// and permuted to channels-first on the device.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageSample;
use crate::domain::corpus::{IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH, NUM_CLASSES};

#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    pub images:  Tensor<B, 4>,
    pub targets: Tensor<B, 2>,
    pub classes: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ImageSample, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageSample>) -> ImageBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.pixels.iter().copied())
            .collect();

        let targets: Vec<f32> = items
            .iter()
            .flat_map(|s| s.target.values().iter().copied())
            .collect();

        let classes: Vec<i64> = items
            .iter()
            .map(|s| s.class() as i64)
            .collect();

        let images = images_tensor::<B>(pixels, batch_size, &self.device);

        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(targets, [batch_size, NUM_CLASSES]),
            &self.device,
        );

        let classes = Tensor::<B, 1, Int>::from_data(
            TensorData::new(classes, [batch_size]),
            &self.device,
        );

        ImageBatch { images, targets, classes }
    }
}

/// Flat HWC pixels of `count` images → [count, 3, 32, 32]
pub fn images_tensor<B: Backend>(pixels: Vec<f32>, count: usize, device: &B::Device) -> Tensor<B, 4> {
    Tensor::<B, 4>::from_data(
        TensorData::new(pixels, [count, IMAGE_HEIGHT, IMAGE_WIDTH, IMAGE_CHANNELS]),
        device,
    )
    .permute([0, 3, 1, 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::corpus::{LabelVector, IMAGE_SIZE};

    type TestBackend = NdArray;

    fn sample(label: usize, fill: impl Fn(usize) -> f32) -> ImageSample {
        ImageSample {
            pixels: (0..IMAGE_SIZE).map(fill).collect(),
            target: LabelVector::one_hot(label).unwrap(),
        }
    }

    #[test]
    fn test_batch_shapes() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(1, |_| 0.5), sample(8, |_| 0.25), sample(3, |_| 0.0)]);

        assert_eq!(batch.images.dims(), [3, 3, 32, 32]);
        assert_eq!(batch.targets.dims(), [3, 10]);
        assert_eq!(batch.classes.dims(), [3]);

        let classes: Vec<i64> = batch.classes.into_data().iter::<i64>().collect();
        assert_eq!(classes, vec![1, 8, 3]);
    }

    #[test]
    fn test_channels_moved_first() {
        // Channel c of every pixel holds the value c
        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch   = batcher.batch(vec![sample(0, |i| (i % 3) as f32)]);

        let blue: Vec<f32> = batch
            .images
            .slice([0..1, 2..3, 0..32, 0..32])
            .into_data()
            .iter::<f32>()
            .collect();
        assert_eq!(blue.len(), 32 * 32);
        assert!(blue.iter().all(|&v| v == 2.0));
    }
}
