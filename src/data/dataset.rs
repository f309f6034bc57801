use burn::data::dataset::Dataset;

use crate::domain::corpus::{LabelVector, NormalizedImages};
use crate::domain::error::{PipelineError, PipelineResult};

/// One normalized image (HWC, 3072 values) and its one-hot target
#[derive(Debug, Clone)]
pub struct ImageSample {
    pub pixels: Vec<f32>,
    pub target: LabelVector,
}

impl ImageSample {
    pub fn class(&self) -> usize {
        self.target.argmax()
    }
}

/// Burn view over a partition. Shares the pixel buffer with the
/// NormalizedImages it was built from; samples are copied out one
/// at a time as the DataLoader asks for them.
pub struct ImageDataset {
    images:  NormalizedImages,
    targets: Vec<LabelVector>,
}

impl ImageDataset {
    pub fn new(images: &NormalizedImages, targets: &[LabelVector]) -> PipelineResult<Self> {
        if images.len() != targets.len() {
            return Err(PipelineError::MismatchedPartition {
                images: images.len(),
                labels: targets.len(),
            });
        }
        Ok(Self { images: images.clone(), targets: targets.to_vec() })
    }
}

impl Dataset<ImageSample> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageSample> {
        let pixels = self.images.image(index)?.to_vec();
        let target = *self.targets.get(index)?;
        Some(ImageSample { pixels, target })
    }

    fn len(&self) -> usize {
        self.targets.len()
    }
}
