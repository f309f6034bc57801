// ============================================================
// Layer 3 — Image Corpus Types
// ============================================================
// RawImages        — 8-bit pixels exactly as they were loaded,
//                    interleaved height × width × channel
// NormalizedImages — the same pixels rescaled to [0, 1]
// LabelVector      — one-hot encoding of a class label
// Partition        — images + integer labels of one split
// ImageCorpus      — the training and test partitions
//
// Raw and normalized views coexist: normalising borrows the raw
// pixels and produces a new value. NormalizedImages has no
// normalize() of its own, so the rescale can only happen once.
//
// Both pixel buffers sit behind an Arc so datasets, the session
// context and the galleries can share them without copying
// tens of megabytes around.

use std::sync::Arc;

use crate::domain::error::{PipelineError, PipelineResult};

pub const IMAGE_HEIGHT:   usize = 32;
pub const IMAGE_WIDTH:    usize = 32;
pub const IMAGE_CHANNELS: usize = 3;
/// Values per image: 32 × 32 × 3
pub const IMAGE_SIZE:     usize = IMAGE_HEIGHT * IMAGE_WIDTH * IMAGE_CHANNELS;
pub const NUM_CLASSES:    usize = 10;

pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "airplane",
    "automobile",
    "bird",
    "cat",
    "deer",
    "dog",
    "frog",
    "horse",
    "ship",
    "truck",
];

/// Human readable name of a class, or "unknown" for out-of-range ids
pub fn class_name(label: usize) -> &'static str {
    CLASS_NAMES.get(label).copied().unwrap_or("unknown")
}

// ─── RawImages ────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct RawImages {
    pixels: Arc<Vec<u8>>,
}

impl RawImages {
    /// Wrap a flat HWC pixel buffer holding a whole number of images
    pub fn from_pixels(pixels: Vec<u8>) -> PipelineResult<Self> {
        if pixels.len() % IMAGE_SIZE != 0 {
            return Err(PipelineError::CorpusUnavailable(format!(
                "pixel buffer of {} bytes is not a multiple of {IMAGE_SIZE}",
                pixels.len()
            )));
        }
        Ok(Self { pixels: Arc::new(pixels) })
    }

    pub fn len(&self) -> usize {
        self.pixels.len() / IMAGE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// HWC bytes of image `index`
    pub fn image(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(IMAGE_SIZE)?;
        self.pixels.get(start..start + IMAGE_SIZE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks_exact(IMAGE_SIZE)
    }

    /// Rescale every channel value from 0..=255 to [0, 1]
    pub fn normalize(&self) -> NormalizedImages {
        let values: Vec<f32> = self.pixels.iter().map(|&p| p as f32 / 255.0).collect();
        NormalizedImages { values: Arc::new(values) }
    }
}

// ─── NormalizedImages ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImages {
    values: Arc<Vec<f32>>,
}

impl NormalizedImages {
    /// Wrap values that are already in model input form.
    /// No rescaling is applied here.
    pub fn from_values(values: Vec<f32>) -> PipelineResult<Self> {
        if values.len() % IMAGE_SIZE != 0 {
            return Err(PipelineError::CorpusUnavailable(format!(
                "value buffer of length {} is not a multiple of {IMAGE_SIZE}",
                values.len()
            )));
        }
        Ok(Self { values: Arc::new(values) })
    }

    pub fn len(&self) -> usize {
        self.values.len() / IMAGE_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn image(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(IMAGE_SIZE)?;
        self.values.get(start..start + IMAGE_SIZE)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Copy the values out, e.g. to build a modified variant
    pub fn to_vec(&self) -> Vec<f32> {
        self.values.as_ref().clone()
    }
}

// ─── LabelVector ──────────────────────────────────────────────────────────────
/// One-hot class encoding: exactly one entry is 1.0, the rest 0.0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelVector([f32; NUM_CLASSES]);

impl LabelVector {
    pub fn one_hot(label: usize) -> PipelineResult<Self> {
        if label >= NUM_CLASSES {
            return Err(PipelineError::InvalidLabel { label, num_classes: NUM_CLASSES });
        }
        let mut values = [0.0; NUM_CLASSES];
        values[label] = 1.0;
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f32; NUM_CLASSES] {
        &self.0
    }

    /// Index of the hot entry
    pub fn argmax(&self) -> usize {
        self.0
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }
}

// ─── Partition / ImageCorpus ──────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    images: RawImages,
    labels: Vec<u8>,
}

impl Partition {
    pub fn new(images: RawImages, labels: Vec<u8>) -> PipelineResult<Self> {
        if images.len() != labels.len() {
            return Err(PipelineError::MismatchedPartition {
                images: images.len(),
                labels: labels.len(),
            });
        }
        if let Some(&bad) = labels.iter().find(|&&l| l as usize >= NUM_CLASSES) {
            return Err(PipelineError::InvalidLabel { label: bad as usize, num_classes: NUM_CLASSES });
        }
        Ok(Self { images, labels })
    }

    pub fn images(&self) -> &RawImages {
        &self.images
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Images per class, indexed by label
    pub fn class_distribution(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0; NUM_CLASSES];
        for &l in &self.labels {
            counts[l as usize] += 1;
        }
        counts
    }
}

/// Training and test partitions; sizes are fixed once loaded
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCorpus {
    train: Partition,
    test:  Partition,
}

impl ImageCorpus {
    pub fn new(train: Partition, test: Partition) -> Self {
        Self { train, test }
    }

    pub fn train(&self) -> &Partition {
        &self.train
    }

    pub fn test(&self) -> &Partition {
        &self.test
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_images() -> RawImages {
        let mut pixels = vec![0u8; IMAGE_SIZE];
        pixels.extend(std::iter::repeat(255u8).take(IMAGE_SIZE));
        RawImages::from_pixels(pixels).unwrap()
    }

    #[test]
    fn test_normalized_values_lie_in_unit_interval() {
        let pixels: Vec<u8> = (0..IMAGE_SIZE).map(|i| (i % 256) as u8).collect();
        let raw  = RawImages::from_pixels(pixels).unwrap();
        let norm = raw.normalize();

        assert_eq!(norm.len(), 1);
        assert!(norm.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(norm.values()[0], 0.0);
        assert_eq!(norm.values()[255], 1.0);
    }

    #[test]
    fn test_normalize_leaves_raw_pixels_untouched() {
        let raw  = two_images();
        let norm = raw.normalize();
        assert_eq!(raw.image(1).unwrap()[0], 255);
        assert_eq!(norm.image(1).unwrap()[0], 1.0);
    }

    #[test]
    fn test_partial_image_buffers_rejected() {
        assert!(RawImages::from_pixels(vec![0; IMAGE_SIZE + 1]).is_err());
        assert!(NormalizedImages::from_values(vec![0.0; 10]).is_err());
    }

    #[test]
    fn test_image_index_bounds() {
        let raw = two_images();
        assert_eq!(raw.len(), 2);
        assert!(raw.image(1).is_some());
        assert!(raw.image(2).is_none());
        assert_eq!(raw.iter().count(), 2);
    }

    #[test]
    fn test_one_hot_has_single_hot_entry() {
        for label in 0..NUM_CLASSES {
            let v = LabelVector::one_hot(label).unwrap();
            assert_eq!(v.argmax(), label);
            assert_eq!(v.sum(), 1.0);
            assert_eq!(v.values().iter().filter(|&&x| x == 1.0).count(), 1);
        }
        assert!(matches!(
            LabelVector::one_hot(10),
            Err(PipelineError::InvalidLabel { label: 10, .. })
        ));
    }

    #[test]
    fn test_partition_checks_lengths_and_labels() {
        assert!(matches!(
            Partition::new(two_images(), vec![1]),
            Err(PipelineError::MismatchedPartition { images: 2, labels: 1 })
        ));
        assert!(matches!(
            Partition::new(two_images(), vec![1, 12]),
            Err(PipelineError::InvalidLabel { label: 12, .. })
        ));

        let p = Partition::new(two_images(), vec![3, 3]).unwrap();
        assert_eq!(p.class_distribution()[3], 2);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(class_name(0), "airplane");
        assert_eq!(class_name(9), "truck");
        assert_eq!(class_name(42), "unknown");
    }
}
