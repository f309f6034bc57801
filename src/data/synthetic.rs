// ============================================================
// Layer 4 — Synthetic Corpus
// ============================================================
// A stand-in CorpusProvider for offline runs and tests.
//
// Every image is a flat colour chosen by its class, plus a
// bright diagonal stripe whose direction also depends on the
// class, plus seeded per-pixel noise. That is enough structure
// for the network to learn something in a few epochs while the
// noise keeps every image unique.
//
// The same seed always yields the same corpus. Labels cycle
// 0, 1, …, 9 so both partitions stay class balanced.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::corpus::{
    ImageCorpus, Partition, RawImages, IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_SIZE, IMAGE_WIDTH,
    NUM_CLASSES,
};
use crate::domain::error::PipelineResult;
use crate::domain::traits::CorpusProvider;

const NOISE: i16 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticCorpus {
    pub train_len: usize,
    pub test_len:  usize,
    pub seed:      u64,
}

impl SyntheticCorpus {
    pub fn new(train_len: usize, test_len: usize, seed: u64) -> Self {
        Self { train_len, test_len, seed }
    }

    fn partition(&self, len: usize, rng: &mut StdRng) -> PipelineResult<Partition> {
        let mut pixels = Vec::with_capacity(len * IMAGE_SIZE);
        let mut labels = Vec::with_capacity(len);

        for i in 0..len {
            let label = (i % NUM_CLASSES) as u8;
            labels.push(label);
            draw_image(label, rng, &mut pixels);
        }
        Partition::new(RawImages::from_pixels(pixels)?, labels)
    }
}

impl CorpusProvider for SyntheticCorpus {
    fn load(&self) -> PipelineResult<ImageCorpus> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let train   = self.partition(self.train_len, &mut rng)?;
        let test    = self.partition(self.test_len, &mut rng)?;
        tracing::info!(
            "Generated synthetic corpus (seed {}): {} training / {} test images",
            self.seed,
            train.len(),
            test.len(),
        );
        Ok(ImageCorpus::new(train, test))
    }

    fn describe(&self) -> String {
        format!("synthetic corpus ({} / {}, seed {})", self.train_len, self.test_len, self.seed)
    }
}

/// Base RGB colour of a class, spread around the colour cube
fn class_colour(label: u8) -> [u8; IMAGE_CHANNELS] {
    let l = label as u16;
    [
        ((l * 97) % 256) as u8,
        ((l * 53 + 80) % 256) as u8,
        ((l * 181 + 40) % 256) as u8,
    ]
}

fn draw_image(label: u8, rng: &mut StdRng, out: &mut Vec<u8>) {
    let base   = class_colour(label);
    let rising = label % 2 == 0;

    for y in 0..IMAGE_HEIGHT {
        for x in 0..IMAGE_WIDTH {
            let on_stripe = if rising { x == y } else { x + y == IMAGE_WIDTH - 1 };
            for &channel in &base {
                let value = if on_stripe {
                    255
                } else {
                    (channel as i16 + rng.gen_range(-NOISE..=NOISE)).clamp(0, 254)
                };
                out.push(value as u8);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_partition_sizes_follow_request() {
        let corpus = SyntheticCorpus::new(40, 12, 7).load().unwrap();
        assert_eq!(corpus.train().len(), 40);
        assert_eq!(corpus.test().len(), 12);
        assert_eq!(corpus.train().images().len(), 40);
        assert_eq!(corpus.train().class_distribution(), [4; NUM_CLASSES]);
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let a = SyntheticCorpus::new(10, 5, 3).load().unwrap();
        let b = SyntheticCorpus::new(10, 5, 3).load().unwrap();
        let c = SyntheticCorpus::new(10, 5, 4).load().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_partitions_share_no_image() {
        let corpus = SyntheticCorpus::new(50, 20, 11).load().unwrap();
        let train: HashSet<&[u8]> = corpus.train().images().iter().collect();
        assert!(corpus.test().images().iter().all(|img| !train.contains(img)));
    }
}
