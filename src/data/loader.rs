// ============================================================
// Layer 4 — CIFAR-10 Corpus Loader
// ============================================================
// Reads the CIFAR-10 "binary version" from a local directory.
//
// Directory layout (as extracted from cifar-10-binary.tar.gz):
//   cifar-10-batches-bin/
//     data_batch_1.bin … data_batch_5.bin   ← 5 × 10,000 training images
//     test_batch.bin                        ← 10,000 test images
//
// Record format, 3073 bytes each:
//   [label: 1 byte][red: 1024 bytes][green: 1024 bytes][blue: 1024 bytes]
//
// The colour planes are stored one after the other (CHW); we
// interleave them into HWC on the way in so every image is laid
// out the same way it is displayed.
//
// Loading is deterministic: the same files always produce the
// same 50,000 / 10,000 split in the same order. Anything that
// goes wrong (missing file, truncated file, label > 9) becomes a
// CorpusUnavailable error that names the offending file.

use std::{fs, path::{Path, PathBuf}};

use crate::domain::corpus::{
    ImageCorpus, Partition, RawImages, IMAGE_HEIGHT, IMAGE_SIZE, IMAGE_WIDTH, NUM_CLASSES,
};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::CorpusProvider;

const PLANE_SIZE:  usize = IMAGE_HEIGHT * IMAGE_WIDTH;
const RECORD_SIZE: usize = 1 + IMAGE_SIZE;

/// Which files make up each partition and how many records each holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusLayout {
    pub train_files:      Vec<String>,
    pub test_file:        String,
    pub records_per_file: usize,
}

impl CorpusLayout {
    /// The standard CIFAR-10 binary distribution
    pub fn cifar10() -> Self {
        Self {
            train_files:      (1..=5).map(|i| format!("data_batch_{i}.bin")).collect(),
            test_file:        "test_batch.bin".to_string(),
            records_per_file: 10_000,
        }
    }

    pub fn train_len(&self) -> usize {
        self.train_files.len() * self.records_per_file
    }

    pub fn test_len(&self) -> usize {
        self.records_per_file
    }
}

impl Default for CorpusLayout {
    fn default() -> Self {
        Self::cifar10()
    }
}

/// Loads CIFAR-10 binary batch files from a directory.
/// Implements the CorpusProvider trait from Layer 3.
pub struct Cifar10Loader {
    dir:    PathBuf,
    layout: CorpusLayout,
}

impl Cifar10Loader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_layout(dir, CorpusLayout::cifar10())
    }

    pub fn with_layout(dir: impl Into<PathBuf>, layout: CorpusLayout) -> Self {
        Self { dir: dir.into(), layout }
    }

    pub fn layout(&self) -> &CorpusLayout {
        &self.layout
    }

    /// Concatenate the given batch files into one partition
    fn read_partition(&self, files: &[String]) -> PipelineResult<Partition> {
        let total      = files.len() * self.layout.records_per_file;
        let mut pixels = Vec::with_capacity(total * IMAGE_SIZE);
        let mut labels = Vec::with_capacity(total);

        for name in files {
            let path  = self.dir.join(name);
            let bytes = fs::read(&path).map_err(|e| {
                PipelineError::CorpusUnavailable(format!("cannot read '{}': {e}", path.display()))
            })?;
            parse_records(&bytes, self.layout.records_per_file, &path, &mut pixels, &mut labels)?;
            tracing::debug!("Read {} records from '{}'", self.layout.records_per_file, path.display());
        }

        Partition::new(RawImages::from_pixels(pixels)?, labels)
    }
}

impl CorpusProvider for Cifar10Loader {
    fn load(&self) -> PipelineResult<ImageCorpus> {
        if !self.dir.is_dir() {
            return Err(PipelineError::CorpusUnavailable(format!(
                "data directory '{}' does not exist",
                self.dir.display()
            )));
        }

        let train = self.read_partition(&self.layout.train_files)?;
        let test  = self.read_partition(std::slice::from_ref(&self.layout.test_file))?;

        tracing::info!(
            "Loaded CIFAR-10 from '{}': {} training / {} test images",
            self.dir.display(),
            train.len(),
            test.len(),
        );
        Ok(ImageCorpus::new(train, test))
    }

    fn describe(&self) -> String {
        format!("CIFAR-10 binaries in '{}'", self.dir.display())
    }
}

/// Decode `expected` records from one batch file, appending HWC
/// pixels and labels to the output buffers.
fn parse_records(
    bytes:    &[u8],
    expected: usize,
    source:   &Path,
    pixels:   &mut Vec<u8>,
    labels:   &mut Vec<u8>,
) -> PipelineResult<()> {
    if bytes.len() != expected * RECORD_SIZE {
        return Err(PipelineError::CorpusUnavailable(format!(
            "'{}' has {} bytes, expected {} ({} records of {RECORD_SIZE})",
            source.display(),
            bytes.len(),
            expected * RECORD_SIZE,
            expected,
        )));
    }

    for (i, record) in bytes.chunks_exact(RECORD_SIZE).enumerate() {
        let label = record[0];
        if label as usize >= NUM_CLASSES {
            return Err(PipelineError::CorpusUnavailable(format!(
                "'{}' record {i} has label {label}",
                source.display()
            )));
        }
        labels.push(label);

        // R-plane, G-plane, B-plane → interleaved RGB
        let planes = &record[1..];
        for p in 0..PLANE_SIZE {
            pixels.push(planes[p]);
            pixels.push(planes[PLANE_SIZE + p]);
            pixels.push(planes[2 * PLANE_SIZE + p]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Record whose R/G/B planes are filled with distinct constants
    fn record(label: u8, r: u8, g: u8, b: u8) -> Vec<u8> {
        let mut rec = vec![label];
        rec.extend(std::iter::repeat(r).take(PLANE_SIZE));
        rec.extend(std::iter::repeat(g).take(PLANE_SIZE));
        rec.extend(std::iter::repeat(b).take(PLANE_SIZE));
        rec
    }

    fn small_layout() -> CorpusLayout {
        CorpusLayout {
            train_files:      vec!["train_a.bin".into(), "train_b.bin".into()],
            test_file:        "test.bin".into(),
            records_per_file: 2,
        }
    }

    /// Write a tiny corpus where every record's red channel is unique
    fn write_small_corpus(dir: &Path) {
        let mut seed = 0u8;
        for name in ["train_a.bin", "train_b.bin", "test.bin"] {
            let mut bytes = Vec::new();
            for _ in 0..2 {
                bytes.extend(record(seed % 10, seed, 100, 200));
                seed += 1;
            }
            fs::write(dir.join(name), bytes).unwrap();
        }
    }

    #[test]
    fn test_cifar10_layout_sizes() {
        let layout = CorpusLayout::cifar10();
        assert_eq!(layout.train_len(), 50_000);
        assert_eq!(layout.test_len(), 10_000);
        assert_eq!(layout.train_files.len(), 5);
        assert!(!layout.train_files.contains(&layout.test_file));
    }

    #[test]
    fn test_loads_partitions_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        write_small_corpus(dir.path());

        let corpus = Cifar10Loader::with_layout(dir.path(), small_layout()).load().unwrap();
        assert_eq!(corpus.train().len(), 4);
        assert_eq!(corpus.test().len(), 2);
        assert_eq!(corpus.train().labels(), &[0, 1, 2, 3]);
        assert_eq!(corpus.test().labels(), &[4, 5]);
    }

    #[test]
    fn test_planes_are_interleaved() {
        let dir = tempfile::tempdir().unwrap();
        write_small_corpus(dir.path());

        let corpus = Cifar10Loader::with_layout(dir.path(), small_layout()).load().unwrap();
        let first  = corpus.train().images().image(1).unwrap();
        assert_eq!(&first[..6], &[1, 100, 200, 1, 100, 200]);
    }

    #[test]
    fn test_partitions_share_no_image() {
        let dir = tempfile::tempdir().unwrap();
        write_small_corpus(dir.path());

        let corpus = Cifar10Loader::with_layout(dir.path(), small_layout()).load().unwrap();
        let train: HashSet<&[u8]> = corpus.train().images().iter().collect();
        assert!(corpus.test().images().iter().all(|img| !train.contains(img)));
    }

    #[test]
    fn test_missing_directory_is_corpus_unavailable() {
        let err = Cifar10Loader::new("/definitely/not/here").load().unwrap_err();
        assert!(matches!(err, PipelineError::CorpusUnavailable(_)));
    }

    #[test]
    fn test_missing_file_is_corpus_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write_small_corpus(dir.path());
        fs::remove_file(dir.path().join("test.bin")).unwrap();

        let err = Cifar10Loader::with_layout(dir.path(), small_layout()).load().unwrap_err();
        assert!(err.to_string().contains("test.bin"));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_small_corpus(dir.path());
        fs::write(dir.path().join("train_b.bin"), record(1, 0, 0, 0)).unwrap();

        let err = Cifar10Loader::with_layout(dir.path(), small_layout()).load().unwrap_err();
        assert!(matches!(err, PipelineError::CorpusUnavailable(ref m) if m.contains("train_b.bin")));
    }

    #[test]
    fn test_out_of_range_label_rejected() {
        let mut pixels = Vec::new();
        let mut labels = Vec::new();
        let bytes = record(11, 0, 0, 0);
        let err = parse_records(&bytes, 1, Path::new("x.bin"), &mut pixels, &mut labels).unwrap_err();
        assert!(matches!(err, PipelineError::CorpusUnavailable(_)));
    }
}
