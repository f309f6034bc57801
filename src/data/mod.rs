// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw dataset files and device-ready
// tensor batches:
//
//   CIFAR-10 .bin files / synthetic generator
//       │
//       ▼
//   Cifar10Loader / SyntheticCorpus  → ImageCorpus (raw u8 pixels)
//       │
//       ├──► RawImages::normalize     → NormalizedImages in [0, 1]
//       │
//       ▼
//   encoder::encode                  → one-hot LabelVectors
//       │
//       ▼
//   ImageDataset                     → implements Burn's Dataset trait
//       │
//       ▼
//   ImageBatcher                     → stacks samples into tensors
//       │
//       ▼
//   DataLoader                       → feeds batches to the trainer

/// Reads CIFAR-10 binary batch files
pub mod loader;

/// Seeded synthetic corpus for offline runs and tests
pub mod synthetic;

/// One-hot label encoding
pub mod encoder;

/// Implements Burn's Dataset trait for normalized images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
