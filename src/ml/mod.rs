// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All the burn-specific code that defines and trains the
// network lives here:
//
//   architecture.rs — the topology as a declarative LayerSpec
//                     list, plus the activation vocabulary
//
//   model.rs        — CnnClassifier, the builder that turns a
//                     layer plan into burn modules, and the
//                     categorical cross-entropy on activated outputs
//
//   trainer.rs      — the fit / evaluate loop with Adam,
//                     per-epoch progress events and
//                     divergence detection
//
//   inferencer.rs   — class predictions from a trained model
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

use burn::backend::{Autodiff, Wgpu};

/// Backend used by the CLI for training
pub type TrainBackend = Autodiff<Wgpu>;

/// Backend used for evaluation and inference
pub type InferBackend = Wgpu;

/// Declarative layer specification
pub mod architecture;

/// The CNN classifier and its builder
pub mod model;

/// Training loop with validation and divergence detection
pub mod trainer;

/// Class predictions from a trained model
pub mod inferencer;
