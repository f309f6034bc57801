// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// pipeline works with. No burn types, no file I/O.
//
//   corpus.rs      — images, partitions, one-hot label vectors
//   hyperparams.rs — the user-tunable HyperparameterSet
//   history.rs     — per-epoch metrics, progress events, reports
//   error.rs       — the PipelineError taxonomy
//   traits.rs      — CorpusProvider and ProgressSink seams

pub mod corpus;

pub mod hyperparams;

pub mod history;

pub mod error;

pub mod traits;
