// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any one layer:
//
//   progress.rs   — ProgressSink implementations (terminal bar
//                   and epoch lines, a null sink, a recorder)
//
//   chart.rs      — dual-axis loss / accuracy chart (plotters)
//
//   gallery.rs    — 5 × 5 image grids with class captions
//
//   metrics.rs    — per-epoch metrics CSV
//
//   run_store.rs  — the output directory: effective config,
//                   run summary, file names of every artefact
//
//   session.rs    — shared slot for the latest training images
//                   and trained model
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Terminal progress reporting
pub mod progress;

/// Training curves chart
pub mod chart;

/// Image grids
pub mod gallery;

/// Training metrics CSV logger
pub mod metrics;

/// Output directory layout and run records
pub mod run_store;

/// Shared session state
pub mod session;
