// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one user-visible goal (a training run, an image gallery).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No terminal output here (that's Layer 1 and the reporters)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The sample gallery workflow
pub mod gallery_use_case;
