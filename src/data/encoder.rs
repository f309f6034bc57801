// ============================================================
// Layer 4 — Label Encoder
// ============================================================
// Turns integer class labels into one-hot LabelVectors for the
// categorical cross-entropy loss:
//
//   3  →  [0, 0, 0, 1, 0, 0, 0, 0, 0, 0]
//
// Pure and deterministic. Encode each label sequence exactly
// once; LabelVector has no way back into this function.

use crate::domain::corpus::LabelVector;
use crate::domain::error::PipelineResult;

/// One-hot encode every label. Fails on the first label outside 0..=9.
pub fn encode(labels: &[u8]) -> PipelineResult<Vec<LabelVector>> {
    labels
        .iter()
        .map(|&label| LabelVector::one_hot(label as usize))
        .collect()
}

/// Recover the class index of every vector
pub fn decode(vectors: &[LabelVector]) -> Vec<usize> {
    vectors.iter().map(LabelVector::argmax).collect()
}
