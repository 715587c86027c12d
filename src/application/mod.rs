// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// user-facing goal each:
//
//   train_use_case      — dataset → FCN-8s training → overlays
//   infer_use_case      — checkpoint → overlays
//   check_data_use_case — is everything in place for `train`?
//
// No ML math and no printing here: tensors live in Layer 5,
// files in Layers 4 and 6, output in Layer 1.

// The training workflow
pub mod train_use_case;

// Inference from a saved checkpoint
pub mod infer_use_case;

// Dataset / weight presence report
pub mod check_data_use_case;
