// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only talks to these traits, so the KITTI
// directory walker can be swapped for another dataset layout
// without touching the training workflow.

use anyhow::Result;
use std::path::PathBuf;

use crate::domain::sample::ImagePair;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Any component that can enumerate labelled training frames and
/// unlabelled test frames.
///
/// Implementations:
///   - KittiLoader → walks `data_road/{training,testing}`
pub trait SampleSource {
    /// All (image, ground truth) pairs available for training.
    fn load_pairs(&self) -> Result<Vec<ImagePair>>;

    /// Frames used for qualitative inference output, in a stable order.
    fn test_images(&self) -> Result<Vec<PathBuf>>;
}
