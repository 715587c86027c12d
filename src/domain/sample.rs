// ============================================================
// Layer 3 — Labelled Image Pair and Pixel Classes
// ============================================================
// KITTI road ground truth is an RGB image where:
//   - pure red   (255, 0, 0)   → not road
//   - magenta    (255, 0, 255) → road (ego lane or any road)
//   - black      (0, 0, 0)     → outside the valid area
//
// Only the red background is treated as "not road"; every other
// colour counts as road, so the task is binary.

use std::path::PathBuf;

/// Number of output classes of the network.
pub const NUM_CLASSES: usize = 2;

/// Ground-truth colour marking background (non-road) pixels.
pub const BACKGROUND_COLOR: [u8; 3] = [255, 0, 0];

/// A camera frame and the ground-truth image describing its road pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePair {
    pub image: PathBuf,
    pub label: PathBuf,
}

impl ImagePair {
    pub fn new(image: impl Into<PathBuf>, label: impl Into<PathBuf>) -> Self {
        Self { image: image.into(), label: label.into() }
    }
}

/// The two pixel classes, in output-channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoadClass {
    NotRoad = 0,
    Road    = 1,
}

impl RoadClass {
    /// Classify one ground-truth pixel.
    pub fn from_label_rgb(rgb: [u8; 3]) -> Self {
        if rgb == BACKGROUND_COLOR {
            RoadClass::NotRoad
        } else {
            RoadClass::Road
        }
    }

    /// Channel index of this class in the network output
    pub fn channel(self) -> usize {
        self as usize
    }
}
