// ============================================================
// Layer 3 — ImageShape
// ============================================================
// The (height, width) every frame is resized to before it reaches
// the network.
//
// VGG16 halves the resolution five times (stride 32 overall) and
// the FCN-8s decoder scales back up by 2 × 2 × 8. The round trip
// only lands on the original size when both sides divide by 32,
// so that is enforced at construction time.

use anyhow::{bail, Result};

/// Total downsampling factor of the VGG16 encoder.
pub const ENCODER_STRIDE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub height: usize,
    pub width:  usize,
}

impl ImageShape {
    /// Build a shape, rejecting sizes the encoder/decoder cannot round-trip.
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            bail!("image shape must be non-zero, got {height}x{width}");
        }
        if height % ENCODER_STRIDE != 0 || width % ENCODER_STRIDE != 0 {
            bail!(
                "image shape {height}x{width} must be a multiple of {ENCODER_STRIDE} in both dimensions"
            );
        }
        Ok(Self { height, width })
    }

    /// Number of pixels in one frame
    pub fn pixels(&self) -> usize {
        self.height * self.width
    }
}

/// The resolution used for KITTI road training: 160 × 576.
impl Default for ImageShape {
    fn default() -> Self {
        Self { height: 160, width: 576 }
    }
}
