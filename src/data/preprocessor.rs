// ============================================================
// Layer 4 — Image Preprocessor
// ============================================================
// Turns files on disk into fixed-size arrays the batcher can stack.
//
// Camera frames:
//   1. Decode PNG → RGB8
//   2. Resize to the training ImageShape (bilinear)
//   3. Keep as HWC bytes; the batcher converts to CHW floats and
//      applies ImageNet mean/std normalisation, which is what the
//      pretrained VGG16 weights were trained with
//
// Ground truth:
//   1. Decode PNG → RGB8
//   2. Resize with nearest-neighbour so no blended colours appear
//      on the class boundary
//   3. One byte per pixel: 1 = road, 0 = background (pure red)

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use std::path::Path;

use crate::data::dataset::RoadSample;
use crate::domain::sample::{ImagePair, RoadClass};
use crate::domain::shape::ImageShape;

/// ImageNet channel means (RGB, 0..1 scale)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations (RGB, 0..1 scale)
pub const IMAGENET_STD:  [f32; 3] = [0.229, 0.224, 0.225];

pub struct Preprocessor {
    shape: ImageShape,
}

impl Preprocessor {
    pub fn new(shape: ImageShape) -> Self {
        Self { shape }
    }

    /// Decode and resize a camera frame
    pub fn load_image(&self, path: &Path) -> Result<RgbImage> {
        let img = image::open(path)
            .with_context(|| format!("Cannot decode image '{}'", path.display()))?
            .to_rgb8();
        Ok(self.resize(&img, FilterType::Triangle))
    }

    /// Decode a ground-truth image into a per-pixel road mask
    pub fn load_road_mask(&self, path: &Path) -> Result<Vec<u8>> {
        let gt = image::open(path)
            .with_context(|| format!("Cannot decode label '{}'", path.display()))?
            .to_rgb8();
        Ok(road_mask(&self.resize(&gt, FilterType::Nearest)))
    }

    /// Load one labelled pair into a training sample
    pub fn load_sample(&self, pair: &ImagePair) -> Result<RoadSample> {
        let image = self.load_image(&pair.image)?;
        let mask  = self.load_road_mask(&pair.label)?;
        Ok(RoadSample {
            image:  image.into_raw(),
            mask,
            height: self.shape.height,
            width:  self.shape.width,
        })
    }

    /// Load every pair, skipping (with a warning) the ones that fail to decode.
    pub fn load_samples(&self, pairs: &[ImagePair]) -> Vec<RoadSample> {
        let mut samples = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match self.load_sample(pair) {
                Ok(sample) => samples.push(sample),
                Err(e)     => tracing::warn!("Skipping '{}': {:#}", pair.image.display(), e),
            }
        }
        samples
    }

    fn resize(&self, img: &RgbImage, filter: FilterType) -> RgbImage {
        let (w, h) = (self.shape.width as u32, self.shape.height as u32);
        if img.dimensions() == (w, h) {
            return img.clone();
        }
        image::imageops::resize(img, w, h, filter)
    }
}

/// One byte per pixel, row-major: `RoadClass::Road` as 1, background as 0.
pub fn road_mask(gt: &RgbImage) -> Vec<u8> {
    gt.pixels()
        .map(|p| RoadClass::from_label_rgb(p.0) as u8)
        .collect()
}

/// HWC RGB bytes → CHW floats normalised with ImageNet statistics.
pub fn normalize_chw(hwc: &[u8], shape: ImageShape) -> Vec<f32> {
    let plane = shape.pixels();
    let mut out = vec![0.0f32; plane * 3];
    for (i, px) in hwc.chunks_exact(3).enumerate() {
        for c in 0..3 {
            out[c * plane + i] = (px[c] as f32 / 255.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    out
}
