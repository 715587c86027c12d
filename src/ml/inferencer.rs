// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{bail, Result};
use burn::{prelude::*, tensor::activation::softmax};
use image::RgbImage;

use crate::data::preprocessor::normalize_chw;
use crate::domain::sample::RoadClass;
use crate::domain::shape::ImageShape;
use crate::ml::model::Fcn8s;

/// Probability above which a pixel is painted as road
pub const ROAD_THRESHOLD: f32 = 0.5;

pub struct Inferencer<B: Backend> {
    model:  Fcn8s<B>,
    shape:  ImageShape,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    /// `model` should already be in evaluation mode (dropout off),
    /// i.e. the result of `valid()` or a freshly loaded checkpoint.
    pub fn new(model: Fcn8s<B>, shape: ImageShape, device: B::Device) -> Self {
        Self { model, shape, device }
    }

    /// Per-pixel road probability (row-major) for a frame already
    /// resized to the inferencer's ImageShape.
    pub fn road_probabilities(&self, image: &RgbImage) -> Result<Vec<f32>> {
        let (w, h) = image.dimensions();
        if (h as usize, w as usize) != (self.shape.height, self.shape.width) {
            bail!(
                "frame is {}x{}, the model expects {}x{}",
                h, w, self.shape.height, self.shape.width
            );
        }

        let pixels = normalize_chw(image.as_raw(), self.shape);
        let input  = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [1, 3, self.shape.height, self.shape.width]),
            &self.device,
        );

        let probs = softmax(self.model.forward(input), 1);
        let road  = RoadClass::Road.channel();
        let road_probs: Vec<f32> = probs
            .slice([0..1, road..road + 1, 0..self.shape.height, 0..self.shape.width])
            .into_data()
            .iter::<f32>()
            .collect();
        Ok(road_probs)
    }

    /// Road mask: `true` where the road probability exceeds 0.5
    pub fn road_mask(&self, image: &RgbImage) -> Result<Vec<bool>> {
        Ok(self
            .road_probabilities(image)?
            .into_iter()
            .map(|p| p > ROAD_THRESHOLD)
            .collect())
    }
}
