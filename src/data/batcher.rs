// ============================================================
// Layer 4 — Road Batcher
// ============================================================
// Implements Burn's Batcher trait to stack RoadSamples into
// tensors for one forward pass.
//
//   images:    [N, 3, H, W] float, ImageNet-normalised
//   labels:    [N, 2, H, W] float, one-hot (channel 0 not road,
//              channel 1 road) for the soft-label cross entropy
//   road_mask: [N, H, W]    int, 1 = road, used for scoring
//
// All samples were resized to the same ImageShape by the
// preprocessor, so no padding is needed here.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::RoadSample;
use crate::data::preprocessor::normalize_chw;
use crate::domain::sample::NUM_CLASSES;
use crate::domain::shape::ImageShape;

/// A batch of road samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct RoadBatch<B: Backend> {
    pub images:    Tensor<B, 4>,
    pub labels:    Tensor<B, 4>,
    pub road_mask: Tensor<B, 3, Int>,
}

#[derive(Clone, Debug)]
pub struct RoadBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,
}

impl<B: Backend> RoadBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<RoadSample, RoadBatch<B>> for RoadBatcher<B> {
    fn batch(&self, items: Vec<RoadSample>) -> RoadBatch<B> {
        let batch_size = items.len();
        let (height, width) = (items[0].height, items[0].width);
        let shape = ImageShape { height, width };
        let plane = shape.pixels();

        // ── Pixels: HWC bytes → CHW normalised floats, sample after sample ───
        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| normalize_chw(&s.image, shape))
            .collect();

        // ── One-hot labels: [not_road plane, road plane] per sample ──────────
        let mut labels = Vec::with_capacity(batch_size * NUM_CLASSES * plane);
        for s in &items {
            labels.extend(s.mask.iter().map(|&m| if m == 0 { 1.0f32 } else { 0.0 }));
            labels.extend(s.mask.iter().map(|&m| if m == 0 { 0.0f32 } else { 1.0 }));
        }

        let mask: Vec<i32> = items
            .iter()
            .flat_map(|s| s.mask.iter().map(|&m| m as i32))
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, 3, height, width]),
            &self.device,
        );
        let labels = Tensor::<B, 4>::from_data(
            TensorData::new(labels, [batch_size, NUM_CLASSES, height, width]),
            &self.device,
        );
        let road_mask = Tensor::<B, 3, Int>::from_data(
            TensorData::new(mask, [batch_size, height, width]),
            &self.device,
        );

        RoadBatch { images, labels, road_mask }
    }
}
