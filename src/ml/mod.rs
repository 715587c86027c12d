// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network code lives here:
//
//   vgg.rs        — VGG16 encoder, fully-connected layers as
//                   convolutions, exposing the pool3 / pool4 / fc7
//                   feature maps
//
//   model.rs      — FCN-8s decoder grafted onto the encoder:
//                   1×1 class scores, transposed-conv upsampling,
//                   two skip connections, per-pixel cross entropy
//
//   trainer.rs    — Epoch/batch loop with Adam, optional
//                   validation, per-epoch checkpoints
//
//   inferencer.rs — Softmax road probabilities for a single frame
//
// Reference: Long, Shelhamer & Darrell (2015) Fully Convolutional
//            Networks for Semantic Segmentation

/// VGG16 encoder
pub mod vgg;

/// FCN-8s decoder and loss
pub mod model;

/// Training loop with checkpointing
pub mod trainer;

/// Per-pixel road prediction
pub mod inferencer;

/// GPU backend used for real training and inference
pub type GpuBackend = burn::backend::Wgpu;
/// CPU fallback backend
pub type CpuBackend = burn::backend::NdArray<f32>;
