// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// From a KITTI directory on disk to tensor batches:
//
//   data_road/training
//       │
//       ▼
//   KittiLoader       → pairs camera frames with road labels
//       │
//       ▼
//   Preprocessor      → resizes, builds the per-pixel road mask
//       │
//       ▼
//   split_train_val   → optional validation hold-out
//       │
//       ▼
//   RoadDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   RoadBatcher       → stacks samples into image/label tensors
//       │
//       ▼
//   DataLoader        → feeds shuffled batches to the training loop

/// Finds training pairs and test frames in the KITTI road layout
pub mod loader;

/// Decodes and resizes frames and ground truth
pub mod preprocessor;

/// Implements Burn's Dataset trait for road samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
