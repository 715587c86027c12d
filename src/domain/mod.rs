// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the road-segmentation problem:
// image shapes, labelled image pairs, the two pixel classes and
// the confusion counts used to score a predicted mask.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything in here can be unit tested without a GPU or a
// dataset on disk.

// Input resolution the network is trained and evaluated at
pub mod shape;

// A camera frame paired with its ground-truth road label
pub mod sample;

// Pixel-level scoring of predicted road masks
pub mod segmentation;

// Core abstractions (traits) that other layers implement
pub mod traits;
