// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the model:
//
//   checkpoint.rs     — per-epoch FCN-8s weights (CompactRecorder)
//                       plus the TrainConfig needed to rebuild it
//
//   backbone_store.rs — pretrained VGG16 encoder weights
//
//   metrics.rs        — per-epoch loss / accuracy / IoU CSV
//
//   overlay.rs        — paints predicted road pixels onto a frame
//
//   sample_writer.rs  — runs the test frames through the model and
//                       saves the overlays under runs/<timestamp>/

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Pretrained encoder weights
pub mod backbone_store;

/// Training metrics CSV logger
pub mod metrics;

/// Road mask overlay drawing
pub mod overlay;

/// Qualitative inference output
pub mod sample_writer;
