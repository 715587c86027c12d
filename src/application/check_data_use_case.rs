// ============================================================
// Layer 2 — CheckDataUseCase
// ============================================================
// Reports whether the KITTI road data and the pretrained VGG16
// weights are where `train` will look for them.

use anyhow::Result;

use crate::data::loader::{
    KittiLoader, LayoutReport, EXPECTED_ROAD_LABELS, EXPECTED_TESTING_IMAGES,
    EXPECTED_TRAINING_IMAGES,
};
use crate::infra::backbone_store::BackboneStore;

/// What was found on disk
#[derive(Debug, Clone)]
pub struct DataCheck {
    pub layout:        LayoutReport,
    pub backbone_ok:   bool,
    pub backbone_path: String,
}

pub struct CheckDataUseCase {
    data_dir: String,
    vgg_dir:  String,
}

impl CheckDataUseCase {
    pub fn new(data_dir: String, vgg_dir: String) -> Self {
        Self { data_dir, vgg_dir }
    }

    /// Fails only when a required dataset directory is missing;
    /// unexpected counts and absent weights are reported.
    pub fn execute(&self) -> Result<DataCheck> {
        let layout = KittiLoader::new(&self.data_dir).check_layout()?;
        let store  = BackboneStore::new(&self.vgg_dir);
        Ok(DataCheck {
            layout,
            backbone_ok:   store.exists(),
            backbone_path: store.weights_path().display().to_string(),
        })
    }
}

impl DataCheck {
    pub fn summary(&self) -> String {
        let row = |label: &str, found: usize, expected: usize| {
            let mark = if found == expected { "ok" } else { "MISMATCH" };
            format!("  {label:<16} {found:>4} / {expected:<4} {mark}\n")
        };
        let mut s = String::from("KITTI road dataset\n");
        s += &row("training images", self.layout.training_images, EXPECTED_TRAINING_IMAGES);
        s += &row("road labels", self.layout.road_labels, EXPECTED_ROAD_LABELS);
        s += &row("testing images", self.layout.testing_images, EXPECTED_TESTING_IMAGES);
        s += &format!(
            "VGG16 weights\n  {} {}\n",
            self.backbone_path,
            if self.backbone_ok { "ok" } else { "MISSING" }
        );
        s
    }
}
