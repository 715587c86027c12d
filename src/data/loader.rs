// ============================================================
// Layer 4 — KITTI Road Loader
// ============================================================
// Finds training pairs and test frames in the KITTI road layout:
//
//   <data_dir>/data_road/
//     training/
//       image_2/      um_000000.png, umm_000000.png, uu_000000.png ...
//       gt_image_2/   um_road_000000.png, um_lane_000000.png ...
//     testing/
//       image_2/      um_000000.png ...
//
// A ground-truth file belongs to the image whose name is obtained by
// removing the "_road_" infix: um_road_000000.png → um_000000.png.
// Lane annotations ("_lane_") only exist for the um_ category and
// are not used; the task is road vs. not road.

use anyhow::{bail, Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::domain::sample::ImagePair;
use crate::domain::traits::SampleSource;

/// Sizes of the official KITTI road release.
pub const EXPECTED_TRAINING_IMAGES: usize = 289;
pub const EXPECTED_ROAD_LABELS:     usize = 289;
pub const EXPECTED_TESTING_IMAGES:  usize = 290;

/// What `check_layout` found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutReport {
    pub training_images: usize,
    pub road_labels:     usize,
    pub testing_images:  usize,
}

impl LayoutReport {
    /// True when every count matches the official release
    pub fn is_complete(&self) -> bool {
        self.training_images == EXPECTED_TRAINING_IMAGES
            && self.road_labels == EXPECTED_ROAD_LABELS
            && self.testing_images == EXPECTED_TESTING_IMAGES
    }
}

/// Walks a KITTI road directory tree.
/// Implements the SampleSource trait from Layer 3.
pub struct KittiLoader {
    /// `<data_dir>/data_road`
    root: PathBuf,
}

impl KittiLoader {
    /// `data_dir` is the directory that contains `data_road/`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self { root: data_dir.as_ref().join("data_road") }
    }

    pub fn training_image_dir(&self) -> PathBuf {
        self.root.join("training").join("image_2")
    }

    pub fn training_label_dir(&self) -> PathBuf {
        self.root.join("training").join("gt_image_2")
    }

    pub fn testing_image_dir(&self) -> PathBuf {
        self.root.join("testing").join("image_2")
    }

    /// Count what is on disk. Missing directories are an error;
    /// unexpected counts only produce a warning so partial datasets
    /// (or small fixtures) still work.
    pub fn check_layout(&self) -> Result<LayoutReport> {
        for dir in [
            self.training_image_dir(),
            self.training_label_dir(),
            self.testing_image_dir(),
        ] {
            if !dir.is_dir() {
                bail!(
                    "KITTI road directory '{}' not found. Download data_road.zip from \
                     http://www.cvlibs.net/datasets/kitti/eval_road.php and extract it \
                     into the data directory.",
                    dir.display()
                );
            }
        }

        let report = LayoutReport {
            training_images: list_pngs(&self.training_image_dir())?.len(),
            road_labels:     road_label_files(&self.training_label_dir())?.len(),
            testing_images:  list_pngs(&self.testing_image_dir())?.len(),
        };

        if !report.is_complete() {
            tracing::warn!(
                "Unexpected KITTI road counts: {} training images (expected {}), \
                 {} road labels (expected {}), {} testing images (expected {})",
                report.training_images, EXPECTED_TRAINING_IMAGES,
                report.road_labels,     EXPECTED_ROAD_LABELS,
                report.testing_images,  EXPECTED_TESTING_IMAGES,
            );
        }
        Ok(report)
    }
}

impl SampleSource for KittiLoader {
    fn load_pairs(&self) -> Result<Vec<ImagePair>> {
        // image file name → road label path
        let labels: HashMap<String, PathBuf> = road_label_files(&self.training_label_dir())?
            .into_iter()
            .filter_map(|label| {
                let name = label.file_name()?.to_str()?;
                Some((image_name_for_label(name)?, label))
            })
            .collect();

        let mut pairs = Vec::new();
        for image in list_pngs(&self.training_image_dir())? {
            let Some(name) = image.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match labels.get(name) {
                Some(label) => pairs.push(ImagePair::new(image.clone(), label.clone())),
                None => tracing::warn!("No road label for '{}', skipping", image.display()),
            }
        }

        if pairs.is_empty() {
            bail!(
                "No labelled training images found under '{}'",
                self.root.join("training").display()
            );
        }
        tracing::info!("Found {} labelled training images", pairs.len());
        Ok(pairs)
    }

    fn test_images(&self) -> Result<Vec<PathBuf>> {
        list_pngs(&self.testing_image_dir())
    }
}

/// Map a ground-truth file name to the camera frame it annotates.
/// Returns None for anything that is not a road label.
pub fn image_name_for_label(label_name: &str) -> Option<String> {
    if !label_name.ends_with(".png") {
        return None;
    }
    let (category, rest) = label_name.split_once("_road_")?;
    Some(format!("{category}_{rest}"))
}

/// All `*_road_*.png` files of a ground-truth directory
fn road_label_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_pngs(dir)?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains("_road_"))
        })
        .collect())
}

/// PNG files of a directory, sorted by path so runs are reproducible
fn list_pngs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("png") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
