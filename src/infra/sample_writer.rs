// ============================================================
// Layer 6 — Inference Sample Writer
// ============================================================
// Writes qualitative results for the unlabelled KITTI test frames:
//
//   runs/
//     1718031234/            ← one directory per run (unix seconds)
//       um_000000.png        ← resized frame, road overlaid in green
//       ...
//
// Each frame is resized to the model's ImageShape before inference,
// and the saved image has that resized shape.

use anyhow::{Context, Result};
use burn::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::data::preprocessor::Preprocessor;
use crate::infra::overlay::{overlay_mask, ROAD_OVERLAY};
use crate::ml::inferencer::Inferencer;

pub struct SampleWriter {
    runs_dir: PathBuf,
}

impl SampleWriter {
    pub fn new(runs_dir: impl Into<PathBuf>) -> Self {
        Self { runs_dir: runs_dir.into() }
    }

    /// Create `runs/<unix-seconds>/`; a suffix is added if that
    /// directory already exists.
    pub fn create_run_dir(&self) -> Result<PathBuf> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let mut dir = self.runs_dir.join(stamp.to_string());
        let mut n = 1;
        while dir.exists() {
            dir = self.runs_dir.join(format!("{stamp}_{n}"));
            n += 1;
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        Ok(dir)
    }

    /// Run every test frame through the model and save the overlays.
    /// Returns the run directory.
    pub fn save_inference_samples<B: Backend>(
        &self,
        test_images:  &[PathBuf],
        preprocessor: &Preprocessor,
        inferencer:   &Inferencer<B>,
    ) -> Result<PathBuf> {
        let out_dir = self.create_run_dir()?;
        tracing::info!(
            "Training finished. Saving {} test images to: {}",
            test_images.len(),
            out_dir.display()
        );

        let mut written = 0usize;
        for path in test_images {
            match write_one(path, &out_dir, preprocessor, inferencer) {
                Ok(())  => written += 1,
                Err(e)  => tracing::warn!("Skipping '{}': {:#}", path.display(), e),
            }
        }

        tracing::info!("Wrote {} inference images", written);
        Ok(out_dir)
    }
}

fn write_one<B: Backend>(
    path:         &Path,
    out_dir:      &Path,
    preprocessor: &Preprocessor,
    inferencer:   &Inferencer<B>,
) -> Result<()> {
    let frame = preprocessor.load_image(path)?;
    let mask  = inferencer.road_mask(&frame)?;
    let out   = overlay_mask(&frame, &mask, ROAD_OVERLAY);

    let name = path
        .file_name()
        .with_context(|| format!("'{}' has no file name", path.display()))?;
    let target = out_dir.join(name);
    out.save(&target)
        .with_context(|| format!("Cannot write '{}'", target.display()))?;
    Ok(())
}
