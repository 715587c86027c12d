// ============================================================
// Layer 2 — InferUseCase
// ============================================================
// Rebuilds the trained network from the checkpoint directory and
// writes road overlays for every KITTI test frame:
//
//   Step 1: Read train_config.json            (Layer 6 - infra)
//   Step 2: Build FCN-8s, load weights        (Layer 5/6)
//   Step 3: List test frames                  (Layer 4 - data)
//   Step 4: Write overlays to runs/<stamp>/   (Layer 6 - infra)
//
// No autodiff wrapper is needed here: the plain backend is enough.

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice},
    prelude::*,
};
use std::path::PathBuf;

use crate::application::train_use_case::{BackendKind, TrainConfig};
use crate::data::{loader::KittiLoader, preprocessor::Preprocessor};
use crate::domain::traits::SampleSource;
use crate::infra::{checkpoint::CheckpointManager, sample_writer::SampleWriter};
use crate::ml::{inferencer::Inferencer, CpuBackend, GpuBackend};

/// Settings for an inference run. Anything left as `None` falls back
/// to what the training run recorded.
#[derive(Debug, Clone)]
pub struct InferConfig {
    pub checkpoint_dir: String,
    pub epoch:          Option<usize>,
    pub data_dir:       Option<String>,
    pub runs_dir:       Option<String>,
    pub backend:        Option<BackendKind>,
}

pub struct InferUseCase {
    config: InferConfig,
}

impl InferUseCase {
    pub fn new(config: InferConfig) -> Self {
        Self { config }
    }

    /// Returns the directory the overlays were written to.
    pub fn execute(&self) -> Result<PathBuf> {
        let ckpt      = CheckpointManager::new(&self.config.checkpoint_dir);
        let train_cfg = ckpt.load_config()?;

        match self.config.backend.unwrap_or(train_cfg.backend) {
            BackendKind::Wgpu => {
                self.execute_on::<GpuBackend>(&ckpt, &train_cfg, WgpuDevice::default())
            }
            BackendKind::NdArray => {
                tracing::warn!("No GPU in use, inference runs on the CPU backend");
                self.execute_on::<CpuBackend>(&ckpt, &train_cfg, NdArrayDevice::default())
            }
        }
    }

    fn execute_on<B: Backend>(
        &self,
        ckpt:   &CheckpointManager,
        cfg:    &TrainConfig,
        device: B::Device,
    ) -> Result<PathBuf> {
        let shape = cfg.image_shape()?;

        let model = cfg.model_config().init::<B>(&device);
        let model = ckpt.load_model(model, self.config.epoch, &device)?;

        let data_dir    = self.config.data_dir.as_deref().unwrap_or(&cfg.data_dir);
        let test_images = KittiLoader::new(data_dir).test_images()?;
        tracing::info!("Running inference on {} test frames", test_images.len());

        let runs_dir   = self.config.runs_dir.as_deref().unwrap_or(&cfg.runs_dir);
        let inferencer = Inferencer::new(model, shape, device);
        SampleWriter::new(runs_dir).save_inference_samples(
            &test_images,
            &Preprocessor::new(shape),
            &inferencer,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::{
        tests::{tiny_config, write_kitti_fixture},
        TrainUseCase,
    };

    #[test]
    fn test_infer_without_training_fails() {
        let tmp     = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("no_such_run");
        let cfg = InferConfig {
            checkpoint_dir: missing.to_string_lossy().into_owned(),
            epoch:          None,
            data_dir:       None,
            runs_dir:       None,
            backend:        Some(BackendKind::NdArray),
        };
        assert!(InferUseCase::new(cfg).execute().is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_infer_reuses_training_run() {
        let tmp = tempfile::tempdir().unwrap();
        write_kitti_fixture(tmp.path(), 2);
        let train_cfg = TrainConfig {
            epochs:         2,
            skip_inference: true,
            ..tiny_config(tmp.path())
        };
        TrainUseCase::new(train_cfg.clone()).execute().unwrap();
        assert!(!tmp.path().join("runs").exists());

        let out_dir = InferUseCase::new(InferConfig {
            checkpoint_dir: train_cfg.checkpoint_dir.clone(),
            epoch:          Some(1),
            data_dir:       None,
            runs_dir:       Some(tmp.path().join("infer_runs").to_string_lossy().into_owned()),
            backend:        None,
        })
        .execute()
        .unwrap();

        assert!(out_dir.starts_with(tmp.path().join("infer_runs")));
        let saved = image::open(out_dir.join("um_000100.png")).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (64, 32));
    }
}
