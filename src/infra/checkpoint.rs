// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores FCN-8s weights using Burn's CompactRecorder.
//
// File layout:
//   models/
//     model_epoch_1.mpk      ← weights after epoch 1 (half precision)
//     model_epoch_2.mpk      ← weights after epoch 2
//     ...
//     latest_epoch.json      ← number of the newest checkpoint
//     train_config.json      ← config needed to rebuild the network
//
// The config is saved separately because the record only holds
// parameters: inference has to rebuild an identically shaped model
// (image shape, encoder widths) before the weights can be loaded.

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Fcn8s;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const CONFIG_FILE:       &str = "train_config.json";

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Nothing is touched on disk until something is saved.
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", self.dir.display()))
    }

    /// Path of an epoch's checkpoint, without the recorder's extension
    fn model_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    /// Save model weights for `epoch` and point latest_epoch.json at it.
    pub fn save_model<B: Backend>(&self, model: &Fcn8s<B>, epoch: usize) -> Result<()> {
        self.ensure_dir()?;
        let path = self.model_path(epoch);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load weights into `model`, from `epoch` or the latest checkpoint.
    ///
    /// The model must have the architecture the checkpoint was saved
    /// with, or loading fails.
    pub fn load_model<B: Backend>(
        &self,
        model:  Fcn8s<B>,
        epoch:  Option<usize>,
        device: &B::Device,
    ) -> Result<Fcn8s<B>> {
        let epoch = match epoch {
            Some(e) => e,
            None    => self.latest_epoch()?,
        };
        let path = self.model_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'infer'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Epoch number of the newest checkpoint.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);

        let s = fs::read_to_string(&path)
            .with_context(|| {
                format!("Cannot find '{}'. Have you run 'train' first?", path.display())
            })?;

        let epoch = serde_json::from_str::<usize>(&s)?;
        if epoch == 0 {
            bail!("'{}' holds epoch 0; epochs are numbered from 1", path.display());
        }
        Ok(epoch)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::model::Fcn8sConfig;
    use crate::ml::vgg::Vgg16Config;

    type TestBackend = NdArray<f32>;

    fn tiny() -> Fcn8sConfig {
        Fcn8sConfig::new(Vgg16Config::new().with_base_channels(2).with_fc_channels(4))
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().to_string_lossy());
        assert!(ckpt.latest_epoch().is_err());
        assert!(ckpt.load_config().is_err());
    }

    #[test]
    fn test_reads_never_create_the_directory() {
        let tmp     = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("mistyped");
        let ckpt    = CheckpointManager::new(missing.to_string_lossy());

        assert!(ckpt.load_config().is_err());
        assert!(ckpt.latest_epoch().is_err());
        assert!(!missing.exists());

        ckpt.save_config(&TrainConfig::default()).unwrap();
        assert!(missing.join("train_config.json").exists());
    }

    #[test]
    fn test_saved_weights_reload_into_fresh_model() {
        let tmp    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(tmp.path().to_string_lossy());
        let device = Default::default();

        let trained: Fcn8s<TestBackend> = tiny().init(&device);
        ckpt.save_model(&trained, 1).unwrap();
        ckpt.save_model(&trained, 3).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);

        let fresh: Fcn8s<TestBackend> = tiny().init(&device);
        let loaded = ckpt.load_model(fresh, Some(1), &device).unwrap();

        let expected: Vec<f32> = trained.decoder.output.weight.val().into_data().to_vec().unwrap();
        let actual:   Vec<f32> = loaded.decoder.output.weight.val().into_data().to_vec().unwrap();
        // CompactRecorder stores half precision
        for (a, e) in actual.iter().zip(&expected) {
            assert!((a - e).abs() < 1e-3);
        }
    }

    #[test]
    fn test_config_round_trip() {
        let tmp  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(tmp.path().to_string_lossy());
        let mut cfg = TrainConfig::default();
        cfg.epochs = 3;
        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap().epochs, 3);
    }
}
