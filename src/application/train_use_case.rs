// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Verify the KITTI directory tree   (Layer 4 - data)
//   Step 2: Pair frames with road labels      (Layer 4 - data)
//   Step 3: Resize + build road masks         (Layer 4 - data)
//   Step 4: Split train/validation            (Layer 4 - data)
//   Step 5: Build datasets                    (Layer 4 - data)
//   Step 6: Save config                       (Layer 6 - infra)
//   Step 7: Build FCN-8s, load VGG16 weights  (Layer 5/6)
//   Step 8: Run training loop                 (Layer 5 - ml)
//   Step 9: Write inference overlays          (Layer 6 - infra)

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::RoadDataset,
    loader::KittiLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::{shape::ImageShape, traits::SampleSource};
use crate::infra::{
    backbone_store::BackboneStore,
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    sample_writer::SampleWriter,
};
use crate::ml::{
    inferencer::Inferencer,
    model::Fcn8sConfig,
    trainer::run_training,
    vgg::Vgg16Config,
    CpuBackend, GpuBackend,
};

// ─── Backend Selection ────────────────────────────────────────────────────────
/// Which burn backend runs the tensor math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU through wgpu (Vulkan / Metal / DX12)
    Wgpu,
    /// Plain CPU, slow but always available
    NdArray,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run.
// Saved next to the checkpoints so `infer` rebuilds the same network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:           String,
    pub vgg_dir:            String,
    pub checkpoint_dir:     String,
    pub runs_dir:           String,
    pub image_height:       usize,
    pub image_width:        usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    pub dropout:            f64,
    pub train_fraction:     f64,
    pub seed:               u64,
    pub fine_tune_backbone: bool,
    pub skip_inference:     bool,
    pub backend:            BackendKind,
    pub base_channels:      usize,
    pub fc_channels:        usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:           "data".to_string(),
            vgg_dir:            "data/vgg".to_string(),
            checkpoint_dir:     "models".to_string(),
            runs_dir:           "runs".to_string(),
            image_height:       160,
            image_width:        576,
            batch_size:         10,
            epochs:             15,
            lr:                 1e-3,
            dropout:            0.2,
            train_fraction:     1.0,
            seed:               42,
            fine_tune_backbone: false,
            skip_inference:     false,
            backend:            BackendKind::Wgpu,
            base_channels:      64,
            fc_channels:        4096,
        }
    }
}

impl TrainConfig {
    pub fn image_shape(&self) -> Result<ImageShape> {
        ImageShape::new(self.image_height, self.image_width)
    }

    /// Network architecture described by this config
    pub fn model_config(&self) -> Fcn8sConfig {
        Fcn8sConfig::new(
            Vgg16Config::new()
                .with_base_channels(self.base_channels)
                .with_fc_channels(self.fc_channels)
                .with_dropout(self.dropout),
        )
    }

    fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("--epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            bail!("--train-fraction must be in (0, 1], got {}", self.train_fraction);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("--dropout must be in [0, 1), got {}", self.dropout);
        }
        self.image_shape()?;
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline on the configured backend
    pub fn execute(&self) -> Result<()> {
        self.config.validate()?;
        match self.config.backend {
            BackendKind::Wgpu => {
                self.execute_on::<Autodiff<GpuBackend>>(WgpuDevice::default())
            }
            BackendKind::NdArray => {
                tracing::warn!("No GPU in use, training on the CPU backend will be slow");
                self.execute_on::<Autodiff<CpuBackend>>(NdArrayDevice::default())
            }
        }
    }

    fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<()> {
        let cfg   = &self.config;
        let shape = cfg.image_shape()?;

        // ── Step 1: Verify dataset ────────────────────────────────────────────
        let loader = KittiLoader::new(&cfg.data_dir);
        loader.check_layout()?;

        // ── Step 2: Pair frames with labels ───────────────────────────────────
        let pairs = loader.load_pairs()?;

        // ── Step 3: Preprocess ────────────────────────────────────────────────
        let preprocessor = Preprocessor::new(shape);
        let samples      = preprocessor.load_samples(&pairs);
        if samples.is_empty() {
            bail!("None of the {} training pairs could be decoded", pairs.len());
        }
        let road_share = samples.iter().map(|s| s.road_fraction()).sum::<f64>() / samples.len() as f64;
        tracing::info!(
            "Preprocessed {} samples at {}x{} ({:.1}% road pixels)",
            samples.len(),
            shape.height,
            shape.width,
            road_share * 100.0
        );

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train_samples, val_samples) = split_train_val(samples, cfg.train_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} validation",
            train_samples.len(),
            val_samples.len()
        );

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = RoadDataset::new(train_samples);
        let val_dataset   = RoadDataset::new(val_samples);

        // ── Step 6: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir);
        ckpt_manager.save_config(cfg)?;

        // ── Step 7: Model with pretrained encoder ─────────────────────────────
        let mut model = cfg.model_config().init::<B>(&device);
        model.encoder = BackboneStore::new(&cfg.vgg_dir).load_into(model.encoder, &device)?;
        let model = if cfg.fine_tune_backbone {
            tracing::info!("Fine-tuning the VGG16 encoder with the decoder");
            model
        } else {
            model.freeze_encoder()
        };

        // ── Step 8: Training loop ─────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;
        let model = run_training(
            cfg,
            model,
            train_dataset,
            val_dataset,
            &ckpt_manager,
            &metrics,
            &device,
        )?;

        // ── Step 9: Qualitative output ────────────────────────────────────────
        if cfg.skip_inference {
            return Ok(());
        }
        let test_images = loader.test_images()?;
        let inferencer  = Inferencer::new(model.valid(), shape, device);
        SampleWriter::new(&cfg.runs_dir).save_inference_samples(
            &test_images,
            &preprocessor,
            &inferencer,
        )?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::NdArray;
    use image::{Rgb, RgbImage};
    use std::{fs, path::Path};

    /// Tiny KITTI tree: `n` labelled 64×32 frames, one test frame.
    pub(crate) fn write_kitti_fixture(data_dir: &Path, n: usize) {
        let root = data_dir.join("data_road");
        for sub in ["training/image_2", "training/gt_image_2", "testing/image_2"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        for i in 0..n {
            let frame = RgbImage::from_pixel(64, 32, Rgb([80, 80, 80]));
            frame.save(root.join(format!("training/image_2/um_{i:06}.png"))).unwrap();

            // lower half is road
            let gt = RgbImage::from_fn(64, 32, |_, y| {
                if y >= 16 { Rgb([255, 0, 255]) } else { Rgb([255, 0, 0]) }
            });
            gt.save(root.join(format!("training/gt_image_2/um_road_{i:06}.png"))).unwrap();
        }
        RgbImage::from_pixel(64, 32, Rgb([10, 20, 30]))
            .save(root.join("testing/image_2/um_000100.png"))
            .unwrap();
    }

    /// A CPU config with a tiny network whose pretrained encoder has
    /// already been written under `<tmp>/vgg`.
    pub(crate) fn tiny_config(tmp: &Path) -> TrainConfig {
        let cfg = TrainConfig {
            data_dir:       tmp.to_string_lossy().into_owned(),
            vgg_dir:        tmp.join("vgg").to_string_lossy().into_owned(),
            checkpoint_dir: tmp.join("models").to_string_lossy().into_owned(),
            runs_dir:       tmp.join("runs").to_string_lossy().into_owned(),
            image_height:   32,
            image_width:    64,
            batch_size:     2,
            epochs:         1,
            backend:        BackendKind::NdArray,
            base_channels:  2,
            fc_channels:    4,
            ..TrainConfig::default()
        };
        let encoder = cfg.model_config().encoder.init::<NdArray<f32>>(&Default::default());
        BackboneStore::new(&cfg.vgg_dir).save(&encoder).unwrap();
        cfg
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!((cfg.epochs, cfg.batch_size), (15, 10));
        assert_eq!(cfg.image_shape().unwrap(), ImageShape::new(160, 576).unwrap());
        assert!((cfg.dropout - 0.2).abs() < 1e-12);
        assert!(!cfg.fine_tune_backbone);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let bad = [
            TrainConfig { epochs: 0, ..TrainConfig::default() },
            TrainConfig { train_fraction: 0.0, ..TrainConfig::default() },
            TrainConfig { image_height: 100, ..TrainConfig::default() },
            TrainConfig { dropout: 1.0, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn test_backend_kind_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&BackendKind::NdArray).unwrap(), "\"ndarray\"");
    }

    #[test]
    fn test_end_to_end_training_on_cpu() {
        let tmp = tempfile::tempdir().unwrap();
        write_kitti_fixture(tmp.path(), 3);
        let cfg = tiny_config(tmp.path());

        TrainUseCase::new(cfg.clone()).execute().unwrap();

        let models = tmp.path().join("models");
        assert!(models.join("model_epoch_1.mpk").exists());
        assert!(models.join("train_config.json").exists());
        assert!(models.join("metrics.csv").exists());

        let runs: Vec<_> = fs::read_dir(tmp.path().join("runs")).unwrap().collect();
        assert_eq!(runs.len(), 1);
        let run_dir = runs.into_iter().next().unwrap().unwrap().path();
        assert!(run_dir.join("um_000100.png").exists());
    }

    #[test]
    fn test_missing_backbone_stops_before_training() {
        let tmp = tempfile::tempdir().unwrap();
        write_kitti_fixture(tmp.path(), 2);
        let cfg = TrainConfig {
            vgg_dir: tmp.path().join("nowhere").to_string_lossy().into_owned(),
            ..tiny_config(tmp.path())
        };

        assert!(TrainUseCase::new(cfg).execute().is_err());
        assert!(!tmp.path().join("models/model_epoch_1.mpk").exists());
    }
}
