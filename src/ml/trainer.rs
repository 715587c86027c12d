// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop over shuffled batches with Adam, checkpointing the
// model at the end of every epoch.
//
// Generic over the autodiff backend so the same loop runs on
// Autodiff<Wgpu> for real training and Autodiff<NdArray> in tests.
//   - model.valid() returns the model on B::InnerBackend
//   - the validation batcher therefore uses B::InnerBackend too
//   - argmax(1) returns [batch, 1, H, W], squeezed before scoring

use anyhow::{bail, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::RoadBatcher, dataset::RoadDataset};
use crate::domain::segmentation::ConfusionCounts;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{cross_entropy_loss, Fcn8s};

/// Train `model` for `cfg.epochs` epochs and return it.
///
/// `val_dataset` may be empty, in which case validation metrics are
/// reported as NaN / 0.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model:         Fcn8s<B>,
    train_dataset: RoadDataset,
    val_dataset:   RoadDataset,
    ckpt_manager:  &CheckpointManager,
    metrics:       &MetricsLogger,
    device:        &B::Device,
) -> Result<Fcn8s<B>> {
    if train_dataset.sample_count() == 0 {
        bail!("Training set is empty");
    }
    let mut model = model;
    let has_validation = val_dataset.sample_count() > 0;

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader (reshuffled every epoch) ─────────────────────────
    let train_loader = DataLoaderBuilder::new(RoadBatcher::<B>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_loader = DataLoaderBuilder::new(RoadBatcher::<B::InnerBackend>::new(device.clone()))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut best_val_loss = f64::INFINITY;

    for epoch in 1..=cfg.epochs {
        tracing::info!("Epoch {}", epoch);

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let (loss, _) = model.forward_loss(batch.images, batch.labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;
            tracing::info!("Batch {:4} cross_entropy_loss {:.3}", train_batches, loss_val);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let (val_loss, counts) = if has_validation {
            let model_valid = model.valid();
            let mut loss_sum = 0.0f64;
            let mut batches  = 0usize;
            let mut counts   = ConfusionCounts::default();

            for batch in val_loader.iter() {
                let logits = model_valid.forward(batch.images);
                loss_sum += cross_entropy_loss(logits.clone(), batch.labels)
                    .into_scalar()
                    .elem::<f64>();
                batches += 1;

                let predicted = logits.argmax(1).squeeze::<3>(1);
                counts.merge(&confusion(predicted, batch.road_mask));
            }
            (loss_sum / batches.max(1) as f64, counts)
        } else {
            (f64::NAN, ConfusionCounts::default())
        };

        let m = EpochMetrics::new(
            epoch,
            avg_train_loss,
            val_loss,
            counts.pixel_accuracy(),
            counts.road_iou(),
        );
        metrics.log(&m)?;
        if has_validation && m.is_improvement(best_val_loss) {
            best_val_loss = m.val_loss;
            tracing::info!("New best validation loss {:.4} at epoch {}", best_val_loss, epoch);
        }

        if has_validation {
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | pixel_acc={:.1}% | road_iou={:.3}",
                epoch, cfg.epochs, m.train_loss, m.val_loss, m.pixel_acc * 100.0, m.road_iou,
            );
        } else {
            println!("Epoch {:>3}/{} | train_loss={:.4}", epoch, cfg.epochs, m.train_loss);
        }

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!("Checkpoint saved for epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(model)
}

/// Score predicted class indices against the ground-truth road mask.
pub fn confusion<B: Backend>(
    predicted: Tensor<B, 3, Int>,
    truth:     Tensor<B, 3, Int>,
) -> ConfusionCounts {
    let pred: Vec<bool>  = predicted.into_data().iter::<i64>().map(|v| v == 1).collect();
    let truth: Vec<bool> = truth.into_data().iter::<i64>().map(|v| v == 1).collect();
    ConfusionCounts::from_masks(&pred, &truth)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    use crate::data::dataset::RoadSample;
    use crate::ml::model::Fcn8sConfig;
    use crate::ml::vgg::Vgg16Config;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn sample(road_from_row: usize) -> RoadSample {
        let (h, w) = (32, 32);
        let mask = (0..h * w).map(|i| u8::from(i / w >= road_from_row)).collect();
        RoadSample { image: vec![100; h * w * 3], mask, height: h, width: w }
    }

    #[test]
    fn test_confusion_from_tensors() {
        let device = Default::default();
        let pred  = Tensor::<NdArray<f32>, 3, Int>::from_data(
            TensorData::new(vec![1i64, 0, 1, 0], [1, 2, 2]), &device,
        );
        let truth = Tensor::<NdArray<f32>, 3, Int>::from_data(
            TensorData::new(vec![1i64, 1, 0, 0], [1, 2, 2]), &device,
        );
        let c = confusion(pred, truth);
        assert_eq!((c.true_pos, c.false_pos, c.false_neg, c.true_neg), (1, 1, 1, 1));
    }

    #[test]
    fn test_two_epochs_write_checkpoints_and_metrics() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();

        let mut cfg = TrainConfig::default();
        cfg.checkpoint_dir = tmp.path().to_string_lossy().into_owned();
        cfg.epochs     = 2;
        cfg.batch_size = 2;

        let model: Fcn8s<TestBackend> = Fcn8sConfig::new(
            Vgg16Config::new().with_base_channels(2).with_fc_channels(4),
        ).init(&device);

        let ckpt    = CheckpointManager::new(&cfg.checkpoint_dir);
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir).unwrap();

        run_training(
            &cfg,
            model,
            RoadDataset::new(vec![sample(10), sample(20), sample(16)]),
            RoadDataset::new(vec![sample(12)]),
            &ckpt,
            &metrics,
            &device,
        ).unwrap();

        assert_eq!(ckpt.latest_epoch().unwrap(), 2);
        assert!(tmp.path().join("model_epoch_1.mpk").exists());

        let csv = std::fs::read_to_string(metrics.csv_path()).unwrap();
        // header + one row per epoch
        assert_eq!(csv.lines().count(), 3);
    }

    #[test]
    fn test_empty_training_set_is_rejected() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let cfg    = TrainConfig::default();
        let model: Fcn8s<TestBackend> = Fcn8sConfig::new(
            Vgg16Config::new().with_base_channels(2).with_fc_channels(4),
        ).init(&device);

        let result = run_training(
            &cfg,
            model,
            RoadDataset::new(Vec::new()),
            RoadDataset::new(Vec::new()),
            &CheckpointManager::new(tmp.path().to_string_lossy()),
            &MetricsLogger::new(tmp.path().to_string_lossy()).unwrap(),
            &device,
        );
        assert!(result.is_err());
    }

    // ── Parameter updates ────────────────────────────────────────────────────

    fn textured(road_from_row: usize) -> RoadSample {
        let (h, w) = (32, 32);
        let image = (0..h * w * 3).map(|i| (i * 37 % 251) as u8).collect();
        let mask  = (0..h * w).map(|i| u8::from(i / w >= road_from_row)).collect();
        RoadSample { image, mask, height: h, width: w }
    }

    fn values<B: Backend, const D: usize>(t: Tensor<B, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    fn encoder_params<B: Backend>(model: &Fcn8s<B>) -> Vec<f32> {
        let e = &model.encoder;
        let mut v = Vec::new();
        for conv in [&e.stage1.convs[0], &e.stage3.convs[0], &e.fc6, &e.fc7] {
            v.extend(values(conv.weight.val()));
            v.extend(values(conv.bias.as_ref().unwrap().val()));
        }
        v
    }

    fn decoder_params<B: Backend>(model: &Fcn8s<B>) -> Vec<f32> {
        let out = &model.decoder.output;
        let mut v = values(out.weight.val());
        v.extend(values(out.bias.as_ref().unwrap().val()));
        v
    }

    fn train_three_epochs(model: Fcn8s<TestBackend>) -> Fcn8s<TestBackend> {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();

        let mut cfg = TrainConfig::default();
        cfg.checkpoint_dir = tmp.path().to_string_lossy().into_owned();
        cfg.epochs     = 3;
        cfg.batch_size = 2;

        run_training(
            &cfg,
            model,
            RoadDataset::new(vec![textured(8), textured(16), textured(20), textured(28)]),
            RoadDataset::new(Vec::new()),
            &CheckpointManager::new(&cfg.checkpoint_dir),
            &MetricsLogger::new(&cfg.checkpoint_dir).unwrap(),
            &device,
        )
        .unwrap()
    }

    fn tiny_model() -> Fcn8s<TestBackend> {
        Fcn8sConfig::new(Vgg16Config::new().with_base_channels(4).with_fc_channels(8))
            .init(&Default::default())
    }

    #[test]
    fn test_frozen_encoder_is_untouched_while_decoder_learns() {
        let model   = tiny_model().freeze_encoder();
        let encoder = encoder_params(&model);
        let decoder = decoder_params(&model);

        let trained = train_three_epochs(model);

        assert_eq!(encoder_params(&trained), encoder);
        assert_ne!(decoder_params(&trained), decoder);
    }

    #[test]
    fn test_fine_tuning_updates_encoder() {
        let model   = tiny_model();
        let encoder = encoder_params(&model);
        let decoder = decoder_params(&model);

        let trained = train_three_epochs(model);

        assert_ne!(encoder_params(&trained), encoder);
        assert_ne!(decoder_params(&trained), decoder);
    }
}
