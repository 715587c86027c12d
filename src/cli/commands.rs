// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `infer` and `check-data`
// and all their configurable flags.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    infer_use_case::InferConfig,
    train_use_case::{BackendKind, TrainConfig},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train FCN-8s on KITTI road and save overlays for the test frames
    Train(TrainArgs),

    /// Write road overlays using a saved checkpoint
    Infer(InferArgs),

    /// Check that the dataset and the VGG16 weights are in place
    CheckData(CheckDataArgs),
}

/// Compute backend
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum BackendArg {
    Wgpu,
    Ndarray,
}

impl From<BackendArg> for BackendKind {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Wgpu    => BackendKind::Wgpu,
            BackendArg::Ndarray => BackendKind::NdArray,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing data_road/
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory containing vgg16.mpk
    #[arg(long, default_value = "data/vgg")]
    pub vgg_dir: String,

    /// Where checkpoints, metrics.csv and train_config.json go
    #[arg(long, default_value = "models")]
    pub checkpoint_dir: String,

    /// Where the inference overlays go
    #[arg(long, default_value = "runs")]
    pub runs_dir: String,

    /// Network input height, a multiple of 32
    #[arg(long, default_value_t = 160)]
    pub image_height: usize,

    /// Network input width, a multiple of 32
    #[arg(long, default_value_t = 576)]
    pub image_width: usize,

    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 15)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Drop probability after fc6 and fc7
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Share of labelled frames used for training; the rest validates
    #[arg(long, default_value_t = 1.0)]
    pub train_fraction: f64,

    /// Seed for the split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Also update the pretrained VGG16 weights
    #[arg(long)]
    pub fine_tune_backbone: bool,

    /// Stop after training without writing overlays
    #[arg(long)]
    pub skip_inference: bool,

    #[arg(long, value_enum, default_value_t = BackendArg::Wgpu)]
    pub backend: BackendArg,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:           a.data_dir,
            vgg_dir:            a.vgg_dir,
            checkpoint_dir:     a.checkpoint_dir,
            runs_dir:           a.runs_dir,
            image_height:       a.image_height,
            image_width:        a.image_width,
            batch_size:         a.batch_size,
            epochs:             a.epochs,
            lr:                 a.lr,
            dropout:            a.dropout,
            train_fraction:     a.train_fraction,
            seed:               a.seed,
            fine_tune_backbone: a.fine_tune_backbone,
            skip_inference:     a.skip_inference,
            backend:            a.backend.into(),
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Directory the `train` run wrote its checkpoints to
    #[arg(long, default_value = "models")]
    pub checkpoint_dir: String,

    /// Checkpoint epoch to load (default: the latest)
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Override the data directory recorded at training time
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override the runs directory recorded at training time
    #[arg(long)]
    pub runs_dir: Option<String>,

    /// Override the backend recorded at training time
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

impl From<InferArgs> for InferConfig {
    fn from(a: InferArgs) -> Self {
        InferConfig {
            checkpoint_dir: a.checkpoint_dir,
            epoch:          a.epoch,
            data_dir:       a.data_dir,
            runs_dir:       a.runs_dir,
            backend:        a.backend.map(Into::into),
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckDataArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    #[arg(long, default_value = "data/vgg")]
    pub vgg_dir: String,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["kitti-road-fcn", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();
        assert_eq!((cfg.epochs, cfg.batch_size), (def.epochs, def.batch_size));
        assert_eq!((cfg.image_height, cfg.image_width), (160, 576));
        assert_eq!(cfg.backend, BackendKind::Wgpu);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "kitti-road-fcn", "train",
            "--epochs", "3",
            "--backend", "ndarray",
            "--fine-tune-backbone",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.backend, BackendKind::NdArray);
        assert!(cfg.fine_tune_backbone);
    }

    #[test]
    fn test_infer_overrides_are_optional() {
        let cli = Cli::try_parse_from(["kitti-road-fcn", "infer", "--epoch", "7"]).unwrap();
        let Commands::Infer(args) = cli.command else { panic!("expected infer") };
        let cfg: InferConfig = args.into();
        assert_eq!(cfg.epoch, Some(7));
        assert!(cfg.backend.is_none() && cfg.data_dir.is_none());
    }

    #[test]
    fn test_check_data_subcommand_name() {
        assert!(Cli::try_parse_from(["kitti-road-fcn", "check-data"]).is_ok());
    }
}
