// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and hands everything else to Layer 2 (application).
//
//   1. `train`      — train FCN-8s and write test overlays
//   2. `infer`      — overlays from a saved checkpoint
//   3. `check-data` — report dataset / weight presence

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{CheckDataArgs, Commands, InferArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "kitti-road-fcn",
    version = "0.1.0",
    about = "Train an FCN-8s road segmenter on KITTI from a pretrained VGG16."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)     => run_train(args),
            Commands::Infer(args)     => run_infer(args),
            Commands::CheckData(args) => run_check_data(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on KITTI data in: {}", args.data_dir);
    let checkpoint_dir = args.checkpoint_dir.clone();
    TrainUseCase::new(args.into()).execute()?;

    println!("Training complete. Checkpoints saved in '{checkpoint_dir}'.");
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    use crate::application::infer_use_case::InferUseCase;

    let out_dir = InferUseCase::new(args.into()).execute()?;
    println!("Overlays written to '{}'.", out_dir.display());
    Ok(())
}

fn run_check_data(args: CheckDataArgs) -> Result<()> {
    use crate::application::check_data_use_case::CheckDataUseCase;

    let check = CheckDataUseCase::new(args.data_dir, args.vgg_dir).execute()?;
    print!("{}", check.summary());
    Ok(())
}
