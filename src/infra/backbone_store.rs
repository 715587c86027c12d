// ============================================================
// Layer 6 — Pretrained Backbone Store
// ============================================================
// Loads ImageNet-pretrained VGG16 weights into the encoder.
//
// Expected file:  <vgg_dir>/vgg16.mpk
//
// The file is a Burn named-MessagePack record (full precision) of
// `Vgg16Encoder` with base_channels = 64 and fc_channels = 4096.
// It is produced once, by importing the torchvision VGG16 weights
// (fc6/fc7 reshaped to 7×7 and 1×1 convolutions) and saving the
// encoder with `BackboneStore::save`.

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};
use std::path::PathBuf;

use crate::ml::vgg::Vgg16Encoder;

const BACKBONE_STEM: &str = "vgg16";

pub struct BackboneStore {
    dir: PathBuf,
}

impl BackboneStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of the weight file, extension included
    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("{BACKBONE_STEM}.mpk"))
    }

    pub fn exists(&self) -> bool {
        self.weights_path().is_file()
    }

    /// Replace the encoder's parameters with the pretrained ones.
    pub fn load_into<B: Backend>(
        &self,
        encoder: Vgg16Encoder<B>,
        device:  &B::Device,
    ) -> Result<Vgg16Encoder<B>> {
        let path = self.weights_path();
        if !path.is_file() {
            bail!(
                "Pretrained VGG16 weights not found at '{}'. Convert the torchvision \
                 VGG16 weights to a Burn record and place them there.",
                path.display()
            );
        }

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let encoder = encoder
            .load_file(self.dir.join(BACKBONE_STEM), &recorder, device)
            .with_context(|| {
                format!("'{}' does not match the VGG16 encoder layout", path.display())
            })?;

        tracing::info!("Loaded pretrained VGG16 from '{}'", path.display());
        Ok(encoder)
    }

    /// Write an encoder's parameters in the format `load_into` reads.
    pub fn save<B: Backend>(&self, encoder: &Vgg16Encoder<B>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        encoder
            .clone()
            .save_file(self.dir.join(BACKBONE_STEM), &recorder)
            .with_context(|| format!("Cannot write '{}'", self.weights_path().display()))?;
        Ok(())
    }
}
