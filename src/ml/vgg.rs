// ============================================================
// Layer 5 — VGG16 Encoder
// ============================================================
// The convolutional part of VGG16 with its fully connected layers
// rewritten as convolutions, so any input size divisible by 32
// produces a spatial feature map instead of a single vector.
//
//   stage1  2 × conv3x3 (  base)  + maxpool   → /2
//   stage2  2 × conv3x3 (2·base)  + maxpool   → /4
//   stage3  3 × conv3x3 (4·base)  + maxpool   → /8   (layer3_out)
//   stage4  3 × conv3x3 (8·base)  + maxpool   → /16  (layer4_out)
//   stage5  3 × conv3x3 (8·base)  + maxpool   → /32
//   fc6     conv7x7 (fc_channels) + dropout
//   fc7     conv1x1 (fc_channels) + dropout             (layer7_out)
//
// With base = 64 and fc_channels = 4096 this is exactly VGG16 and
// the pretrained ImageNet weights load into it. Smaller widths are
// only useful for tests.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

/// Number of 3×3 convolutions in each of the five stages.
const STAGE_DEPTHS: [usize; 5] = [2, 2, 3, 3, 3];
/// Channel multiplier of each stage relative to `base_channels`.
const STAGE_WIDTHS: [usize; 5] = [1, 2, 4, 8, 8];

#[derive(Config, Debug)]
pub struct Vgg16Config {
    /// Width of the first stage (64 in VGG16)
    #[config(default = 64)]
    pub base_channels: usize,
    /// Width of fc6/fc7 (4096 in VGG16)
    #[config(default = 4096)]
    pub fc_channels: usize,
    /// Drop probability after fc6 and fc7 (keep probability 0.8)
    #[config(default = 0.2)]
    pub dropout: f64,
}

impl Vgg16Config {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Vgg16Encoder<B> {
        let width = |stage: usize| self.base_channels * STAGE_WIDTHS[stage];
        let stage = |i: usize, c_in: usize| ConvStage::new(c_in, width(i), STAGE_DEPTHS[i], device);

        let fc6 = Conv2dConfig::new([width(4), self.fc_channels], [7, 7])
            .with_padding(PaddingConfig2d::Explicit(3, 3))
            .init(device);
        let fc7 = Conv2dConfig::new([self.fc_channels, self.fc_channels], [1, 1]).init(device);

        Vgg16Encoder {
            stage1: stage(0, 3),
            stage2: stage(1, width(0)),
            stage3: stage(2, width(1)),
            stage4: stage(3, width(2)),
            stage5: stage(4, width(3)),
            fc6,
            fc7,
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }

    /// Channels of (layer3_out, layer4_out, layer7_out)
    pub fn tap_channels(&self) -> (usize, usize, usize) {
        (
            self.base_channels * STAGE_WIDTHS[2],
            self.base_channels * STAGE_WIDTHS[3],
            self.fc_channels,
        )
    }
}

/// A run of 3×3 convolutions with ReLU followed by a 2×2 max-pool.
#[derive(Module, Debug)]
pub struct ConvStage<B: Backend> {
    pub convs: Vec<Conv2d<B>>,
    pub pool:  MaxPool2d,
}

impl<B: Backend> ConvStage<B> {
    fn new(in_channels: usize, out_channels: usize, depth: usize, device: &B::Device) -> Self {
        let convs = (0..depth)
            .map(|i| {
                let c_in = if i == 0 { in_channels } else { out_channels };
                Conv2dConfig::new([c_in, out_channels], [3, 3])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(device)
            })
            .collect();
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        Self { convs, pool }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = x;
        for conv in &self.convs {
            x = relu(conv.forward(x));
        }
        self.pool.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct Vgg16Encoder<B: Backend> {
    pub stage1:  ConvStage<B>,
    pub stage2:  ConvStage<B>,
    pub stage3:  ConvStage<B>,
    pub stage4:  ConvStage<B>,
    pub stage5:  ConvStage<B>,
    pub fc6:     Conv2d<B>,
    pub fc7:     Conv2d<B>,
    pub dropout: Dropout,
}

/// The three feature maps the FCN-8s decoder taps into.
pub struct VggFeatures<B: Backend> {
    /// After pool3, stride 8
    pub layer3: Tensor<B, 4>,
    /// After pool4, stride 16
    pub layer4: Tensor<B, 4>,
    /// After fc7, stride 32
    pub layer7: Tensor<B, 4>,
}

impl<B: Backend> Vgg16Encoder<B> {
    /// images: [batch, 3, H, W] → taps at H/8, H/16 and H/32
    pub fn forward(&self, images: Tensor<B, 4>) -> VggFeatures<B> {
        let x      = self.stage2.forward(self.stage1.forward(images));
        let layer3 = self.stage3.forward(x);
        let layer4 = self.stage4.forward(layer3.clone());
        let x      = self.stage5.forward(layer4.clone());

        let x      = self.dropout.forward(relu(self.fc6.forward(x)));
        let layer7 = self.dropout.forward(relu(self.fc7.forward(x)));

        VggFeatures { layer3, layer4, layer7 }
    }
}
