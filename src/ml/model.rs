use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        Initializer,
    },
    module::Param,
    prelude::*,
    tensor::activation::log_softmax,
};

use crate::ml::vgg::{Vgg16Config, Vgg16Encoder, VggFeatures};

/// Decoder kernels start from N(0, 0.01), biases from zero.
const DECODER_INIT: Initializer = Initializer::Normal { mean: 0.0, std: 0.01 };

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct Fcn8sConfig {
    pub encoder: Vgg16Config,
    #[config(default = 2)]
    pub num_classes: usize,
}

impl Fcn8sConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Fcn8s<B> {
        let (c3, c4, c7) = self.encoder.tap_channels();
        let n = self.num_classes;
        let decoder = Fcn8sDecoder {
            layer7_score: score_layer(c7, n, device),
            upsample7:    upsample_layer(n, 4, 2, device),
            layer4_score: score_layer(c4, n, device),
            upsample4:    upsample_layer(n, 4, 2, device),
            layer3_score: score_layer(c3, n, device),
            output:       upsample_layer(n, 16, 8, device),
        };
        Fcn8s { encoder: self.encoder.init(device), decoder }
    }
}

/// 1×1 convolution projecting an encoder tap onto class scores
fn score_layer<B: Backend>(channels: usize, classes: usize, device: &B::Device) -> Conv2d<B> {
    let mut conv = Conv2dConfig::new([channels, classes], [1, 1])
        .with_initializer(DECODER_INIT)
        .init(device);
    conv.bias = zeroed(conv.bias, device);
    conv
}

/// Transposed convolution whose output is exactly `stride` times its input.
/// Output size is (in - 1)·s - 2p + k, so p = (k - s) / 2 gives in·s.
fn upsample_layer<B: Backend>(
    classes: usize,
    kernel:  usize,
    stride:  usize,
    device:  &B::Device,
) -> ConvTranspose2d<B> {
    let pad = (kernel - stride) / 2;
    let mut deconv = ConvTranspose2dConfig::new([classes, classes], [kernel, kernel])
        .with_stride([stride, stride])
        .with_padding([pad, pad])
        .with_initializer(DECODER_INIT)
        .init(device);
    deconv.bias = zeroed(deconv.bias, device);
    deconv
}

// with_initializer draws the bias from the same distribution
fn zeroed<B: Backend>(
    bias:   Option<Param<Tensor<B, 1>>>,
    device: &B::Device,
) -> Option<Param<Tensor<B, 1>>> {
    bias.map(|b| Param::from_tensor(Tensor::zeros(b.val().dims(), device)))
}

/// The FCN-8s head: score the three taps, upsample the coarsest,
/// add the finer scores on the way up, finish with an ×8 upsample.
#[derive(Module, Debug)]
pub struct Fcn8sDecoder<B: Backend> {
    pub layer7_score: Conv2d<B>,
    pub upsample7:    ConvTranspose2d<B>,
    pub layer4_score: Conv2d<B>,
    pub upsample4:    ConvTranspose2d<B>,
    pub layer3_score: Conv2d<B>,
    pub output:       ConvTranspose2d<B>,
}

impl<B: Backend> Fcn8sDecoder<B> {
    pub fn forward(&self, feats: VggFeatures<B>) -> Tensor<B, 4> {
        let x = self.upsample7.forward(self.layer7_score.forward(feats.layer7));
        let x = x + self.layer4_score.forward(feats.layer4);

        let x = self.upsample4.forward(x);
        let x = x + self.layer3_score.forward(feats.layer3);

        self.output.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct Fcn8s<B: Backend> {
    pub encoder: Vgg16Encoder<B>,
    pub decoder: Fcn8sDecoder<B>,
}

impl<B: Backend> Fcn8s<B> {
    /// images: [batch, 3, H, W] → logits: [batch, num_classes, H, W]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.decoder.forward(self.encoder.forward(images))
    }

    /// Logits and mean per-pixel cross entropy against one-hot labels.
    pub fn forward_loss(
        &self,
        images: Tensor<B, 4>,
        labels: Tensor<B, 4>,
    ) -> (Tensor<B, 1>, Tensor<B, 4>) {
        let logits = self.forward(images);
        let loss   = cross_entropy_loss(logits.clone(), labels);
        (loss, logits)
    }

    /// Stop gradients from reaching the pretrained encoder.
    pub fn freeze_encoder(mut self) -> Self {
        self.encoder = self.encoder.no_grad();
        self
    }
}

/// Softmax cross entropy with soft (one-hot) labels, averaged over
/// every pixel of every image in the batch.
pub fn cross_entropy_loss<B: Backend>(logits: Tensor<B, 4>, labels: Tensor<B, 4>) -> Tensor<B, 1> {
    (log_softmax(logits, 1) * labels).sum_dim(1).neg().mean()
}

/// [batch, classes, H, W] → [batch·H·W, classes], one row per pixel.
pub fn flatten_logits<B: Backend>(logits: Tensor<B, 4>) -> Tensor<B, 2> {
    let [n, c, h, w] = logits.dims();
    logits.permute([0, 2, 3, 1]).reshape([n * h * w, c])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = NdArray<f32>;

    fn tiny_config() -> Fcn8sConfig {
        Fcn8sConfig::new(Vgg16Config::new().with_base_channels(2).with_fc_channels(4))
    }

    #[test]
    fn test_output_matches_input_resolution() {
        let device = Default::default();
        let model: Fcn8s<TestBackend> = tiny_config().init(&device);

        let logits = model.forward(Tensor::zeros([2, 3, 64, 96], &device));
        assert_eq!(logits.dims(), [2, 2, 64, 96]);
        assert_eq!(flatten_logits(logits).dims(), [2 * 64 * 96, 2]);
    }

    #[test]
    fn test_uniform_logits_give_ln2_loss() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 4>::zeros([1, 2, 2, 2], &device);
        let labels = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0], [1, 2, 2, 2]),
            &device,
        );
        let loss: f32 = cross_entropy_loss(logits, labels).into_scalar();
        assert!((loss - std::f32::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn test_confident_correct_logits_give_small_loss() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![10.0f32, -10.0], [1, 2, 1, 1]),
            &device,
        );
        let labels = Tensor::<TestBackend, 4>::from_data(
            TensorData::new(vec![1.0f32, 0.0], [1, 2, 1, 1]),
            &device,
        );
        let loss: f32 = cross_entropy_loss(logits, labels).into_scalar();
        assert!(loss < 1e-3);
    }

    #[test]
    fn test_decoder_biases_start_at_zero() {
        let device = Default::default();
        let model: Fcn8s<TestBackend> = tiny_config().init(&device);
        let d = &model.decoder;

        let biases = [
            d.layer7_score.bias.as_ref().unwrap().val(),
            d.layer4_score.bias.as_ref().unwrap().val(),
            d.layer3_score.bias.as_ref().unwrap().val(),
            d.upsample7.bias.as_ref().unwrap().val(),
            d.upsample4.bias.as_ref().unwrap().val(),
            d.output.bias.as_ref().unwrap().val(),
        ];
        for b in biases {
            assert_eq!(b.dims(), [2]);
            assert!(b.into_data().iter::<f32>().all(|v| v == 0.0));
        }

        // kernels are still random
        let w: Vec<f32> = d.output.weight.val().into_data().to_vec().unwrap();
        assert!(w.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_frozen_encoder_gets_no_gradients() {
        type AdBackend = Autodiff<TestBackend>;
        let device = Default::default();
        let model: Fcn8s<AdBackend> = tiny_config().init(&device).freeze_encoder();

        let images = Tensor::<AdBackend, 4>::ones([1, 3, 32, 32], &device);
        let labels = Tensor::<AdBackend, 4>::ones([1, 2, 32, 32], &device) / 2.0;
        let (loss, _) = model.forward_loss(images, labels);
        let grads = loss.backward();

        assert!(model.encoder.fc7.weight.grad(&grads).is_none());
        assert!(model.decoder.output.weight.grad(&grads).is_some());
    }
}
