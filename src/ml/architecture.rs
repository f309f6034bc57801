// ============================================================
// Layer 5 — Declarative Layer Specification
// ============================================================
// The network topology written down as data. The builder in
// model.rs walks this list and instantiates burn modules; nothing
// else needs to know how the layers are wired.
//
// The fixed template (hidden width w, conv activation a,
// output activation o):
//
//   Conv(32, 3×3, a)   32×32×3  → 30×30×32
//   MaxPool(2×2)                → 15×15×32
//   Conv(w, 3×3, a)             → 13×13×w
//   MaxPool(2×2)                → 6×6×w
//   Conv(w, 3×3, a)             → 4×4×w
//   Flatten                     → 16·w
//   Dense(128, relu)            → 128
//   Dense(10, o)                → 10

use std::fmt;

use burn::prelude::*;
use burn::tensor::activation;

use crate::domain::corpus::{IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH, NUM_CLASSES};
use crate::domain::hyperparams::{HyperparameterSet, InputActivation, OutputActivation};

pub const FIRST_CONV_FILTERS: usize = 32;
pub const KERNEL_SIZE:        usize = 3;
pub const POOL_SIZE:          usize = 2;
pub const DENSE_UNITS:        usize = 128;

/// Negative slope used by leaky_relu
pub const LEAKY_RELU_SLOPE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    LeakyRelu,
    Sigmoid,
    Softmax,
}

impl Activation {
    /// Apply element-wise; softmax normalises over the last dimension
    pub fn apply<B: Backend, const D: usize>(self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Relu      => activation::relu(x),
            Activation::LeakyRelu => activation::leaky_relu(x, LEAKY_RELU_SLOPE),
            Activation::Sigmoid   => activation::sigmoid(x),
            Activation::Softmax   => activation::softmax(x, D - 1),
        }
    }
}

impl From<InputActivation> for Activation {
    fn from(a: InputActivation) -> Self {
        match a {
            InputActivation::Relu      => Activation::Relu,
            InputActivation::LeakyRelu => Activation::LeakyRelu,
            InputActivation::Sigmoid   => Activation::Sigmoid,
        }
    }
}

impl From<OutputActivation> for Activation {
    fn from(a: OutputActivation) -> Self {
        match a {
            OutputActivation::Softmax => Activation::Softmax,
            OutputActivation::Relu    => Activation::Relu,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Activation::Relu      => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Sigmoid   => "sigmoid",
            Activation::Softmax   => "softmax",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerSpec {
    Conv { filters: usize, kernel: usize, activation: Activation },
    MaxPool { size: usize },
    Flatten,
    Dense { units: usize, activation: Activation },
}

impl fmt::Display for LayerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSpec::Conv { filters, kernel, activation } =>
                write!(f, "Conv({filters}, {kernel}x{kernel}, {activation})"),
            LayerSpec::MaxPool { size } => write!(f, "MaxPool({size}x{size})"),
            LayerSpec::Flatten => f.write_str("Flatten"),
            LayerSpec::Dense { units, activation } => write!(f, "Dense({units}, {activation})"),
        }
    }
}

/// Height, width and channel count of the network input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    pub height:   usize,
    pub width:    usize,
    pub channels: usize,
}

impl InputShape {
    pub const CIFAR10: InputShape = InputShape {
        height:   IMAGE_HEIGHT,
        width:    IMAGE_WIDTH,
        channels: IMAGE_CHANNELS,
    };
}

/// The fixed eight-layer template filled in from `hparams`
pub fn layer_plan(hparams: &HyperparameterSet) -> Vec<LayerSpec> {
    let conv_activation = Activation::from(hparams.input_activation);
    let conv = |filters| LayerSpec::Conv { filters, kernel: KERNEL_SIZE, activation: conv_activation };

    vec![
        conv(FIRST_CONV_FILTERS),
        LayerSpec::MaxPool { size: POOL_SIZE },
        conv(hparams.hidden_width),
        LayerSpec::MaxPool { size: POOL_SIZE },
        conv(hparams.hidden_width),
        LayerSpec::Flatten,
        LayerSpec::Dense { units: DENSE_UNITS, activation: Activation::Relu },
        LayerSpec::Dense { units: NUM_CLASSES, activation: hparams.output_activation.into() },
    ]
}

/// One line per layer, for logging
pub fn describe(plan: &[LayerSpec]) -> String {
    plan.iter().map(ToString::to_string).collect::<Vec<_>>().join(" → ")
}
