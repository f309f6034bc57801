// ============================================================
// Layer 5 — CNN Classifier and Architecture Builder
// ============================================================
// `build` validates the hyperparameters, expands them into the
// declarative layer plan and hands the plan to `from_plan`,
// which instantiates burn modules while tracking the feature
// map shape so every layer gets the right input size.
//
// Shape bookkeeping:
//   Conv(k)     valid padding   h → h - k + 1
//   MaxPool(s)  stride s        h → h / s   (floor)
//   Flatten                     h × w × c → features
//
// The model's forward pass returns *activated* outputs, so
// `categorical_crossentropy` treats them as (unnormalised)
// probabilities rather than logits.

use burn::{
    module::Ignored,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::domain::corpus::NUM_CLASSES;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::hyperparams::HyperparameterSet;
use crate::ml::architecture::{self, Activation, InputShape, LayerSpec};

/// Clipping bound applied to probabilities before the log
pub const EPSILON: f64 = 1e-7;

/// Convolution, its activation, and an optional trailing max-pool
#[derive(Module, Debug)]
pub struct ConvStage<B: Backend> {
    pub conv:       Conv2d<B>,
    pub activation: Ignored<Activation>,
    pub pool:       Option<MaxPool2d>,
}

impl<B: Backend> ConvStage<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.activation.0.apply(self.conv.forward(x));
        match &self.pool {
            Some(pool) => pool.forward(x),
            None       => x,
        }
    }
}

#[derive(Module, Debug)]
pub struct DenseStage<B: Backend> {
    pub linear:     Linear<B>,
    pub activation: Ignored<Activation>,
}

impl<B: Backend> DenseStage<B> {
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        self.activation.0.apply(self.linear.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct CnnClassifier<B: Backend> {
    pub conv_stages:  Vec<ConvStage<B>>,
    pub dense_stages: Vec<DenseStage<B>>,
    pub output_units: usize,
}

impl<B: Backend> CnnClassifier<B> {
    /// images: [batch, 3, 32, 32] → activated outputs: [batch, 10]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for stage in &self.conv_stages {
            x = stage.forward(x);
        }

        let mut x = x.flatten::<2>(1, 3);
        for stage in &self.dense_stages {
            x = stage.forward(x);
        }
        x
    }

    /// Units of the final dense layer
    pub fn output_units(&self) -> usize {
        self.output_units
    }
}

/// Validate `hparams` and assemble the fixed-topology network
pub fn build<B: Backend>(
    hparams: &HyperparameterSet,
    device:  &B::Device,
) -> PipelineResult<CnnClassifier<B>> {
    hparams.validate()?;

    let plan  = architecture::layer_plan(hparams);
    let model = from_plan::<B>(&plan, InputShape::CIFAR10, device)?;

    tracing::info!(
        "Model built: {} ({} parameters)",
        architecture::describe(&plan),
        model.num_params(),
    );
    Ok(model)
}

/// Instantiate a layer plan. Rejects plans whose layers do not
/// line up: pooling before any convolution, a convolution after
/// flattening, dense layers before flattening, kernels larger
/// than the feature map, or a final layer without 10 units.
pub fn from_plan<B: Backend>(
    plan:   &[LayerSpec],
    input:  InputShape,
    device: &B::Device,
) -> PipelineResult<CnnClassifier<B>> {
    let invalid = |msg: String| PipelineError::InvalidHyperparameters(msg);

    let mut conv_stages: Vec<ConvStage<B>>   = Vec::new();
    let mut dense_stages: Vec<DenseStage<B>> = Vec::new();

    let (mut height, mut width, mut channels) = (input.height, input.width, input.channels);
    // Some(n) once flattened: the current feature vector length
    let mut features: Option<usize> = None;

    for (i, layer) in plan.iter().enumerate() {
        match *layer {
            LayerSpec::Conv { filters, kernel, activation } => {
                if features.is_some() {
                    return Err(invalid(format!("layer {i}: convolution after flatten")));
                }
                if filters == 0 || kernel == 0 || kernel > height || kernel > width {
                    return Err(invalid(format!(
                        "layer {i}: {layer} does not fit a {height}x{width} feature map"
                    )));
                }
                let conv = Conv2dConfig::new([channels, filters], [kernel, kernel]).init(device);
                conv_stages.push(ConvStage { conv, activation: Ignored(activation), pool: None });

                height   = height - kernel + 1;
                width    = width - kernel + 1;
                channels = filters;
            }

            LayerSpec::MaxPool { size } => {
                let stage = match conv_stages.last_mut() {
                    Some(stage) if features.is_none() && stage.pool.is_none() => stage,
                    _ => return Err(invalid(format!(
                        "layer {i}: pooling must directly follow a convolution"
                    ))),
                };
                if size == 0 || size > height || size > width {
                    return Err(invalid(format!(
                        "layer {i}: {layer} does not fit a {height}x{width} feature map"
                    )));
                }
                stage.pool = Some(MaxPool2dConfig::new([size, size]).with_strides([size, size]).init());

                height /= size;
                width  /= size;
            }

            LayerSpec::Flatten => {
                if features.is_some() {
                    return Err(invalid(format!("layer {i}: flattened twice")));
                }
                features = Some(height * width * channels);
            }

            LayerSpec::Dense { units, activation } => {
                let inputs = features.ok_or_else(|| {
                    invalid(format!("layer {i}: dense layer before flatten"))
                })?;
                if units == 0 {
                    return Err(invalid(format!("layer {i}: dense layer with zero units")));
                }
                let linear = LinearConfig::new(inputs, units).init(device);
                dense_stages.push(DenseStage { linear, activation: Ignored(activation) });
                features = Some(units);
            }
        }
    }

    if dense_stages.is_empty() || features != Some(NUM_CLASSES) {
        return Err(invalid(format!(
            "the final layer must be dense with {NUM_CLASSES} units"
        )));
    }

    Ok(CnnClassifier { conv_stages, dense_stages, output_units: NUM_CLASSES })
}

/// Categorical cross-entropy on activated outputs.
///
/// Each row of `outputs` is rescaled to sum to one, clipped to
/// [EPSILON, 1 - EPSILON], and scored against the one-hot
/// `targets`:  loss = mean_n( -Σ_c y[n,c] · ln p[n,c] )
pub fn categorical_crossentropy<B: Backend>(
    outputs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let totals = outputs.clone().sum_dim(1).clamp_min(EPSILON);
    let probs  = (outputs / totals).clamp(EPSILON, 1.0 - EPSILON);

    (targets * probs.log()).sum_dim(1).neg().mean()
}

/// Number of rows whose arg-max output matches the class id
pub fn count_correct<B: Backend>(outputs: Tensor<B, 2>, classes: Tensor<B, 1, Int>) -> usize {
    let predicted = outputs.argmax(1).flatten::<1>(0, 1);
    let correct: i64 = predicted
        .equal(classes)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct.max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::domain::hyperparams::{hidden_width_choices, InputActivation, OutputActivation};

    type TestBackend = NdArray;

    #[test]
    fn test_every_configurable_set_builds_with_ten_outputs() {
        let device = Default::default();
        for input in InputActivation::ALL {
            for output in OutputActivation::ALL {
                for width in hidden_width_choices() {
                    let h = HyperparameterSet::new(input, output, width, 3);
                    let model = build::<TestBackend>(&h, &device).unwrap();
                    assert_eq!(model.output_units(), 10);
                    assert_eq!(model.conv_stages.len(), 3);
                    assert_eq!(model.dense_stages.len(), 2);
                }
            }
        }
    }

    #[test]
    fn test_forward_output_shape_and_softmax_rows() {
        let device = Default::default();
        let model  = build::<TestBackend>(&HyperparameterSet::default(), &device).unwrap();
        let images = Tensor::<TestBackend, 4>::ones([2, 3, 32, 32], &device).mul_scalar(0.5);

        let out = model.forward(images);
        assert_eq!(out.dims(), [2, 10]);

        let sums: Vec<f32> = out.sum_dim(1).into_data().iter::<f32>().collect();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_out_of_range_width_rejected_before_building() {
        let device = Default::default();
        for width in [8, 17, 144] {
            let h = HyperparameterSet { hidden_width: width, ..Default::default() };
            assert!(matches!(
                build::<TestBackend>(&h, &device),
                Err(PipelineError::InvalidHyperparameters(_))
            ));
        }
        let h = HyperparameterSet { epoch_count: 31, ..Default::default() };
        assert!(build::<TestBackend>(&h, &device).is_err());
    }

    #[test]
    fn test_inconsistent_plans_rejected() {
        let device = Default::default();
        let relu   = Activation::Relu;
        let bad_plans = vec![
            vec![LayerSpec::MaxPool { size: 2 }, LayerSpec::Flatten, LayerSpec::Dense { units: 10, activation: relu }],
            vec![LayerSpec::Dense { units: 10, activation: relu }],
            vec![LayerSpec::Flatten, LayerSpec::Conv { filters: 4, kernel: 3, activation: relu }],
            vec![LayerSpec::Conv { filters: 4, kernel: 40, activation: relu }],
            vec![LayerSpec::Flatten, LayerSpec::Dense { units: 7, activation: relu }],
        ];
        for plan in bad_plans {
            assert!(
                from_plan::<TestBackend>(&plan, InputShape::CIFAR10, &device).is_err(),
                "plan should be rejected: {plan:?}"
            );
        }
    }

    #[test]
    fn test_cross_entropy_of_confident_correct_prediction_is_near_zero() {
        let device  = Default::default();
        let outputs = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]], &device,
        );
        let targets = outputs.clone();

        let loss = categorical_crossentropy(outputs, targets).into_scalar().elem::<f64>();
        assert!(loss >= 0.0 && loss < 1e-5);
    }

    #[test]
    fn test_cross_entropy_of_uniform_prediction_is_ln_ten() {
        let device  = Default::default();
        let outputs = Tensor::<TestBackend, 2>::ones([3, 10], &device).mul_scalar(0.1);
        let targets = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]; 3], &device,
        );

        let loss = categorical_crossentropy(outputs, targets).into_scalar().elem::<f64>();
        assert!((loss - 10f64.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_relu_outputs_are_rescaled_before_scoring() {
        let device  = Default::default();
        // Unnormalised scores 2 : 2 → p = 0.5 for the true class
        let outputs = Tensor::<TestBackend, 2>::from_floats(
            [[2.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]], &device,
        );
        let targets = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]], &device,
        );

        let loss = categorical_crossentropy(outputs, targets).into_scalar().elem::<f64>();
        assert!((loss - 2f64.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_count_correct() {
        let device  = Default::default();
        let outputs = Tensor::<TestBackend, 2>::from_floats(
            [[0.9, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
             [0.1, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
             [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2, 0.8]],
            &device,
        );
        let classes = Tensor::<TestBackend, 1, Int>::from_ints([0, 0, 9], &device);
        assert_eq!(count_correct(outputs, classes), 2);
    }
}
