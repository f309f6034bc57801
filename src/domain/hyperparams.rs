// ============================================================
// Layer 3 — Hyperparameter Set
// ============================================================
// The four knobs the user can turn before pulling the trigger:
//
//   input_activation   relu | leaky_relu | sigmoid   (conv layers)
//   output_activation  softmax | relu                (last dense layer)
//   hidden_width       16..=128, step 16             (conv filters)
//   epoch_count        3..=30
//
// A fresh set is created from configuration for every run and is
// only ever passed by shared reference afterwards, so it cannot
// change once training has started.

use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

pub const HIDDEN_WIDTH_RANGE: RangeInclusive<usize> = 16..=128;
pub const HIDDEN_WIDTH_STEP:  usize = 16;
pub const EPOCH_RANGE:        RangeInclusive<usize> = 3..=30;

/// Activation applied after each convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputActivation {
    Relu,
    LeakyRelu,
    Sigmoid,
}

impl InputActivation {
    pub const ALL: [InputActivation; 3] =
        [InputActivation::Relu, InputActivation::LeakyRelu, InputActivation::Sigmoid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputActivation::Relu      => "relu",
            InputActivation::LeakyRelu => "leaky_relu",
            InputActivation::Sigmoid   => "sigmoid",
        }
    }
}

/// Activation applied to the 10-unit output layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    Softmax,
    Relu,
}

impl OutputActivation {
    pub const ALL: [OutputActivation; 2] = [OutputActivation::Softmax, OutputActivation::Relu];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputActivation::Softmax => "softmax",
            OutputActivation::Relu    => "relu",
        }
    }
}

impl fmt::Display for InputActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OutputActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// FromStr lets clap parse these straight from --flags
impl FromStr for InputActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InputActivation::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown input activation '{s}' (expected relu, leaky_relu or sigmoid)"))
    }
}

impl FromStr for OutputActivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputActivation::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown output activation '{s}' (expected softmax or relu)"))
    }
}

/// Everything the Architecture Builder and the Training
/// Orchestrator need to know about one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperparameterSet {
    pub input_activation:  InputActivation,
    pub output_activation: OutputActivation,
    pub hidden_width:      usize,
    pub epoch_count:       usize,
}

impl Default for HyperparameterSet {
    fn default() -> Self {
        Self {
            input_activation:  InputActivation::Relu,
            output_activation: OutputActivation::Softmax,
            hidden_width:      64,
            epoch_count:       3,
        }
    }
}

impl HyperparameterSet {
    pub fn new(
        input_activation:  InputActivation,
        output_activation: OutputActivation,
        hidden_width:      usize,
        epoch_count:       usize,
    ) -> Self {
        Self { input_activation, output_activation, hidden_width, epoch_count }
    }

    /// Check every numeric field against its documented domain
    pub fn validate(&self) -> PipelineResult<()> {
        validate_hidden_width(self.hidden_width)?;
        validate_epoch_count(self.epoch_count)
    }
}

pub fn validate_hidden_width(width: usize) -> PipelineResult<()> {
    if !HIDDEN_WIDTH_RANGE.contains(&width) || width % HIDDEN_WIDTH_STEP != 0 {
        return Err(PipelineError::InvalidHyperparameters(format!(
            "hidden_width {width} must be a multiple of {HIDDEN_WIDTH_STEP} in {}..={}",
            HIDDEN_WIDTH_RANGE.start(),
            HIDDEN_WIDTH_RANGE.end(),
        )));
    }
    Ok(())
}

pub fn validate_epoch_count(epochs: usize) -> PipelineResult<()> {
    if !EPOCH_RANGE.contains(&epochs) {
        return Err(PipelineError::InvalidHyperparameters(format!(
            "epoch_count {epochs} must be in {}..={}",
            EPOCH_RANGE.start(),
            EPOCH_RANGE.end(),
        )));
    }
    Ok(())
}

/// Every hidden width the configuration surface offers
pub fn hidden_width_choices() -> impl Iterator<Item = usize> {
    HIDDEN_WIDTH_RANGE.step_by(HIDDEN_WIDTH_STEP)
}
