// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `classes` and `gallery` and
// all their configurable flags. Hyperparameter flags mirror the
// choices of the interactive tool: three conv activations, two
// output activations, hidden width 16..=128 in steps of 16 and
// 3..=30 epochs.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::domain::hyperparams::{InputActivation, OutputActivation};
use crate::infra::gallery::DEFAULT_OFFSET;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train and evaluate the CNN once with the given settings
    Train(TrainArgs),

    /// List the ten CIFAR-10 classes
    Classes,

    /// Save a 5 × 5 grid of training images
    Gallery(GalleryArgs),
}

/// Where the images come from; shared by `train` and `gallery`
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Directory holding the CIFAR-10 binary batches
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// Use a seeded synthetic corpus instead of CIFAR-10
    #[arg(long)]
    pub synthetic: bool,

    /// Training images in the synthetic corpus
    #[arg(long, default_value_t = 5_000)]
    pub synthetic_train_len: usize,

    /// Test images in the synthetic corpus
    #[arg(long, default_value_t = 1_000)]
    pub synthetic_test_len: usize,

    /// Seed for shuffling and for the synthetic corpus
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Activation of the three convolution layers
    #[arg(long, default_value = "relu")]
    pub input_activation: InputActivation,

    /// Activation of the 10-unit output layer
    #[arg(long, default_value = "softmax")]
    pub output_activation: OutputActivation,

    /// Filters in the second and third convolution (16..=128, step 16)
    #[arg(long, default_value_t = 64)]
    pub hidden_width: usize,

    /// Number of full passes through the training data (3..=30)
    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Images per Adam step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Directory for metrics, charts and the run summary
    #[arg(long, default_value = "runs/latest")]
    pub output_dir: String,

    /// Milliseconds between ticks of the loading / drawing bar
    #[arg(long, default_value_t = 10)]
    pub progress_delay_ms: u64,

    /// JSON file with a TrainConfig; replaces all other flags
    #[arg(long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub corpus: CorpusArgs,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            input_activation:    a.input_activation,
            output_activation:   a.output_activation,
            hidden_width:        a.hidden_width,
            epochs:              a.epochs,
            batch_size:          a.batch_size,
            learning_rate:       a.learning_rate,
            seed:                a.corpus.seed,
            data_dir:            a.corpus.data_dir,
            output_dir:          a.output_dir,
            synthetic:           a.corpus.synthetic,
            synthetic_train_len: a.corpus.synthetic_train_len,
            synthetic_test_len:  a.corpus.synthetic_test_len,
            progress_delay_ms:   a.progress_delay_ms,
        }
    }
}

/// All arguments for the `gallery` command
#[derive(Args, Debug)]
pub struct GalleryArgs {
    /// Index of the first training image shown
    #[arg(long, default_value_t = DEFAULT_OFFSET)]
    pub offset: usize,

    /// Where to write the PNG
    #[arg(long, default_value = "runs/samples.png")]
    pub output: String,

    #[command(flatten)]
    pub corpus: CorpusArgs,
}

impl From<CorpusArgs> for TrainConfig {
    fn from(a: CorpusArgs) -> Self {
        TrainConfig {
            seed:                a.seed,
            data_dir:            a.data_dir,
            synthetic:           a.synthetic,
            synthetic_train_len: a.synthetic_train_len,
            synthetic_test_len:  a.synthetic_test_len,
            ..TrainConfig::default()
        }
    }
}
