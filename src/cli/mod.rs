// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// Business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`   — one configured training run with live progress
//   2. `classes` — print the CIFAR-10 class list
//   3. `gallery` — save a 5 × 5 grid of training images
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, GalleryArgs, TrainArgs};

use crate::application::{
    gallery_use_case::GalleryUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::corpus::CLASS_NAMES;
use crate::domain::error::PipelineError;
use crate::infra::{progress::ConsoleReporter, session::SessionContext};
use crate::ml::{InferBackend, TrainBackend};

#[derive(Parser, Debug)]
#[command(
    name = "cifar-cnn-lab",
    version = "0.1.0",
    about = "Configure, train and evaluate a CNN on CIFAR-10 with live progress."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Classes       => run_classes(),
            Commands::Gallery(args) => run_gallery(args),
        }
    }
}

/// One line per class, numbered from 1
pub fn class_listing() -> Vec<String> {
    CLASS_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| format!("Class {}: {}", i + 1, name))
        .collect()
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config = match args.config.clone() {
        Some(path) => {
            tracing::info!("Reading training configuration from '{}'", path);
            TrainConfig::from_json_file(&path)?
        }
        None => args.into(),
    };

    let h = config.hyperparameters();
    println!(
        "Training: input activation {}, output activation {}, hidden width {}, {} epochs",
        h.input_activation, h.output_activation, h.hidden_width, h.epoch_count,
    );

    let device       = Default::default();
    let mut session  = SessionContext::<InferBackend>::new();
    let mut reporter = ConsoleReporter::new();

    let use_case = TrainUseCase::new(config);
    let report   = match use_case.execute::<TrainBackend>(&mut session, &mut reporter, &device) {
        Ok(report) => report,
        Err(err) => {
            if let Some(note) = divergence_note(&err) {
                println!("{note}");
            }
            return Err(err);
        }
    };

    println!("Test accuracy: {:.4}", report.test_accuracy);
    println!("Results written to '{}'", use_case.config().output_dir);
    Ok(())
}

/// What a diverged run kept, or None for any other failure
pub fn divergence_note(err: &anyhow::Error) -> Option<String> {
    let diverged = err.downcast_ref::<PipelineError>()?;
    if !matches!(diverged, PipelineError::TrainingDiverged { .. }) {
        return None;
    }

    Some(match diverged.last_good_epoch() {
        Some(m) => format!(
            "Kept the model from epoch {}: loss = {:.4}, accuracy = {:.4}, \
             val_loss = {:.4}, val_accuracy = {:.4}",
            m.epoch, m.train_loss, m.train_accuracy, m.val_loss, m.val_accuracy,
        ),
        None => "No epoch completed; kept the initial weights".to_string(),
    })
}

fn run_classes() -> Result<()> {
    for line in class_listing() {
        println!("{line}");
    }
    Ok(())
}

fn run_gallery(args: GalleryArgs) -> Result<()> {
    let provider    = TrainConfig::from(args.corpus).corpus_provider();
    let mut session = SessionContext::<InferBackend>::new();

    match GalleryUseCase::new(args.offset, &args.output).execute(&mut session, provider.as_ref())? {
        Some(path) => println!("Saved gallery to '{}'", path.display()),
        None       => println!("Nothing drawn; see the log for details."),
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use crate::domain::history::{EpochMetrics, TrainingHistory};
    use crate::domain::hyperparams::{InputActivation, OutputActivation};

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["cifar-cnn-lab", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "cifar-cnn-lab", "train",
            "--input-activation", "leaky_relu",
            "--output-activation", "relu",
            "--hidden-width", "112",
            "--epochs", "12",
            "--synthetic",
            "--seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.input_activation, InputActivation::LeakyRelu);
        assert_eq!(cfg.output_activation, OutputActivation::Relu);
        assert_eq!(cfg.hidden_width, 112);
        assert_eq!(cfg.epochs, 12);
        assert!(cfg.synthetic);
        assert_eq!(cfg.seed, 7);
    }

    #[test]
    fn test_unknown_activation_rejected() {
        let result = Cli::try_parse_from(["cifar-cnn-lab", "train", "--input-activation", "tanh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gallery_default_offset() {
        let cli = Cli::try_parse_from(["cifar-cnn-lab", "gallery"]).unwrap();
        let Commands::Gallery(args) = cli.command else { panic!("expected gallery") };
        assert_eq!(args.offset, 500);
    }

    #[test]
    fn test_class_listing() {
        let lines = class_listing();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "Class 1: airplane");
        assert_eq!(lines[9], "Class 10: truck");
    }

    #[test]
    fn test_divergence_note_shows_last_good_epoch() {
        let mut history = TrainingHistory::new();
        history.record(EpochMetrics::new(0, 2.0, 1.9, 0.25, 0.3));
        history.record(EpochMetrics::new(1, 1.5, 1.6, 0.4, 0.35));
        let err = anyhow::Error::new(PipelineError::TrainingDiverged {
            epoch: 2,
            phase: "training loss",
            history,
        })
        .context("Training failed");

        assert_eq!(
            divergence_note(&err).unwrap(),
            "Kept the model from epoch 1: loss = 1.5000, accuracy = 0.4000, \
             val_loss = 1.6000, val_accuracy = 0.3500"
        );
    }

    #[test]
    fn test_divergence_note_without_completed_epochs() {
        let err = anyhow::Error::new(PipelineError::TrainingDiverged {
            epoch:   0,
            phase:   "input batch",
            history: TrainingHistory::new(),
        });
        assert_eq!(
            divergence_note(&err).as_deref(),
            Some("No epoch completed; kept the initial weights")
        );

        let other = anyhow::Error::new(PipelineError::InvalidHyperparameters("epochs".into()));
        assert!(divergence_note(&other).is_none());
    }

    #[test]
    fn test_every_flag_has_help() {
        let cli = Cli::command();
        for name in ["train", "gallery"] {
            let sub = cli.find_subcommand(name).unwrap();
            for arg in sub.get_arguments().filter(|a| a.get_id().as_str() != "help") {
                assert!(arg.get_help().is_some(), "{name} --{} has no help", arg.get_id());
            }
        }
    }
}
