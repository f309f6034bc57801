// ============================================================
// Layer 6 — Progress Reporters
// ============================================================
// ProgressSink implementations:
//
//   ConsoleReporter — indicatif bar for coarse phases, one
//                     stdout line per epoch
//   NullSink        — discards everything
//   RecordingSink   — keeps every call, for tests
//
// `sweep` drives the fixed-increment bar shown while the corpus
// loads and while the post-training charts are drawn. Those
// phases have no natural progress measure, so the bar just
// advances in equal steps.
//
// Terminal write failures are logged and dropped here; they
// never reach the training loop.

use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::history::ProgressEvent;
use crate::domain::traits::ProgressSink;

const BAR_LENGTH:   u64  = 100;
const BAR_TEMPLATE: &str = "{msg:>18} [{bar:40.cyan/blue}] {pos:>3}%";

/// One line per epoch, as printed by ConsoleReporter
pub fn format_epoch_line(event: &ProgressEvent) -> String {
    format!(
        "Epoch {}: loss = {:.4}, accuracy = {:.4}",
        event.epoch_index, event.loss, event.accuracy
    )
}

// ─── ConsoleReporter ──────────────────────────────────────────────────────────
pub struct ConsoleReporter {
    bar:    Option<ProgressBar>,
    hidden: bool,
    out:    Box<dyn Write>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { bar: None, hidden: false, out: Box::new(io::stdout()) }
    }

    /// A reporter that draws no bars and prints nothing
    pub fn hidden() -> Self {
        Self::with_output(io::sink())
    }

    /// Hidden bars; epoch lines go to `out` instead of stdout
    pub fn with_output(out: impl Write + 'static) -> Self {
        Self { bar: None, hidden: true, out: Box::new(out) }
    }

    fn new_bar(&self, label: &str) -> ProgressBar {
        let bar = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(BAR_LENGTH)
        };
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|e| {
                tracing::warn!("Invalid progress template: {e}");
                ProgressStyle::default_bar()
            })
            .progress_chars("=>-");
        bar.set_length(BAR_LENGTH);
        bar.set_style(style);
        bar.set_message(label.to_string());
        bar
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleReporter {
    fn on_epoch_end(&mut self, event: &ProgressEvent) {
        let line = format_epoch_line(event);
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!("Could not print epoch progress: {e}");
        }
    }

    fn tick(&mut self, fraction: f32) {
        if self.bar.is_none() {
            self.bar = Some(self.new_bar(""));
        }
        if let Some(bar) = &self.bar {
            let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
            bar.set_position((fraction * BAR_LENGTH as f32).round() as u64);
        }
    }

    fn begin_phase(&mut self, label: &str) {
        if let Some(old) = self.bar.take() {
            old.finish_and_clear();
        }
        self.bar = Some(self.new_bar(label));
    }

    fn finish_phase(&mut self, message: &str) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message(message.to_string());
        }
        tracing::debug!("{}", message);
    }
}

// ─── NullSink ─────────────────────────────────────────────────────────────────
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_epoch_end(&mut self, _event: &ProgressEvent) {}
    fn tick(&mut self, _fraction: f32) {}
}

// ─── sweep ────────────────────────────────────────────────────────────────────
/// Advance `sink` from 0 to 1 in `steps` equal ticks, sleeping
/// `delay` between them. Zero steps emits a single tick of 1.0.
pub fn sweep(sink: &mut dyn ProgressSink, steps: usize, delay: Duration) {
    if steps == 0 {
        sink.tick(1.0);
        return;
    }
    for step in 1..=steps {
        sink.tick(step as f32 / steps as f32);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

// ─── RecordingSink ────────────────────────────────────────────────────────────
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ProgressEvent>,
    pub ticks:  Vec<f32>,
    pub phases: Vec<String>,
}

#[cfg(test)]
impl ProgressSink for RecordingSink {
    fn on_epoch_end(&mut self, event: &ProgressEvent) {
        self.events.push(*event);
    }

    fn tick(&mut self, fraction: f32) {
        self.ticks.push(fraction);
    }

    fn begin_phase(&mut self, label: &str) {
        self.phases.push(label.to_string());
    }
}
