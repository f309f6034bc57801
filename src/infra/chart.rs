// ============================================================
// Layer 6 — Metrics Chart
// ============================================================
// Renders a finished TrainingHistory as a PNG with two y-axes:
//
//   left  axis  training / validation loss       (solid lines)
//   right axis  training / validation accuracy   (dashed lines)
//   x     axis  epoch index
//
// Drawing is best-effort: an empty history or any plotters
// error is logged and the chart is skipped. The history itself
// is only read.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::domain::history::TrainingHistory;

pub const CHART_CAPTION: &str = "Training and Validation Loss & Accuracy";

const CHART_SIZE: (u32, u32) = (960, 600);

pub struct MetricsChart {
    path: PathBuf,
}

impl MetricsChart {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Draw `history`; returns the written path, or None when
    /// nothing was drawn
    pub fn render(&self, history: &TrainingHistory) -> Option<PathBuf> {
        if history.is_empty() {
            tracing::warn!("No epochs recorded; skipping the loss/accuracy chart");
            return None;
        }

        match self.draw(history) {
            Ok(()) => {
                tracing::info!("Saved training curves to '{}'", self.path.display());
                Some(self.path.clone())
            }
            Err(e) => {
                tracing::warn!("Could not render '{}': {}", self.path.display(), e);
                None
            }
        }
    }

    fn draw(&self, history: &TrainingHistory) -> Result<(), String> {
        let root = BitMapBackend::new(&self.path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(|e| format!("backend error: {e}"))?;

        let x_range = epoch_axis(history.len());

        let mut chart = ChartBuilder::on(&root)
            .caption(CHART_CAPTION, ("sans-serif", 24))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .right_y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), loss_axis(history))
            .map_err(|e| format!("chart build error: {e}"))?
            .set_secondary_coord(x_range, 0.0f64..1.0f64);

        chart
            .configure_mesh()
            .x_desc("Epoch")
            .y_desc("Loss")
            .draw()
            .map_err(|e| format!("mesh error: {e}"))?;

        chart
            .configure_secondary_axes()
            .y_desc("Accuracy")
            .draw()
            .map_err(|e| format!("secondary axis error: {e}"))?;

        let loss_series = [
            ("Training Loss",   history.train_losses(), BLUE),
            ("Validation Loss", history.val_losses(),   MAGENTA),
        ];
        for (label, values, color) in loss_series {
            chart
                .draw_series(LineSeries::new(points(&values), color.stroke_width(2)))
                .map_err(|e| format!("series error: {e}"))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        let accuracy_series = [
            ("Training Accuracy",   history.train_accuracies(), GREEN),
            ("Validation Accuracy", history.val_accuracies(),   RED),
        ];
        for (label, values, color) in accuracy_series {
            chart
                .draw_secondary_series(DashedLineSeries::new(
                    points(&values),
                    6,
                    4,
                    color.stroke_width(2),
                ))
                .map_err(|e| format!("series error: {e}"))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| format!("legend error: {e}"))?;

        root.present().map_err(|e| format!("write error: {e}"))?;
        Ok(())
    }
}

/// (epoch index, value) pairs
fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect()
}

/// 0 .. last epoch index, never a zero-width range
pub fn epoch_axis(epochs: usize) -> Range<f64> {
    0.0..(epochs.saturating_sub(1).max(1)) as f64
}

/// 0 .. 110% of the largest finite loss
pub fn loss_axis(history: &TrainingHistory) -> Range<f64> {
    let max = history
        .train_losses()
        .into_iter()
        .chain(history.val_losses())
        .filter(|v| v.is_finite())
        .fold(0.0f64, f64::max);

    if max > 0.0 { 0.0..max * 1.1 } else { 0.0..1.0 }
}
