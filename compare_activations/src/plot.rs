use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use training::RunResult;

/// Pixel size of a rendered chart, 12 by 8 inches at 100 dpi
pub const CHART_SIZE: (u32, u32) = (1200, 800);

/// Line colour for each run, in run order
const PALETTE: [RGBColor; 3] = [BLUE, GREEN, RED];

/// Which recorded metric a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartMetric {
    Accuracy,
    Loss,
}

impl ChartMetric {
    /// Prefix of the image file name
    fn file_prefix(self) -> &'static str {
        match self {
            ChartMetric::Accuracy => "ACC",
            ChartMetric::Loss => "LOSS",
        }
    }

    fn axis_label(self) -> &'static str {
        match self {
            ChartMetric::Accuracy => "Accuracy",
            ChartMetric::Loss => "Loss",
        }
    }
}

impl fmt::Display for ChartMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartMetric::Accuracy => write!(f, "accuracy"),
            ChartMetric::Loss => write!(f, "loss"),
        }
    }
}

/// One curve on a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// (epoch, value) pairs
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    /// Training curves are dashed, validation curves solid
    pub dashed: bool,
}

/// A line chart comparing one metric across every run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonChart {
    pub metric: ChartMetric,
    pub file_name: String,
    pub y_label: String,
    pub series: Vec<Series>,
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(epoch, &value)| (epoch as f64, value))
        .collect()
}

impl ComparisonChart {
    /// Builds a validation and a training series for every run.
    ///
    /// `label` names the experiment in the file name, e.g. `ACC_sigm_tanh_relu.png`.
    pub fn new(metric: ChartMetric, results: &[RunResult], label: &str) -> Self {
        let series = results
            .iter()
            .zip(PALETTE.iter().cycle())
            .flat_map(|(result, &color)| {
                let (validation, training) = match metric {
                    ChartMetric::Accuracy => {
                        (&result.history.val_accuracy, &result.history.accuracy)
                    }
                    ChartMetric::Loss => (&result.history.val_loss, &result.history.loss),
                };
                [
                    Series {
                        label: format!("{} validation {metric}", result.name),
                        points: points(validation),
                        color,
                        dashed: false,
                    },
                    Series {
                        label: format!("{} training {metric}", result.name),
                        points: points(training),
                        color,
                        dashed: true,
                    },
                ]
            })
            .collect();

        Self {
            metric,
            file_name: format!("{}_{label}.png", metric.file_prefix()),
            y_label: metric.axis_label().to_string(),
            series,
        }
    }

    /// Last epoch index over all series, at least 1 so the axis is never empty
    fn x_max(&self) -> f64 {
        let epochs = self
            .series
            .iter()
            .map(|series| series.points.len())
            .max()
            .unwrap_or(0);
        epochs.saturating_sub(1).max(1) as f64
    }

    /// Value range over all finite points, padded by 5%
    fn y_range(&self) -> (f64, f64) {
        let (min, max) = self
            .series
            .iter()
            .flat_map(|series| series.points.iter().map(|&(_, y)| y))
            .filter(|y| y.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        if min > max {
            return (0.0, 1.0);
        }
        let pad = ((max - min) * 0.05).max(1e-3);
        (min - pad, max + pad)
    }

    /// Renders the chart as a PNG in `dir`.
    ///
    /// # Returns
    /// * The path of the written image
    pub fn render(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).context("Failed to create output directory")?;
        let output_path = dir.join(&self.file_name);
        self.draw(&output_path)?;
        tracing::info!(path = %output_path.display(), "chart saved");
        Ok(output_path)
    }

    fn draw(&self, output_path: &Path) -> Result<()> {
        let root = BitMapBackend::new(output_path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).context("Failed to fill drawing area")?;

        let (y_min, y_max) = self.y_range();
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("Training and validation {}", self.metric),
                ("sans-serif", 30).into_font(),
            )
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..self.x_max(), y_min..y_max)
            .context("Failed to build chart")?;

        chart
            .configure_mesh()
            .x_desc("Epochs")
            .y_desc(self.y_label.as_str())
            .x_label_formatter(&|x: &f64| format!("{}", x.round()))
            .draw()
            .context("Failed to draw mesh")?;

        for series in &self.series {
            let style = series.color.stroke_width(2);
            let points = series.points.iter().copied();
            let drawn = if series.dashed {
                chart.draw_series(DashedLineSeries::new(points, 10, 6, style))
            } else {
                chart.draw_series(LineSeries::new(points, style))
            }
            .with_context(|| format!("Failed to draw series {}", series.label))?;
            drawn
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .position(SeriesLabelPosition::UpperRight)
            .margin(10)
            .draw()
            .context("Failed to draw legend")?;

        root.present().context("Failed to write chart image")?;
        Ok(())
    }
}
