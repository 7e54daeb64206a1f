//! Compares sigmoid, tanh and ReLU hidden activations on Reuters newswire topic
//! classification and reports the results as console text and charts.

pub mod plot;
pub mod report;

use anyhow::{Context, Result};
use plot::{ChartMetric, ComparisonChart};
use std::path::{Path, PathBuf};
use training::{Experiment, ExperimentConfig, RunResult};

/// Log filter used when `RUST_LOG` is unset; covers the library crates that log runs
pub const DEFAULT_LOG_FILTER: &str = "compare_activations=info,training=info,reuters=info";

/// Trains every network, prints the results and saves their histories to `output_dir`.
///
/// Nothing is printed or saved unless every run succeeds.
pub fn execute(
    config: ExperimentConfig,
    corpus_path: &Path,
    output_dir: &Path,
) -> Result<[RunResult; 3]> {
    let experiment = Experiment::new(config).context("Invalid experiment configuration")?;
    let data = experiment
        .prepare(corpus_path)
        .context("Failed to prepare the Reuters corpus")?;
    let results = experiment.run(&data).context("Experiment aborted")?;

    println!();
    report::print_results(&results).context("Failed to print results")?;

    for result in &results {
        training::save_history(output_dir, result)
            .with_context(|| format!("Failed to save history for {}", result.name))?;
    }
    Ok(results)
}

/// Renders the accuracy and loss charts for `results` into `output_dir`.
pub fn render_charts(
    results: &[RunResult],
    label: &str,
    output_dir: &Path,
) -> Result<[PathBuf; 2]> {
    let accuracy = ComparisonChart::new(ChartMetric::Accuracy, results, label)
        .render(output_dir)
        .context("Failed to render accuracy chart")?;
    let loss = ComparisonChart::new(ChartMetric::Loss, results, label)
        .render(output_dir)
        .context("Failed to render loss chart")?;
    Ok([accuracy, loss])
}

/// Re-renders both charts from histories previously saved in `output_dir`.
pub fn graph(config: &ExperimentConfig, output_dir: &Path) -> Result<[PathBuf; 2]> {
    println!("Loading training histories...");
    let results = training::load_results(output_dir, config)
        .context("Failed to load saved training histories")?;
    render_charts(&results, &config.label(), output_dir)
}
