use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use training::ExperimentConfig;

fn run(args: &Args, config: ExperimentConfig) -> Result<()> {
    let corpus = match &args.corpus {
        Some(path) => path.clone(),
        None => reuters::default_corpus_path().context("Failed to locate the Reuters corpus")?,
    };
    let label = config.label();
    let results = compare_activations::execute(config, &corpus, &args.output_dir)?;

    let [accuracy, loss] =
        compare_activations::render_charts(&results, &label, &args.output_dir)?;
    println!("Accuracy chart saved to {}", accuracy.display());
    println!("Loss chart saved to {}", loss.display());
    Ok(())
}

fn graph(args: &Args, config: &ExperimentConfig) -> Result<()> {
    let [accuracy, loss] = compare_activations::graph(config, &args.output_dir)?;
    println!("Accuracy chart saved to {}", accuracy.display());
    println!("Loss chart saved to {}", loss.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(compare_activations::DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ExperimentConfig::default();

    match args.command.unwrap_or(Command::Run) {
        Command::Run => run(&args, config).context("Failed to compare activations")?,
        Command::Graph => graph(&args, &config).context("Failed to create comparison charts")?,
    }

    Ok(())
}

#[derive(clap::Parser)]
#[command(
    name = "compare_activations",
    about = "Compare sigmoid, tanh and ReLU activations on Reuters topic classification",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Reuters corpus JSON; defaults to $REUTERS_CORPUS or ~/.keras/datasets/reuters.json
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Directory for training histories and charts
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(clap::Subcommand, Clone, Copy)]
enum Command {
    /// Train all three networks, print the results and render the charts (default)
    Run,
    /// Re-render the charts from saved training histories
    Graph,
}
