use std::io::{self, Write};
use training::RunResult;

/// Writes the results block of one run.
pub fn write_result<W: Write>(out: &mut W, result: &RunResult) -> io::Result<()> {
    writeln!(out, "Network {} results", result.index)?;
    writeln!(out, "Hyperparameters: {}", result.config)?;
    writeln!(out, "Test score: {}", result.score.loss)?;
    writeln!(out, "Test accuracy: {}", result.score.accuracy)?;
    Ok(())
}

/// Writes the results of every run in run order.
pub fn write_results<W: Write>(out: &mut W, results: &[RunResult]) -> io::Result<()> {
    for result in results {
        write_result(out, result)?;
    }
    Ok(())
}

/// Prints the results of every run to stdout.
pub fn print_results(results: &[RunResult]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, results)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use neural_network::{Evaluation, TrainingHistory};
    use training::ExperimentConfig;

    fn results() -> Vec<RunResult> {
        ExperimentConfig::default()
            .networks
            .iter()
            .enumerate()
            .map(|(index, network)| RunResult {
                index,
                name: network.name.clone(),
                config: network.config.clone(),
                history: TrainingHistory::new(),
                score: Evaluation {
                    loss: 0.125 * (index + 1) as f64,
                    accuracy: 0.5,
                },
            })
            .collect()
    }

    #[test]
    fn test_results_block_format() {
        let mut out = Vec::new();
        write_result(&mut out, &results()[2]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Network 2 results\n\
             Hyperparameters: { layer_count: 2, layer_width: 256, activation: relu, dropout_rate: 0.5, weight_init: TruncatedNormal, optimizer: adam }\n\
             Test score: 0.375\n\
             Test accuracy: 0.5\n"
        );
    }

    #[test]
    fn test_results_in_run_order() {
        let mut out = Vec::new();
        write_results(&mut out, &results()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let headers: Vec<&str> = text.lines().filter(|l| l.ends_with("results")).collect();
        assert_eq!(
            headers,
            vec!["Network 0 results", "Network 1 results", "Network 2 results"]
        );
    }
}
