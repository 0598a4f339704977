//! Batch Experiment Runner
//!
//! Executes repeated simulation runs from a TOML experiment file and
//! aggregates acceptance, welfare and round statistics across seeds.
//!
//! Usage:
//!   cargo run --release --bin run_experiment -- experiments/baseline.toml

use hospital_bargaining::output::SimulationOutput;
use hospital_bargaining::scenario::{self, SimulationRun};
use hospital_bargaining::{Decision, Error, ModelConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

/// Top-level experiment configuration
#[derive(Debug, Clone, Deserialize)]
struct ExperimentConfig {
    experiment: ExperimentMetadata,
    #[serde(default)]
    model: ModelConfig,
    #[serde(default)]
    output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
struct ExperimentMetadata {
    name: String,
    #[serde(default)]
    description: String,
    num_runs: usize,
    base_seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct OutputSettings {
    save_patients: bool,
    save_summary: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            save_patients: false,
            save_summary: true,
        }
    }
}

/// Aggregate statistics across runs
#[derive(Debug, Clone, Serialize)]
struct AggregateMetrics {
    num_runs: usize,
    acceptance_rate: MeanStd,
    no_agreement_rate: MeanStd,
    no_capacity_rate: MeanStd,
    mean_welfare: MeanStd,
    mean_rounds_to_accept: MeanStd,
}

#[derive(Debug, Clone, Serialize)]
struct MeanStd {
    mean: f64,
    std: f64,
    min: f64,
    max: f64,
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <experiment_config.toml>", args[0]);
        eprintln!("Example: {} experiments/baseline.toml", args[0]);
        process::exit(1);
    }

    if let Err(e) = run(Path::new(&args[1])) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config_path: &Path) -> Result<(), Error> {
    println!("=== Bargaining Market Experiment Runner ===\n");
    println!("Loading experiment config: {}\n", config_path.display());

    let config_str = fs::read_to_string(config_path)?;
    let exp_config: ExperimentConfig = toml::from_str(&config_str)?;
    exp_config.model.validate()?;

    println!("Experiment: {}", exp_config.experiment.name);
    if !exp_config.experiment.description.is_empty() {
        println!("Description: {}", exp_config.experiment.description);
    }
    println!(
        "Configuration: {} runs × {} patients\n",
        exp_config.experiment.num_runs, exp_config.model.patient_count
    );

    let output_dir = PathBuf::from("results").join(&exp_config.experiment.name);
    fs::create_dir_all(&output_dir)?;

    let start_time = Instant::now();
    let mut runs = Vec::with_capacity(exp_config.experiment.num_runs);

    for run_idx in 0..exp_config.experiment.num_runs {
        let seed = exp_config.experiment.base_seed + run_idx as u64;
        let run_start = Instant::now();

        let run = scenario::run(&exp_config.model, seed)?;

        if exp_config.output.save_patients || exp_config.output.save_summary {
            save_run_output(&run, &exp_config, &output_dir.join(format!("run_{}", seed)))?;
        }

        println!(
            "Run {}/{} (seed={}) ✓ ({:.1}s) accepted={:.1}% dispatched={}",
            run_idx + 1,
            exp_config.experiment.num_runs,
            seed,
            run_start.elapsed().as_secs_f64(),
            run.stats.acceptance_rate() * 100.0,
            run.stats.dispatched()
        );

        runs.push(run);
    }

    println!("\n=== Aggregating Results ===\n");
    let aggregate = compute_aggregate_metrics(&runs);
    fs::write(
        output_dir.join("aggregate_summary.json"),
        serde_json::to_string_pretty(&aggregate)?,
    )?;
    print_aggregate_summary(&aggregate);

    let total_elapsed = start_time.elapsed();
    println!(
        "\n✓ Experiment complete in {:.1}s",
        total_elapsed.as_secs_f64()
    );
    println!("Results saved to: {}", output_dir.display());
    Ok(())
}

fn save_run_output(
    run: &SimulationRun,
    exp_config: &ExperimentConfig,
    run_dir: &Path,
) -> Result<(), Error> {
    fs::create_dir_all(run_dir)?;
    let output = SimulationOutput::from_run(run, &exp_config.model);

    if exp_config.output.save_patients {
        output.write_patients_csv(fs::File::create(run_dir.join("patients.csv"))?)?;
    }
    if exp_config.output.save_summary {
        output.write_summary_json(fs::File::create(run_dir.join("summary.json"))?)?;
    }
    Ok(())
}

fn rate(run: &SimulationRun, decision: Decision) -> f64 {
    let dispatched = run.stats.dispatched();
    if dispatched == 0 {
        0.0
    } else {
        run.stats.count(decision) as f64 / dispatched as f64
    }
}

fn compute_aggregate_metrics(runs: &[SimulationRun]) -> AggregateMetrics {
    AggregateMetrics {
        num_runs: runs.len(),
        acceptance_rate: metric(runs, |r| Some(rate(r, Decision::Accept))),
        no_agreement_rate: metric(runs, |r| Some(rate(r, Decision::NoAgreement))),
        no_capacity_rate: metric(runs, |r| Some(rate(r, Decision::NoCapacity))),
        mean_welfare: metric(runs, |r| r.stats.mean_welfare()),
        mean_rounds_to_accept: metric(runs, |r| r.stats.mean_round_count(Decision::Accept)),
    }
}

fn metric<F>(runs: &[SimulationRun], f: F) -> MeanStd
where
    F: Fn(&SimulationRun) -> Option<f64>,
{
    let values: Vec<f64> = runs.iter().filter_map(f).collect();
    compute_mean_std(&values)
}

fn compute_mean_std(values: &[f64]) -> MeanStd {
    if values.is_empty() {
        return MeanStd {
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
        };
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    MeanStd {
        mean,
        std: variance.sqrt(),
        min,
        max,
    }
}

fn print_aggregate_summary(agg: &AggregateMetrics) {
    println!("Aggregate Results ({} runs):", agg.num_runs);
    println!(
        "  Acceptance rate: {:.1}% ± {:.1}%",
        agg.acceptance_rate.mean * 100.0,
        agg.acceptance_rate.std * 100.0
    );
    println!(
        "  No agreement: {:.1}%  No capacity: {:.1}%",
        agg.no_agreement_rate.mean * 100.0,
        agg.no_capacity_rate.mean * 100.0
    );
    println!(
        "  Mean welfare: {:.3} ± {:.3}",
        agg.mean_welfare.mean, agg.mean_welfare.std
    );
    println!(
        "  Rounds to agreement: {:.2} ± {:.2}",
        agg.mean_rounds_to_accept.mean, agg.mean_rounds_to_accept.std
    );
}
