//! Hospital / Insurer Bargaining Market - Main Simulation
//!
//! Usage:
//!   hospital_bargaining [config.toml] [output_dir]
//!
//! Without a config file the baseline market is simulated. Set `RUST_LOG`
//! (e.g. `RUST_LOG=debug`) for per-negotiation logging.

use hospital_bargaining::analysis::SummaryReport;
use hospital_bargaining::output::SimulationOutput;
use hospital_bargaining::{scenario, Decision, Error, ModelConfig};
use std::env;
use std::process;

const SEED: u64 = 42;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let args: Vec<String> = env::args().collect();

    let config = match args.get(1) {
        Some(path) => {
            println!("Loading config: {}", path);
            ModelConfig::load(path)?
        }
        None => ModelConfig::baseline(),
    };

    println!("=== Hospital / Insurer Bargaining Market ===\n");
    println!("Configuration:");
    println!("  Hospitals: {}", config.hospital_count);
    println!("  Insurance companies: {}", config.insurance_company_count);
    println!("  Patients: {}", config.patient_count);
    println!("  Max rounds: {}", config.bargaining.max_rounds);
    println!("  Seed: {}\n", SEED);

    let run = scenario::run(&config, SEED)?;

    println!("Simulation complete!\n");
    println!("=== Results ===\n");
    println!(
        "Arrivals: {} ({} not eligible)",
        run.stats.patients_arrived, run.stats.patients_skipped
    );
    println!(
        "Acceptance rate: {:.1}%",
        run.stats.acceptance_rate() * 100.0
    );
    if let Some(rounds) = run.stats.mean_round_count(Decision::Accept) {
        println!("Mean rounds to agreement: {:.2}", rounds);
    }
    println!();

    SummaryReport::from_snapshot(&run.snapshot).print();

    let remaining_beds: u64 = run
        .snapshot
        .hospitals
        .iter()
        .map(|h| h.capacity as u64)
        .sum();
    let full_hospitals = run
        .snapshot
        .hospitals
        .iter()
        .filter(|h| !h.is_available())
        .count();
    println!("\n=== Hospitals ===\n");
    println!("  Beds remaining: {}", remaining_beds);
    println!(
        "  Hospitals at capacity: {}/{}",
        full_hospitals,
        run.snapshot.hospitals.len()
    );

    if let Some(dir) = args.get(2) {
        SimulationOutput::from_run(&run, &config).write_all(dir)?;
        println!("\nResults saved to: {}", dir);
    }

    println!("\n=== Simulation Complete ===");
    Ok(())
}
