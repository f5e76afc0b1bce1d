//! Headless stalker arena.
//!
//! Runs one agent against a scripted arena and prints JSON lines.
//!
//! # Usage
//!
//! ```bash
//! # Run the built-in duel
//! cargo run -p stalker_headless
//!
//! # Run a scenario file for 20 seconds, printing state every tick
//! cargo run -p stalker_headless -- run --scenario scenarios/duel.ron --seconds 20 --auto-state
//!
//! # Verify determinism
//! cargo run -p stalker_headless -- verify --scenario duel --runs 5
//! ```
//!
//! Output (stdout): JSON lines, one per event
//! Logs (stderr): Debug information

use std::io::Write;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stalker_headless::{run_scenario, verify_determinism, RunOptions, Scenario};

#[derive(Parser)]
#[command(name = "stalker_headless")]
#[command(about = "Headless arena runner for the stalker agent")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Override the scenario duration
        #[arg(long)]
        seconds: Option<u64>,

        /// Output state after every tick
        #[arg(long)]
        auto_state: bool,
    },

    /// Verify determinism by running the same scenario multiple times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "duel")]
        scenario: String,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seconds,
            auto_state,
        }) => cmd_run(&scenario, seconds, auto_state),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(&scenario, runs),
        None => cmd_run("duel", None, false),
    }
}

fn load_or_exit(arg: &str) -> Scenario {
    match Scenario::resolve(arg) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    }
}

/// Run one scenario, streaming JSON lines to stdout
fn cmd_run(scenario: &str, seconds: Option<u64>, auto_state: bool) {
    let scenario = load_or_exit(scenario);
    tracing::info!("Running scenario: {}", scenario.name);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let options = RunOptions {
        seconds,
        auto_state,
    };
    let result = run_scenario(&scenario, options, |line| {
        if let Err(e) = writeln!(out, "{}", line.to_json_line()) {
            tracing::warn!("Failed to write output: {e}");
        }
    });

    if let Err(e) = result {
        eprintln!("Run failed: {e}");
        std::process::exit(1);
    }
}

/// Run the scenario repeatedly and compare final hashes
fn cmd_verify(scenario: &str, runs: u32) {
    let scenario = load_or_exit(scenario);
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario.name,
        scenario.seed,
        runs
    );

    let report = match verify_determinism(&scenario, runs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Verification failed to run: {e}");
            std::process::exit(1);
        }
    };

    if report.is_deterministic() {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = report.hashes.first() {
            eprintln!("  Hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in report.hashes.iter().enumerate() {
            eprintln!("  Run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }
}
