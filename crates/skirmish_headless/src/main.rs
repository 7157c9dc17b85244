//! Headless skirmish runner.
//!
//! This binary runs the skirmish without graphics, controlled via JSON on
//! stdin/stdout. Designed for scripted controllers and CI testing.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p skirmish_headless
//!
//! # Watch a skirmish in the terminal
//! cargo run -p skirmish_headless -- simulate --ticks 600 --every 5 --pace-ms 50
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --ticks 2000 --runs 3
//!
//! # Measure throughput
//! cargo run -p skirmish_headless -- --config big_waves.ron benchmark --ticks 5000
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use skirmish_core::config::SimConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_headless::{
    ascii_visualizer::{AsciiConfig, AsciiSink},
    batch::{run_benchmark, run_playback, verify_determinism},
    config_file::resolve_config,
    runner::{HeadlessConfig, HeadlessRunner},
};

#[derive(Parser)]
#[command(name = "skirmish_headless")]
#[command(about = "Headless skirmish runner for scripted control and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON configuration file (defaults when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive JSON-lines session (default)
    Run {
        /// Output full state after every tick command
        #[arg(long)]
        auto_state: bool,
    },

    /// Run a skirmish and print ASCII frames
    Simulate {
        /// Ticks to simulate
        #[arg(short, long, default_value = "300")]
        ticks: u64,

        /// Print a frame every N ticks
        #[arg(short, long, default_value = "10")]
        every: u64,

        /// Viewport width in characters
        #[arg(long, default_value = "80")]
        width: usize,

        /// Viewport height in characters
        #[arg(long, default_value = "24")]
        height: usize,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,

        /// Sleep between printed frames, in milliseconds
        #[arg(long, default_value = "0")]
        pace_ms: u64,
    },

    /// Verify determinism by repeating the same skirmish
    Verify {
        /// Ticks per run
        #[arg(short, long, default_value = "1000")]
        ticks: u64,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "1000")]
        ticks: u64,
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

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Run { auto_state }) => {
            cmd_run(config, auto_state);
        }
        Some(Commands::Simulate {
            ticks,
            every,
            width,
            height,
            no_color,
            pace_ms,
        }) => {
            let ascii = AsciiConfig {
                width,
                height,
                use_color: !no_color,
                ..Default::default()
            };
            cmd_simulate(config, ticks, every, ascii, pace_ms);
        }
        Some(Commands::Verify { ticks, runs }) => {
            cmd_verify(&config, ticks, runs);
        }
        Some(Commands::Benchmark { ticks }) => {
            cmd_benchmark(config, ticks);
        }
        None => {
            // Default: interactive mode
            cmd_run(config, false);
        }
    }
}

/// Run an interactive session on stdin/stdout
fn cmd_run(config: SimConfig, auto_state: bool) {
    tracing::info!("Starting interactive session");

    let options = HeadlessConfig {
        auto_state_output: auto_state,
    };
    let mut runner = match HeadlessRunner::with_config(config, options) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("Failed to start simulation: {e}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    if let Err(e) = runner.run(stdin.lock(), io::stdout().lock()) {
        eprintln!("Session IO error: {e}");
        std::process::exit(1);
    }
    if runner.is_halted() {
        std::process::exit(1);
    }
}

/// Play a skirmish to the terminal
fn cmd_simulate(config: SimConfig, ticks: u64, every: u64, ascii: AsciiConfig, pace_ms: u64) {
    tracing::info!(ticks, every, "Simulating");

    let mut sink = AsciiSink::new(io::stdout().lock(), config.field, config.max_health, ascii)
        .with_pace(Duration::from_millis(pace_ms));

    match run_playback(config, ticks, every, &mut sink) {
        Ok(summary) => {
            eprintln!("\n{}", "=".repeat(50));
            eprintln!("SKIRMISH SUMMARY");
            eprintln!("{}", "=".repeat(50));
            eprintln!("Ticks: {}", summary.ticks);
            eprintln!("Spawned: {}", summary.spawned);
            eprintln!("Attacks: {}", summary.attacks);
            eprintln!("Deaths: {}", summary.deaths);
            eprintln!("Final units: {}", summary.final_units);
            eprintln!("State hash: {:016x}", summary.state_hash);
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
}

/// Verify determinism
fn cmd_verify(config: &SimConfig, ticks: u64, runs: u32) {
    tracing::info!("Verifying determinism: {} ticks ({} runs)", ticks, runs);

    match verify_determinism(config, ticks, runs) {
        Ok(report) if report.is_deterministic() => {
            eprintln!("PASS: All {runs} runs produced identical results");
            if let Some(hash) = report.hashes.first() {
                eprintln!("  State hash: {hash:016x}");
            }
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            for (run, hash) in report.hashes.iter().enumerate() {
                eprintln!("  Run {run}: {hash:016x}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("FAIL: Error during verification: {e}");
            std::process::exit(1);
        }
    }
}

/// Run benchmark
fn cmd_benchmark(config: SimConfig, ticks: u64) {
    tracing::info!("Running {} tick benchmark", ticks);

    let report = match run_benchmark(config, ticks) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Benchmark failed: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BENCHMARK RESULTS");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Ticks: {}", report.ticks);
    eprintln!("Duration: {:.3}s", report.elapsed.as_secs_f64());
    eprintln!("Ticks/second: {:.1}", report.ticks_per_second());
    eprintln!("ms/tick: {:.4}", report.ms_per_tick());
    eprintln!("Final units: {}", report.final_units);
    eprintln!("State hash: {:016x}", report.state_hash);
}
