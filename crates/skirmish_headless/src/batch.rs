//! Batch runs for CI: rendered playback, determinism checks and benchmarks.
//!
//! Each run builds a fresh [`Simulation`] from the same configuration, so
//! results depend on nothing but the config and the tick count.

use std::fmt::Display;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use skirmish_core::config::SimConfig;
use skirmish_core::error::SimError;
use skirmish_core::render::FrameSink;
use skirmish_core::simulation::Simulation;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Ticks run before timing starts.
pub const BENCHMARK_WARMUP_TICKS: u64 = 100;

/// Error from a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The simulation hit an invariant violation.
    #[error(transparent)]
    Sim(#[from] SimError),
    /// The frame sink failed.
    #[error("Frame sink failed: {0}")]
    Sink(String),
}

/// Totals from a rendered playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Frames handed to the sink.
    pub frames: u64,
    /// Units spawned by waves.
    pub spawned: usize,
    /// Units removed by the sweep.
    pub deaths: usize,
    /// Attacks resolved.
    pub attacks: usize,
    /// Live units at the end.
    pub final_units: usize,
    /// State hash at the end.
    pub state_hash: u64,
}

/// Run `ticks` ticks, presenting a frame at tick 0, every `every` ticks, and
/// at the end.
pub fn run_playback<S>(
    config: SimConfig,
    ticks: u64,
    every: u64,
    sink: &mut S,
) -> Result<PlaybackSummary, BatchError>
where
    S: FrameSink,
    S::Error: Display,
{
    let every = every.max(1);
    let mut sim = Simulation::new(config)?;
    let mut summary = PlaybackSummary::default();

    let mut present = |sim: &Simulation, summary: &mut PlaybackSummary| -> Result<(), BatchError> {
        sink.present(sim.get_tick(), &sim.frame()?)
            .map_err(|e| BatchError::Sink(e.to_string()))?;
        summary.frames += 1;
        Ok(())
    };

    present(&sim, &mut summary)?;
    for _ in 0..ticks {
        let events = sim.tick()?;
        summary.spawned += events.spawned.len();
        summary.deaths += events.deaths.len();
        summary.attacks += events.attacks.len();

        let tick = sim.get_tick();
        if tick % every == 0 || tick == ticks {
            present(&sim, &mut summary)?;
        }
    }

    summary.ticks = sim.get_tick();
    summary.final_units = sim.units().len();
    summary.state_hash = sim.state_hash();
    debug!(?summary, "Playback finished");
    Ok(summary)
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterminismReport {
    /// Ticks simulated per run.
    pub ticks: u64,
    /// Final state hash of each run.
    pub hashes: Vec<u64>,
}

impl DeterminismReport {
    /// Whether every run ended in the same state.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run the configured skirmish `runs` times and compare final hashes.
pub fn verify_determinism(
    config: &SimConfig,
    ticks: u64,
    runs: u32,
) -> Result<DeterminismReport, SimError> {
    let mut hashes = Vec::with_capacity(runs as usize);

    for run in 0..runs {
        let mut sim = Simulation::new(config.clone())?;
        for _ in 0..ticks {
            sim.tick()?;
        }
        let hash = sim.state_hash();
        debug!(run, hash = %format!("{hash:016x}"), "Run complete");
        hashes.push(hash);
    }

    let report = DeterminismReport { ticks, hashes };
    if report.is_deterministic() {
        info!(runs, ticks, "All runs identical");
    } else {
        warn!(runs, ticks, hashes = ?report.hashes, "Runs diverged");
    }
    Ok(report)
}

/// Benchmark timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkReport {
    /// Ticks timed, excluding warmup.
    pub ticks: u64,
    /// Wall time for the timed ticks.
    pub elapsed: Duration,
    /// Live units at the end.
    pub final_units: usize,
    /// State hash at the end.
    pub state_hash: u64,
}

impl BenchmarkReport {
    /// Ticks per wall-clock second.
    #[must_use]
    pub fn ticks_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            f64::INFINITY
        }
    }

    /// Mean wall time per tick in milliseconds.
    #[must_use]
    pub fn ms_per_tick(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() * 1000.0 / self.ticks as f64
    }
}

/// Time `ticks` ticks after a short warmup.
pub fn run_benchmark(config: SimConfig, ticks: u64) -> Result<BenchmarkReport, SimError> {
    let mut sim = Simulation::new(config)?;

    for _ in 0..BENCHMARK_WARMUP_TICKS {
        sim.tick()?;
    }
    info!(units = sim.units().len(), ticks, "Warmup done, timing");

    let start = Instant::now();
    for _ in 0..ticks {
        sim.tick()?;
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkReport {
        ticks,
        elapsed,
        final_units: sim.units().len(),
        state_hash: sim.state_hash(),
    })
}
