//! Headless skirmish runner for scripted control and CI verification.
//!
//! This crate drives the skirmish simulation without graphics. A controller
//! sends JSON commands on stdin and reads responses on stdout. This enables:
//!
//! - **Scripted play**: Steer the protected unit and inspect every unit
//! - **CI verification**: Check determinism and tick throughput
//! - **Terminal playback**: Watch a skirmish as ASCII frames
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, goal, damage, etc.)
//! - **stdout**: Tick summaries and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p skirmish_headless
//!
//! # Watch 300 ticks with a custom config
//! cargo run -p skirmish_headless -- --config skirmish.ron simulate --ticks 300
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify --ticks 1000 --runs 3
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod config_file;
pub mod protocol;
pub mod runner;

pub use ascii_visualizer::{render_ascii, AsciiConfig, AsciiSink};
pub use batch::{
    run_benchmark, run_playback, verify_determinism, BatchError, BenchmarkReport,
    DeterminismReport, PlaybackSummary,
};
pub use config_file::{load_config, resolve_config, ConfigError};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
