//! # Skirmish Core
//!
//! Deterministic simulation core for a two-team unit skirmish on a bounded
//! field.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! Collision avoidance is delegated to an [`oracle::AvoidanceOracle`]. The
//! oracle keeps its agents in a dense, compacting array; the
//! [`slots::SlotIndex`] maps stable unit IDs onto that array and is the only
//! code allowed to mutate it.
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point math utilities
//! - [`config`] - Simulation configuration
//! - [`units`] - Unit data model
//! - [`oracle`] - Avoidance oracle contract and reference implementation
//! - [`slots`] - Identity-slot index
//! - [`registry`] - Unit registry and lifecycle
//! - [`spawn`] - Wave spawn policy
//! - [`behavior`] - Behavior scheduler
//! - [`simulation`] - Core simulation loop
//! - [`render`] - Render sink contract

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod behavior;
pub mod config;
pub mod error;
pub mod math;
pub mod oracle;
pub mod registry;
pub mod render;
pub mod simulation;
pub mod slots;
pub mod spawn;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::behavior::{BehaviorContext, BehaviorScheduler, Order, OrderSink, Rule};
    pub use crate::config::{AvoidanceConfig, FieldConfig, SimConfig};
    pub use crate::error::{Result, SimError};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::oracle::{AvoidanceOracle, LocalAvoidance, SlotHandle};
    pub use crate::render::{FrameSink, UnitFrame};
    pub use crate::simulation::{AttackEvent, Simulation, TickEvents};
    pub use crate::units::{ActivityState, Team, Unit, UnitId, UnitSpawnParams};
}
