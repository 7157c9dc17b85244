//! Avoidance oracle boundary.
//!
//! The oracle is an external local-collision-avoidance engine holding a
//! dense array of motion agents. The core consumes it only through
//! [`AvoidanceOracle`], and only the [`SlotIndex`](crate::slots::SlotIndex)
//! ever calls the mutating half of that trait.
//!
//! [`LocalAvoidance`] is the reference implementation used by default.

mod local;

pub use local::LocalAvoidance;

use crate::math::{Fixed, Vec2Fixed};

/// Dense position of an agent inside the oracle's agent array.
///
/// Only meaningful until the next removal; the slot index re-resolves
/// handles from unit IDs on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotHandle(usize);

impl SlotHandle {
    /// Wrap a raw array index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw array index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Contract the simulation requires from a collision-avoidance engine.
///
/// Implementations must keep agents densely packed: `add_agent` returns
/// the next trailing slot, and `remove_agent` fills the freed slot with the
/// trailing agent (swap-remove), reporting that agent's former slot.
pub trait AvoidanceOracle {
    /// Append an agent and return its slot (always `agent_count()` before the call).
    fn add_agent(&mut self, position: Vec2Fixed) -> SlotHandle;

    /// Remove the agent at `slot`.
    ///
    /// Returns the former slot of the agent moved into `slot`, or `None`
    /// when `slot` was the last one.
    fn remove_agent(&mut self, slot: SlotHandle) -> Option<SlotHandle>;

    /// Overwrite the agent's position.
    fn set_agent_position(&mut self, slot: SlotHandle, position: Vec2Fixed);

    /// Velocity the agent would take without neighbours.
    fn set_agent_preferred_velocity(&mut self, slot: SlotHandle, velocity: Vec2Fixed);

    /// Upper bound on the agent's computed speed.
    fn set_agent_max_speed(&mut self, slot: SlotHandle, speed: Fixed);

    /// Footprint radius.
    fn set_agent_radius(&mut self, slot: SlotHandle, radius: Fixed);

    /// Velocity computed by the last [`step`](Self::step).
    fn agent_velocity(&self, slot: SlotHandle) -> Vec2Fixed;

    /// Number of live agents.
    fn agent_count(&self) -> usize;

    /// One global integration update using all current agent state.
    fn step(&mut self);
}
