//! Oracle instrumentation.
//!
//! [`CountingOracle`] wraps any [`AvoidanceOracle`] and records how the
//! simulation drives it, so tests can assert on step cadence and slot
//! churn without reaching into the wrapped implementation.

use skirmish_core::config::SimConfig;
use skirmish_core::math::{Fixed, Vec2Fixed};
use skirmish_core::oracle::{AvoidanceOracle, LocalAvoidance, SlotHandle};
use tracing::trace;

/// Call counters kept by [`CountingOracle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OracleCalls {
    /// `step` calls.
    pub steps: u64,
    /// `add_agent` calls.
    pub adds: u64,
    /// `remove_agent` calls.
    pub removes: u64,
    /// Removals that relocated the trailing agent.
    pub relocations: u64,
    /// Largest agent count seen.
    pub peak_agents: usize,
}

/// Pass-through oracle that counts calls.
#[derive(Debug, Clone)]
pub struct CountingOracle<O = LocalAvoidance> {
    inner: O,
    calls: OracleCalls,
}

impl<O> CountingOracle<O> {
    /// Wrap `inner`.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: OracleCalls::default(),
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn calls(&self) -> OracleCalls {
        self.calls
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }
}

impl CountingOracle<LocalAvoidance> {
    /// Counting wrapper around the reference oracle built from `config`.
    #[must_use]
    pub fn local(config: &SimConfig) -> Self {
        Self::new(LocalAvoidance::new(
            config.avoidance,
            config.field,
            config.unit_radius,
        ))
    }
}

impl<O: AvoidanceOracle> AvoidanceOracle for CountingOracle<O> {
    fn add_agent(&mut self, position: Vec2Fixed) -> SlotHandle {
        self.calls.adds += 1;
        let slot = self.inner.add_agent(position);
        self.calls.peak_agents = self.calls.peak_agents.max(self.inner.agent_count());
        slot
    }

    fn remove_agent(&mut self, slot: SlotHandle) -> Option<SlotHandle> {
        self.calls.removes += 1;
        let moved = self.inner.remove_agent(slot);
        if moved.is_some() {
            self.calls.relocations += 1;
        }
        moved
    }

    fn set_agent_position(&mut self, slot: SlotHandle, position: Vec2Fixed) {
        self.inner.set_agent_position(slot, position);
    }

    fn set_agent_preferred_velocity(&mut self, slot: SlotHandle, velocity: Vec2Fixed) {
        self.inner.set_agent_preferred_velocity(slot, velocity);
    }

    fn set_agent_max_speed(&mut self, slot: SlotHandle, speed: Fixed) {
        self.inner.set_agent_max_speed(slot, speed);
    }

    fn set_agent_radius(&mut self, slot: SlotHandle, radius: Fixed) {
        self.inner.set_agent_radius(slot, radius);
    }

    fn agent_velocity(&self, slot: SlotHandle) -> Vec2Fixed {
        self.inner.agent_velocity(slot)
    }

    fn agent_count(&self) -> usize {
        self.inner.agent_count()
    }

    fn step(&mut self) {
        self.calls.steps += 1;
        trace!(steps = self.calls.steps, agents = self.inner.agent_count(), "Oracle step");
        self.inner.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_pass_through() {
        let mut oracle = CountingOracle::local(&SimConfig::default());
        let a = oracle.add_agent(Vec2Fixed::from_ints(100, 100));
        oracle.add_agent(Vec2Fixed::from_ints(200, 100));
        oracle.add_agent(Vec2Fixed::from_ints(300, 100));
        oracle.step();
        assert_eq!(oracle.remove_agent(a), Some(SlotHandle::new(2)));

        let calls = oracle.calls();
        assert_eq!(calls.adds, 3);
        assert_eq!(calls.removes, 1);
        assert_eq!(calls.relocations, 1);
        assert_eq!(calls.steps, 1);
        assert_eq!(calls.peak_agents, 3);
        assert_eq!(oracle.inner().steps(), 1);
    }
}
