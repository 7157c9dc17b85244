//! Unit registry.
//!
//! Owns every [`Unit`] keyed by [`UnitId`]. Storage is ordered by ID, so
//! every full-population pass visits units in ascending ID order; that
//! order is also the scan order behind the nearest-enemy tie-break.
//!
//! Spawning and removal take the [`SlotIndex`] so that a unit and its
//! oracle agent always come and go together.

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::oracle::AvoidanceOracle;
use crate::slots::{Removal, SlotIndex};
use crate::spawn;
use crate::units::{ActivityState, Team, Unit, UnitId, UnitSpawnParams};

/// Storage for all live units.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: BTreeMap<UnitId, Unit>,
    next_id: UnitId,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Create a unit from explicit parameters and register its agent.
    pub fn spawn<O: AvoidanceOracle>(
        &mut self,
        slots: &mut SlotIndex<O>,
        config: &SimConfig,
        params: UnitSpawnParams,
    ) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;

        let unit = Unit {
            id,
            position: params.position,
            goal: params.goal.unwrap_or(params.position),
            sub_goal: params.position,
            team: params.team,
            health: params.health.unwrap_or(config.max_health),
            cooldown: params.cooldown.unwrap_or(config.attack_cooldown),
            engagement_range: params.engagement_range.unwrap_or(config.far_range),
            state: ActivityState::Moving,
            actions: 0,
        };

        slots.add(id, unit.position, config.unit_radius);
        trace!(id, team = ?unit.team, x = %unit.position.x, y = %unit.position.y, "Unit spawned");
        self.units.insert(id, unit);
        id
    }

    /// Spawn the `wave_index`-th member of `team`'s wave.
    pub fn spawn_wave_member<O: AvoidanceOracle>(
        &mut self,
        slots: &mut SlotIndex<O>,
        config: &SimConfig,
        team: Team,
        wave_index: u32,
    ) -> UnitId {
        self.spawn(slots, config, spawn::wave_member(config, team, wave_index))
    }

    /// Remove a unit and its agent.
    pub fn remove<O: AvoidanceOracle>(
        &mut self,
        slots: &mut SlotIndex<O>,
        id: UnitId,
    ) -> Result<Unit> {
        let unit = self.units.remove(&id).ok_or(SimError::UnknownUnit(id))?;
        if slots.remove(id) == Removal::NotPresent {
            return Err(SimError::SlotIndexCorrupted(format!(
                "unit {id} was registered without a slot"
            )));
        }
        Ok(unit)
    }

    /// Get a unit by ID.
    pub fn get(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(SimError::UnknownUnit(id))
    }

    /// Get a mutable reference to a unit by ID.
    pub fn get_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(SimError::UnknownUnit(id))
    }

    /// Check if a unit exists.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate over all units in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Iterate mutably over all units in ascending ID order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Unit> {
        self.units.values_mut()
    }

    /// Snapshot of live IDs in ascending order.
    ///
    /// Passes that mutate the registry iterate this snapshot, never the map.
    #[must_use]
    pub fn ids(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    /// Units eligible for the death sweep: depleted and not `protected`.
    #[must_use]
    pub fn depleted(&self, protected: UnitId) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|unit| unit.is_depleted() && unit.id != protected)
            .map(|unit| unit.id)
            .collect()
    }
}
