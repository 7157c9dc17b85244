//! Identity-slot index.
//!
//! Bidirectional mapping between stable [`UnitId`]s and the oracle's dense,
//! compacting slots. The index owns the oracle: every oracle mutation goes
//! through here, keyed by unit ID, so a stale slot handle can never reach
//! the oracle.
//!
//! # Invariant
//!
//! For every live unit `id`, `slot_of(id)` is a valid oracle slot and
//! `id_of(slot_of(id)) == id`. The two maps are exact inverses over the
//! live set and the oracle holds exactly one agent per live unit.
//!
//! Removal mirrors the oracle's swap-remove inside the same call, so no
//! caller ever observes the oracle compacted while the maps are not.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{Result, SimError};
use crate::math::{Fixed, Vec2Fixed};
use crate::oracle::{AvoidanceOracle, SlotHandle};
use crate::units::UnitId;

/// A unit moved by compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Unit that moved.
    pub unit: UnitId,
    /// Slot it occupied before the removal (always the former tail).
    pub from: SlotHandle,
    /// Slot it occupies now (the freed slot).
    pub to: SlotHandle,
}

/// Outcome of [`SlotIndex::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The unit was not indexed; nothing changed.
    NotPresent,
    /// The unit occupied the tail slot; nothing moved.
    Tail,
    /// The tail unit moved into the freed slot.
    Relocated(Relocation),
}

/// Owner of the avoidance oracle and its identity mapping.
#[derive(Debug, Clone)]
pub struct SlotIndex<O> {
    oracle: O,
    slot_of: HashMap<UnitId, SlotHandle>,
    unit_at: Vec<UnitId>,
}

impl<O: AvoidanceOracle> SlotIndex<O> {
    /// Wrap an empty oracle.
    ///
    /// # Panics
    ///
    /// Panics if the oracle already holds agents, since they would have no
    /// owning unit.
    pub fn new(oracle: O) -> Self {
        assert_eq!(
            oracle.agent_count(),
            0,
            "slot index must start from an empty oracle"
        );
        Self {
            oracle,
            slot_of: HashMap::new(),
            unit_at: Vec::new(),
        }
    }

    /// Insert an agent for `id` at a new trailing slot.
    pub fn add(&mut self, id: UnitId, position: Vec2Fixed, radius: Fixed) -> SlotHandle {
        debug_assert!(!self.slot_of.contains_key(&id), "unit {id} indexed twice");

        let slot = self.oracle.add_agent(position);
        debug_assert_eq!(slot.index(), self.unit_at.len(), "oracle broke trailing-add");
        self.oracle.set_agent_radius(slot, radius);

        self.unit_at.push(id);
        self.slot_of.insert(id, slot);
        slot
    }

    /// Remove `id`'s agent, mirroring the oracle's compaction.
    ///
    /// A unit that is not indexed is a no-op reported as
    /// [`Removal::NotPresent`].
    pub fn remove(&mut self, id: UnitId) -> Removal {
        let Some(slot) = self.slot_of.remove(&id) else {
            return Removal::NotPresent;
        };

        let tail = self.unit_at.len() - 1;
        let moved_from = self.oracle.remove_agent(slot);
        self.unit_at.swap_remove(slot.index());

        match moved_from {
            Some(from) => {
                debug_assert_eq!(from.index(), tail, "oracle relocated a non-tail agent");
                let unit = self.unit_at[slot.index()];
                self.slot_of.insert(unit, slot);
                trace!(unit, from = from.index(), to = slot.index(), "Slot relocated");
                Removal::Relocated(Relocation {
                    unit,
                    from,
                    to: slot,
                })
            }
            None => {
                debug_assert_eq!(slot.index(), tail, "oracle left a hole");
                Removal::Tail
            }
        }
    }

    /// Slot currently assigned to `id`.
    pub fn slot_of(&self, id: UnitId) -> Result<SlotHandle> {
        self.slot_of
            .get(&id)
            .copied()
            .ok_or(SimError::UnknownUnit(id))
    }

    /// Unit occupying `slot`.
    pub fn id_of(&self, slot: SlotHandle) -> Result<UnitId> {
        self.unit_at
            .get(slot.index())
            .copied()
            .ok_or(SimError::UnknownSlot(slot.index()))
    }

    /// Whether `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.slot_of.contains_key(&id)
    }

    /// Number of indexed units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.unit_at.len()
    }

    /// Whether no units are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unit_at.is_empty()
    }

    /// Read-only access to the oracle.
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Push `id`'s current position into its slot.
    pub fn set_position(&mut self, id: UnitId, position: Vec2Fixed) -> Result<()> {
        let slot = self.slot_of(id)?;
        self.oracle.set_agent_position(slot, position);
        Ok(())
    }

    /// Set `id`'s desired velocity.
    pub fn set_preferred_velocity(&mut self, id: UnitId, velocity: Vec2Fixed) -> Result<()> {
        let slot = self.slot_of(id)?;
        self.oracle.set_agent_preferred_velocity(slot, velocity);
        Ok(())
    }

    /// Set `id`'s speed cap.
    pub fn set_max_speed(&mut self, id: UnitId, speed: Fixed) -> Result<()> {
        let slot = self.slot_of(id)?;
        self.oracle.set_agent_max_speed(slot, speed);
        Ok(())
    }

    /// Velocity the oracle last computed for `id`.
    pub fn velocity(&self, id: UnitId) -> Result<Vec2Fixed> {
        let slot = self.slot_of(id)?;
        Ok(self.oracle.agent_velocity(slot))
    }

    /// Run one oracle integration step.
    pub fn step(&mut self) {
        self.oracle.step();
    }

    /// Check that the mappings are exact inverses over exactly `live`.
    pub fn verify<I>(&self, live: I) -> Result<()>
    where
        I: IntoIterator<Item = UnitId>,
    {
        let corrupted = |msg: String| Err(SimError::SlotIndexCorrupted(msg));

        if self.oracle.agent_count() != self.unit_at.len() {
            return corrupted(format!(
                "oracle holds {} agents, index holds {}",
                self.oracle.agent_count(),
                self.unit_at.len()
            ));
        }
        if self.slot_of.len() != self.unit_at.len() {
            return corrupted(format!(
                "{} ids map to {} slots",
                self.slot_of.len(),
                self.unit_at.len()
            ));
        }
        for (index, &id) in self.unit_at.iter().enumerate() {
            match self.slot_of.get(&id) {
                Some(slot) if slot.index() == index => {}
                Some(slot) => {
                    return corrupted(format!(
                        "slot {index} holds unit {id}, which maps to slot {}",
                        slot.index()
                    ))
                }
                None => return corrupted(format!("slot {index} holds orphaned unit {id}")),
            }
        }
        let mut live_count = 0;
        for id in live {
            if !self.slot_of.contains_key(&id) {
                return corrupted(format!("live unit {id} has no slot"));
            }
            live_count += 1;
        }
        if live_count != self.unit_at.len() {
            return corrupted(format!(
                "{live_count} live units but {} slots",
                self.unit_at.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AvoidanceConfig, FieldConfig};
    use crate::oracle::LocalAvoidance;

    fn index() -> SlotIndex<LocalAvoidance> {
        SlotIndex::new(LocalAvoidance::new(
            AvoidanceConfig::default(),
            FieldConfig::default(),
            Fixed::from_num(16),
        ))
    }

    fn radius() -> Fixed {
        Fixed::from_num(16)
    }

    #[test]
    fn test_add_assigns_trailing_slots() {
        let mut slots = index();
        assert_eq!(slots.add(10, Vec2Fixed::ZERO, radius()), SlotHandle::new(0));
        assert_eq!(slots.add(11, Vec2Fixed::ZERO, radius()), SlotHandle::new(1));
        assert_eq!(slots.id_of(SlotHandle::new(1)), Ok(11));
        assert_eq!(slots.slot_of(10), Ok(SlotHandle::new(0)));
        assert!(slots.verify([10, 11]).is_ok());
    }

    #[test]
    fn test_remove_middle_relocates_tail() {
        let mut slots = index();
        for id in 1..=4 {
            slots.add(id, Vec2Fixed::from_ints(id as i32 * 50, 50), radius());
        }

        let removal = slots.remove(2);
        assert_eq!(
            removal,
            Removal::Relocated(Relocation {
                unit: 4,
                from: SlotHandle::new(3),
                to: SlotHandle::new(1),
            })
        );
        assert_eq!(slots.slot_of(4), Ok(SlotHandle::new(1)));
        assert_eq!(slots.id_of(SlotHandle::new(1)), Ok(4));
        // Others keep their slots
        assert_eq!(slots.slot_of(1), Ok(SlotHandle::new(0)));
        assert_eq!(slots.slot_of(3), Ok(SlotHandle::new(2)));
        assert_eq!(slots.slot_of(2), Err(SimError::UnknownUnit(2)));
        assert_eq!(
            slots.id_of(SlotHandle::new(3)),
            Err(SimError::UnknownSlot(3))
        );
        assert!(slots.verify([1, 3, 4]).is_ok());
    }

    #[test]
    fn test_remove_tail_and_only_unit() {
        let mut slots = index();
        slots.add(1, Vec2Fixed::ZERO, radius());
        slots.add(2, Vec2Fixed::ZERO, radius());

        assert_eq!(slots.remove(2), Removal::Tail);
        assert_eq!(slots.remove(1), Removal::Tail);
        assert!(slots.is_empty());
        assert_eq!(slots.oracle().agent_count(), 0);
        assert!(slots.verify([]).is_ok());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut slots = index();
        slots.add(1, Vec2Fixed::ZERO, radius());
        assert_eq!(slots.remove(99), Removal::NotPresent);
        assert_eq!(slots.remove(1), Removal::Tail);
        assert_eq!(slots.remove(1), Removal::NotPresent);
    }

    #[test]
    fn test_mutators_follow_relocation() {
        let mut slots = index();
        for id in 1..=3 {
            slots.add(id, Vec2Fixed::from_ints(100 * id as i32, 100), radius());
        }
        slots.remove(1);

        // Unit 3 now lives in slot 0; writes keyed by id must land there
        slots.set_position(3, Vec2Fixed::from_ints(700, 500)).unwrap();
        assert_eq!(
            slots.oracle().agent_position(SlotHandle::new(0)),
            Some(Vec2Fixed::from_ints(700, 500))
        );
        assert_eq!(
            slots.set_max_speed(1, Fixed::ONE),
            Err(SimError::UnknownUnit(1))
        );
    }

    #[test]
    fn test_verify_detects_live_set_mismatch() {
        let mut slots = index();
        slots.add(1, Vec2Fixed::ZERO, radius());
        assert!(matches!(
            slots.verify([1, 2]),
            Err(SimError::SlotIndexCorrupted(_))
        ));
        assert!(matches!(
            slots.verify([]),
            Err(SimError::SlotIndexCorrupted(_))
        ));
    }
}
