//! Property tests for the identity-slot index under churn.

use proptest::prelude::*;
use skirmish_core::config::SimConfig;
use skirmish_core::oracle::{AvoidanceOracle, LocalAvoidance, SlotHandle};
use skirmish_core::registry::UnitRegistry;
use skirmish_core::simulation::Simulation;
use skirmish_core::slots::{Removal, SlotIndex};
use skirmish_core::units::{UnitId, UnitSpawnParams};
use skirmish_test_utils::determinism::strategies::{arb_churn, arb_unit_list, ChurnOp};
use skirmish_test_utils::fixtures::quiet_config;

fn fresh() -> (UnitRegistry, SlotIndex<LocalAvoidance>, SimConfig) {
    let config = SimConfig::default();
    let oracle = LocalAvoidance::new(config.avoidance, config.field, config.unit_radius);
    (UnitRegistry::new(), SlotIndex::new(oracle), config)
}

proptest! {
    #[test]
    fn prop_maps_stay_inverse_under_churn(ops in arb_churn(80)) {
        let (mut units, mut slots, config) = fresh();

        for op in ops {
            match op {
                ChurnOp::Spawn(position) => {
                    units.spawn(&mut slots, &config, UnitSpawnParams {
                        position,
                        ..Default::default()
                    });
                }
                ChurnOp::Remove(pick) => {
                    let live = units.ids();
                    if live.is_empty() {
                        continue;
                    }
                    units.remove(&mut slots, live[pick % live.len()]).unwrap();
                }
            }

            prop_assert!(slots.verify(units.ids()).is_ok());
            prop_assert_eq!(slots.oracle().agent_count(), units.len());
            for id in units.ids() {
                let slot = slots.slot_of(id).unwrap();
                prop_assert_eq!(slots.id_of(slot).unwrap(), id);
            }
        }
    }

    #[test]
    fn prop_removal_only_moves_the_tail(count in 1usize..40, pick in any::<usize>()) {
        let (mut units, mut slots, config) = fresh();
        for _ in 0..count {
            units.spawn(&mut slots, &config, UnitSpawnParams::default());
        }

        let live = units.ids();
        let victim = live[pick % live.len()];
        let victim_slot = slots.slot_of(victim).unwrap();
        let tail_slot = SlotHandle::new(slots.len() - 1);
        let tail_unit = slots.id_of(tail_slot).unwrap();
        let before: Vec<(UnitId, SlotHandle)> = live
            .iter()
            .map(|&id| (id, slots.slot_of(id).unwrap()))
            .collect();

        let removal = slots.remove(victim);
        if victim == tail_unit {
            prop_assert_eq!(removal, Removal::Tail);
        } else {
            match removal {
                Removal::Relocated(moved) => {
                    prop_assert_eq!(moved.unit, tail_unit);
                    prop_assert_eq!(moved.from, tail_slot);
                    prop_assert_eq!(moved.to, victim_slot);
                }
                other => prop_assert!(false, "expected relocation, got {:?}", other),
            }
        }

        for (id, slot) in before {
            if id == victim {
                prop_assert!(!slots.contains(id));
            } else if id == tail_unit {
                prop_assert_eq!(slots.slot_of(id).unwrap(), victim_slot);
                prop_assert_eq!(slots.id_of(victim_slot).unwrap(), id);
            } else {
                prop_assert_eq!(slots.slot_of(id).unwrap(), slot);
            }
        }
    }

    #[test]
    fn prop_tick_loop_keeps_index_consistent(units in arb_unit_list(24)) {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        for params in units {
            sim.spawn_unit(params);
        }

        for _ in 0..40 {
            sim.tick().unwrap();
            prop_assert!(sim.verify().is_ok());
            prop_assert_eq!(sim.slots().oracle().agent_count(), sim.units().len());
            prop_assert!(sim.units().iter().all(|u| u.health > 0 || u.id == sim.protected_id()));
        }
    }
}
