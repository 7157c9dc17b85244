//! Test fixtures and helpers.
//!
//! Pre-built configurations and unit placements for consistent testing.

use fixed::types::I32F32;
use skirmish_core::config::SimConfig;
use skirmish_core::math::Vec2Fixed;
use skirmish_core::oracle::AvoidanceOracle;
use skirmish_core::simulation::Simulation;
use skirmish_core::units::{Team, UnitId, UnitSpawnParams};

use crate::oracle::CountingOracle;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Vector from integer coordinates.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Default configuration with waves disabled.
///
/// The wave clock still runs; only the protected unit exists until a test
/// spawns more.
#[must_use]
pub fn quiet_config() -> SimConfig {
    SimConfig {
        wave_size: 0,
        ..Default::default()
    }
}

/// Quiet configuration with fast, heavy strikes for short engagements.
#[must_use]
pub fn duel_config() -> SimConfig {
    SimConfig {
        attack_damage: 10,
        attack_cooldown: fixed_f(0.2),
        ..quiet_config()
    }
}

/// Spawn parameters for an unmoving unit that may act on the first tick.
#[must_use]
pub fn ready_unit(team: Team, at: Vec2Fixed) -> UnitSpawnParams {
    UnitSpawnParams {
        team,
        position: at,
        goal: Some(at),
        cooldown: Some(I32F32::ZERO),
        ..Default::default()
    }
}

/// Place one ready unit per team `gap` apart on a horizontal line.
///
/// Both get an engagement range covering the whole gap. Returns
/// `(blue, green)`.
pub fn spawn_duel<O: AvoidanceOracle>(sim: &mut Simulation<O>, gap: i32) -> (UnitId, UnitId) {
    let left = point(200, 100);
    let right = point(200 + gap, 100);
    let blue = sim.spawn_unit(UnitSpawnParams {
        engagement_range: Some(fixed(gap)),
        ..ready_unit(Team::Blue, left)
    });
    let green = sim.spawn_unit(UnitSpawnParams {
        engagement_range: Some(fixed(gap)),
        ..ready_unit(Team::Green, right)
    });
    (blue, green)
}

/// Simulation over a [`CountingOracle`] wrapping the reference oracle.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn counting_simulation(config: SimConfig) -> Simulation<CountingOracle> {
    let oracle = CountingOracle::local(&config);
    Simulation::with_oracle(config, oracle).expect("fixture config is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duel_fixture_places_units_in_range() {
        let mut sim = Simulation::new(duel_config()).unwrap();
        let (blue, green) = spawn_duel(&mut sim, 50);
        let a = sim.unit(blue).unwrap();
        let b = sim.unit(green).unwrap();
        let reach = sim.config().strike_distance(a.engagement_range);
        assert!(a.position.distance_squared(b.position) < reach * reach);
        assert_eq!(sim.units().len(), 3);
    }

    #[test]
    fn test_counting_simulation_starts_with_protected_agent() {
        let sim = counting_simulation(quiet_config());
        assert_eq!(sim.slots().oracle().calls().adds, 1);
        assert_eq!(sim.slots().oracle().calls().steps, 0);
    }
}
