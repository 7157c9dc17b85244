//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism guarded against:
//!
//! - **Floating-point math**: positions, velocities and timers are
//!   [`skirmish_core::math::Fixed`] throughout.
//!
//! - **Map iteration order**: full-population passes walk units in
//!   ascending ID order; the slot index's hash map is only ever used for
//!   point lookups.
//!
//! - **Slot churn**: compaction moves agents between oracle slots. The
//!   state hash includes each unit's slot, so a divergent relocation shows
//!   up even before it changes a position.

use std::thread;

use skirmish_core::oracle::AvoidanceOracle;
use skirmish_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and compares final
/// state hashes.
///
/// # Panics
///
/// Panics if a tick fails.
///
/// # Example
///
/// ```
/// use skirmish_core::config::SimConfig;
/// use skirmish_core::simulation::Simulation;
/// use skirmish_test_utils::determinism::verify_simulation_determinism;
///
/// assert!(verify_simulation_determinism(
///     || Simulation::new(SimConfig::default()).unwrap(),
///     100,
/// ));
/// ```
pub fn verify_simulation_determinism<O, F>(setup_fn: F, num_ticks: u64) -> bool
where
    O: AvoidanceOracle,
    F: Fn() -> Simulation<O>,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick().expect("tick failed");
        },
        |sim| sim.state_hash(),
    );
    result.is_deterministic
}

/// Run `num_sims` simulations on scoped threads and collect final hashes.
///
/// Catches state that leaks between runs through anything global.
///
/// # Panics
///
/// Panics if a tick fails or a worker thread panics.
pub fn run_parallel_simulations<O, F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    O: AvoidanceOracle,
    F: Fn() -> Simulation<O> + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick().expect("tick failed");
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
///
/// # Panics
///
/// Panics if a tick fails.
pub fn find_first_divergence<O, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    O: AvoidanceOracle,
    F: Fn() -> Simulation<O>,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick().expect("tick failed");
        sim2.tick().expect("tick failed");

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for simulation testing.
pub mod strategies {
    use proptest::prelude::*;
    use skirmish_core::math::{Fixed, Vec2Fixed};
    use skirmish_core::units::{Team, UnitSpawnParams};

    /// A step of a spawn/remove churn sequence.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ChurnOp {
        /// Spawn a unit at the given position.
        Spawn(Vec2Fixed),
        /// Remove the live unit at this index into the ascending live set,
        /// modulo its length.
        Remove(usize),
    }

    /// Any team.
    pub fn arb_team() -> impl Strategy<Value = Team> {
        prop_oneof![Just(Team::Blue), Just(Team::Green)]
    }

    /// Position inside the default 800x600 field, away from the walls.
    pub fn arb_field_position() -> impl Strategy<Value = Vec2Fixed> {
        (16i32..784, 16i32..584).prop_map(|(x, y)| Vec2Fixed::from_ints(x, y))
    }

    /// Engagement range in fixed-point.
    pub fn arb_engagement_range() -> impl Strategy<Value = Fixed> {
        (0i32..60).prop_map(Fixed::from_num)
    }

    /// Spawn parameters for a unit somewhere on the field.
    pub fn arb_unit_params() -> impl Strategy<Value = UnitSpawnParams> {
        (
            arb_team(),
            arb_field_position(),
            arb_field_position(),
            arb_engagement_range(),
            1i32..100,
        )
            .prop_map(|(team, position, goal, range, health)| UnitSpawnParams {
                team,
                position,
                goal: Some(goal),
                engagement_range: Some(range),
                health: Some(health),
                cooldown: Some(Fixed::ZERO),
            })
    }

    /// A list of unit spawn parameters.
    pub fn arb_unit_list(max_units: usize) -> impl Strategy<Value = Vec<UnitSpawnParams>> {
        proptest::collection::vec(arb_unit_params(), 1..max_units)
    }

    /// One churn step, spawns twice as likely as removals.
    pub fn arb_churn_op() -> impl Strategy<Value = ChurnOp> {
        prop_oneof![
            2 => arb_field_position().prop_map(ChurnOp::Spawn),
            1 => any::<usize>().prop_map(ChurnOp::Remove),
        ]
    }

    /// A spawn/remove churn sequence.
    pub fn arb_churn(max_len: usize) -> impl Strategy<Value = Vec<ChurnOp>> {
        proptest::collection::vec(arb_churn_op(), 0..max_len)
    }
}
