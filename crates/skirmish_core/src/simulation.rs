//! Core simulation loop.
//!
//! The loop is driven externally, one tick at a time. Each tick runs a fixed
//! phase order over the whole population:
//!
//! 1. **Input** - apply a queued goal to the protected unit
//! 2. **Spawn** - one full wave per crossed wave boundary
//! 3. **Behavior** - every live unit runs its rules, orders applied as they come
//! 4. **Sweep** - remove depleted units (never the protected one)
//! 5. **Position push** - write every position into its oracle slot
//! 6. **Oracle step** - on the first tick and every N-th one after it
//! 7. **Integrate** - pull velocities back and advance positions by Δt
//!
//! Removal only happens in the sweep, after the behavior pass has finished,
//! so every unit is evaluated exactly once per tick however many die.
//!
//! # Determinism
//!
//! - No floating-point math (uses fixed-point via [`Fixed`])
//! - No system randomness
//! - Every full-population pass visits units in ascending ID order
//!
//! # Example
//!
//! ```
//! use skirmish_core::config::SimConfig;
//! use skirmish_core::math::Vec2Fixed;
//! use skirmish_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! sim.queue_goal(Vec2Fixed::from_ints(600, 100));
//!
//! let events = sim.tick().unwrap();
//! assert_eq!(events.waves, 1);
//! assert_eq!(sim.get_tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::behavior::{move_velocity, BehaviorContext, BehaviorScheduler, Order};
use crate::config::{duration_to_ms, SimConfig};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::oracle::{AvoidanceOracle, LocalAvoidance};
use crate::registry::UnitRegistry;
use crate::render::UnitFrame;
use crate::slots::SlotIndex;
use crate::spawn::{self, WaveClock};
use crate::units::{ActivityState, Unit, UnitId, UnitSpawnParams};

/// A resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    /// Unit that struck.
    pub attacker: UnitId,
    /// Unit struck.
    pub target: UnitId,
    /// Target health after the strike.
    pub remaining_health: i32,
}

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Units spawned this tick.
    pub spawned: Vec<UnitId>,
    /// Attacks resolved this tick, in resolution order.
    pub attacks: Vec<AttackEvent>,
    /// Units removed by the sweep this tick.
    pub deaths: Vec<UnitId>,
    /// Waves spawned this tick.
    pub waves: u64,
    /// Whether the oracle ran an integration step this tick.
    pub oracle_stepped: bool,
}

/// The skirmish simulation.
///
/// Owns the unit registry and, through the slot index, the avoidance oracle.
/// Tests substitute the oracle through [`Simulation::with_oracle`].
#[derive(Debug, Clone)]
pub struct Simulation<O: AvoidanceOracle = LocalAvoidance> {
    config: SimConfig,
    units: UnitRegistry,
    slots: SlotIndex<O>,
    scheduler: BehaviorScheduler,
    clock: WaveClock,
    /// Completed ticks.
    tick: u64,
    /// Ticks seen by the oracle rate limiter.
    frame_count: u64,
    protected: UnitId,
    pending_goal: Option<Vec2Fixed>,
}

impl Simulation<LocalAvoidance> {
    /// Create a simulation backed by the reference oracle.
    ///
    /// The protected unit is spawned at the field centre before the first
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`](crate::error::SimError::InvalidConfig)
    /// if `config` fails validation.
    pub fn new(config: SimConfig) -> Result<Self> {
        let oracle = LocalAvoidance::new(config.avoidance, config.field, config.unit_radius);
        Self::with_oracle(config, oracle)
    }
}

impl<O: AvoidanceOracle> Simulation<O> {
    /// Create a simulation over an empty `oracle`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`](crate::error::SimError::InvalidConfig)
    /// if `config` fails validation.
    pub fn with_oracle(config: SimConfig, oracle: O) -> Result<Self> {
        config.validate()?;

        let mut slots = SlotIndex::new(oracle);
        let mut units = UnitRegistry::new();
        let center = config.field.center();
        let protected = units.spawn(
            &mut slots,
            &config,
            UnitSpawnParams {
                team: config.protected_team,
                position: center,
                goal: Some(center),
                ..Default::default()
            },
        );
        debug!(protected, "Protected unit created");

        Ok(Self {
            clock: WaveClock::new(config.wave_interval_ms),
            config,
            units,
            slots,
            scheduler: BehaviorScheduler::new(),
            tick: 0,
            frame_count: 0,
            protected,
            pending_goal: None,
        })
    }

    /// Get the current tick number.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Simulated milliseconds elapsed.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    /// Configuration the simulation was built with.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// ID of the protected unit.
    #[must_use]
    pub const fn protected_id(&self) -> UnitId {
        self.protected
    }

    /// The unit registry.
    #[must_use]
    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// The identity-slot index and, through it, the oracle.
    #[must_use]
    pub fn slots(&self) -> &SlotIndex<O> {
        &self.slots
    }

    /// Look up a live unit.
    pub fn unit(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(id)
    }

    /// Spawn a unit from explicit parameters, outside the wave policy.
    pub fn spawn_unit(&mut self, params: UnitSpawnParams) -> UnitId {
        self.units.spawn(&mut self.slots, &self.config, params)
    }

    /// Queue a new goal for the protected unit.
    ///
    /// Applied at the start of the next tick. A later call before that tick
    /// replaces the earlier one. Goals off the field are clamped onto it.
    pub fn queue_goal(&mut self, goal: Vec2Fixed) {
        let field = self.config.field;
        let goal = if field.contains(goal) {
            goal
        } else {
            let clamped = field.clamp(goal);
            warn!(x = %goal.x, y = %goal.y, to_x = %clamped.x, to_y = %clamped.y, "Goal off the field, clamped");
            clamped
        };
        if let Some(previous) = self.pending_goal.replace(goal) {
            trace!(x = %previous.x, y = %previous.y, "Pending goal superseded");
        }
    }

    /// Remove `amount` health from `id` directly.
    ///
    /// Depleted units are removed by the next sweep as usual. Non-positive
    /// amounts are ignored. Returns the unit's remaining health.
    pub fn damage_unit(&mut self, id: UnitId, amount: i32) -> Result<i32> {
        let unit = self.units.get_mut(id)?;
        if amount <= 0 {
            warn!(unit = id, amount, "Ignoring non-positive damage");
            return Ok(unit.health);
        }
        unit.health = unit.health.saturating_sub(amount);
        Ok(unit.health)
    }

    /// Advance by the configured tick duration.
    pub fn tick(&mut self) -> Result<TickEvents> {
        self.advance(self.config.tick_duration)
    }

    /// Advance by `dt` seconds. Negative durations count as zero.
    ///
    /// # Errors
    ///
    /// Any error is an invariant violation; the simulation must not be
    /// ticked further after one.
    pub fn advance(&mut self, dt: Fixed) -> Result<TickEvents> {
        let dt = dt.max(Fixed::ZERO);
        let mut events = TickEvents::default();

        // 1. Input
        if let Some(goal) = self.pending_goal.take() {
            self.units.get_mut(self.protected)?.goal = goal;
            debug!(x = %goal.x, y = %goal.y, "Protected goal set");
        }

        // 2. Spawn
        events.waves = self.clock.advance(duration_to_ms(dt));
        for _ in 0..events.waves {
            self.spawn_wave(&mut events.spawned);
        }

        // 3. Behavior
        self.run_behavior_pass(dt, &mut events.attacks)?;

        // 4. Sweep
        events.deaths = self.run_death_sweep()?;

        // 5. Position push
        for unit in self.units.iter() {
            self.slots.set_position(unit.id, unit.position)?;
        }

        // 6. Oracle step
        events.oracle_stepped = self.run_oracle_step();

        // 7. Integrate
        for unit in self.units.iter_mut() {
            let velocity = self.slots.velocity(unit.id)?;
            unit.position += velocity.scale(dt);
        }

        self.tick += 1;

        #[cfg(feature = "debug-validation")]
        self.verify()?;

        debug!(
            tick = self.tick,
            units = self.units.len(),
            spawned = events.spawned.len(),
            attacks = events.attacks.len(),
            deaths = events.deaths.len(),
            stepped = events.oracle_stepped,
            "Tick complete"
        );

        Ok(events)
    }

    fn spawn_wave(&mut self, spawned: &mut Vec<UnitId>) {
        for (team, index) in spawn::wave_roster(self.config.wave_size) {
            let id = self
                .units
                .spawn_wave_member(&mut self.slots, &self.config, team, index);
            spawned.push(id);
        }
        debug!(
            tick = self.tick,
            elapsed_ms = self.clock.elapsed_ms(),
            per_team = self.config.wave_size,
            "Wave spawned"
        );
    }

    fn run_behavior_pass(&mut self, dt: Fixed, attacks: &mut Vec<AttackEvent>) -> Result<()> {
        let mut orders = Vec::new();

        for id in self.units.ids() {
            let ctx = BehaviorContext::new(&self.units, &self.config, self.protected);
            self.scheduler.evaluate(&ctx, id, dt, &mut orders)?;

            // Applied before the next unit runs, so it sees this unit's strike
            for order in orders.drain(..) {
                if let Some(attack) = self.apply_order(order)? {
                    attacks.push(attack);
                }
            }
        }

        Ok(())
    }

    fn apply_order(&mut self, order: Order) -> Result<Option<AttackEvent>> {
        trace!(?order, "Applying order");

        match order {
            Order::SetCooldown { unit, remaining } => {
                self.units.get_mut(unit)?.cooldown = remaining;
                Ok(None)
            }
            Order::Attack { attacker, target } => {
                let struck = self.units.get_mut(target)?;
                struck.health = struck.health.saturating_sub(self.config.attack_damage);
                let remaining_health = struck.health;

                let unit = self.units.get_mut(attacker)?;
                unit.cooldown = self.config.attack_cooldown;
                unit.sub_goal = unit.position;
                unit.state = ActivityState::Attacking;
                unit.actions += 1;

                self.slots.set_preferred_velocity(attacker, Vec2Fixed::ZERO)?;
                self.slots.set_max_speed(attacker, Fixed::ZERO)?;

                Ok(Some(AttackEvent {
                    attacker,
                    target,
                    remaining_health,
                }))
            }
            Order::MoveTo { unit, destination } => {
                let speed = self.config.move_speed;
                let mover = self.units.get_mut(unit)?;
                let velocity =
                    move_velocity(mover.position, destination, speed, self.config.arrival_epsilon);
                mover.sub_goal = destination;
                mover.state = ActivityState::Moving;

                self.slots
                    .set_preferred_velocity(unit, velocity.unwrap_or(Vec2Fixed::ZERO))?;
                // An attack drops the cap to zero; every move restores it, even
                // at rest, so the oracle can still push the unit out of overlaps
                self.slots.set_max_speed(unit, speed)?;
                Ok(None)
            }
        }
    }

    fn run_death_sweep(&mut self) -> Result<Vec<UnitId>> {
        let depleted = self.units.depleted(self.protected);
        for &id in &depleted {
            let unit = self.units.remove(&mut self.slots, id)?;
            debug!(unit = id, team = ?unit.team, health = unit.health, "Unit removed");
        }
        Ok(depleted)
    }

    /// Steps on ticks 1, 1 + N, 1 + 2N, ...
    fn run_oracle_step(&mut self) -> bool {
        let stepped = self.frame_count % self.config.ticks_per_oracle_step == 0;
        self.frame_count += 1;
        if stepped {
            self.slots.step();
        }
        stepped
    }

    /// Check that the slot index matches the live unit set.
    pub fn verify(&self) -> Result<()> {
        self.slots.verify(self.units.iter().map(|unit| unit.id))
    }

    /// Snapshot every live unit for rendering, in ascending ID order.
    pub fn frame(&self) -> Result<Vec<UnitFrame>> {
        self.units
            .iter()
            .map(|unit| {
                let velocity = self.slots.velocity(unit.id)?;
                Ok(UnitFrame::capture(unit, velocity, &self.config, self.protected))
            })
            .collect()
    }

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations fed identical input produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.clock.elapsed_ms().hash(&mut hasher);
        self.protected.hash(&mut hasher);
        self.units.len().hash(&mut hasher);

        for unit in self.units.iter() {
            unit.id.hash(&mut hasher);
            unit.position.hash(&mut hasher);
            unit.goal.hash(&mut hasher);
            unit.sub_goal.hash(&mut hasher);
            unit.team.hash(&mut hasher);
            unit.health.hash(&mut hasher);
            unit.cooldown.to_bits().hash(&mut hasher);
            unit.engagement_range.to_bits().hash(&mut hasher);
            unit.state.hash(&mut hasher);
            unit.actions.hash(&mut hasher);

            if let Ok(slot) = self.slots.slot_of(unit.id) {
                slot.index().hash(&mut hasher);
            }
        }

        hasher.finish()
    }
}
