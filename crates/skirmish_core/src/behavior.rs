//! Behavior scheduler.
//!
//! Each tick every unit runs an ordered list of [`Rule`]s. A rule either
//! resolves the unit's intent for the tick or declines and lets the next
//! rule run. Rules only read the world, through [`BehaviorContext`], and
//! express intent as [`Order`]s handed to an [`OrderSink`]; the simulation
//! applies those orders.
//!
//! Default priority for AI units:
//!
//! 1. [`Rule::CooldownDecay`] - count down the recovery lock; resolves while it is still running.
//! 2. [`Rule::ThreatEngagement`] - attack or chase the nearest enemy in detection range.
//! 3. [`Rule::DefaultAdvance`] - move towards the persistent goal. Always resolves.
//!
//! The protected unit runs [`Rule::DefaultAdvance`] only.

use tracing::trace;

use crate::config::SimConfig;
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};
use crate::registry::UnitRegistry;
use crate::units::{Unit, UnitId};

/// Intent produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Store the decayed cooldown.
    SetCooldown {
        /// Acting unit.
        unit: UnitId,
        /// Seconds left on the recovery lock.
        remaining: Fixed,
    },
    /// Strike `target` and stand still.
    Attack {
        /// Acting unit.
        attacker: UnitId,
        /// Unit struck.
        target: UnitId,
    },
    /// Head for `destination` at move speed.
    MoveTo {
        /// Acting unit.
        unit: UnitId,
        /// Point to head for.
        destination: Vec2Fixed,
    },
}

/// Write half of the scheduler interface.
pub trait OrderSink {
    /// Accept one order. Orders are applied in submission order.
    fn submit(&mut self, order: Order);
}

impl OrderSink for Vec<Order> {
    fn submit(&mut self, order: Order) {
        self.push(order);
    }
}

/// Read half of the scheduler interface.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    units: &'a UnitRegistry,
    config: &'a SimConfig,
    protected: UnitId,
}

impl<'a> BehaviorContext<'a> {
    /// Build a view over `units`.
    #[must_use]
    pub fn new(units: &'a UnitRegistry, config: &'a SimConfig, protected: UnitId) -> Self {
        Self {
            units,
            config,
            protected,
        }
    }

    /// Look up a live unit.
    pub fn unit(&self, id: UnitId) -> Result<&'a Unit> {
        self.units.get(id)
    }

    /// All live units in scan order.
    pub fn units(&self) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units.iter()
    }

    /// Simulation configuration.
    #[must_use]
    pub fn config(&self) -> &'a SimConfig {
        self.config
    }

    /// Whether `id` is the protected unit.
    #[must_use]
    pub fn is_protected(&self, id: UnitId) -> bool {
        id == self.protected
    }

    /// Nearest opposing, unprotected unit strictly inside the detection radius.
    ///
    /// Ties keep the earliest unit in scan order (ascending ID). Emergent
    /// combat depends on this, so it must not change.
    #[must_use]
    pub fn nearest_enemy(&self, actor: &Unit) -> Option<&'a Unit> {
        let radius = self.config.detection_radius;
        let mut best_dist_sq = radius.saturating_mul(radius);
        let mut best = None;

        for other in self.units() {
            if other.team == actor.team || self.is_protected(other.id) {
                continue;
            }
            let dist_sq = other.position.distance_squared(actor.position);
            if dist_sq >= best_dist_sq {
                continue;
            }
            best_dist_sq = dist_sq;
            best = Some(other);
        }

        best
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The unit's intent for this tick is settled.
    Resolved,
    /// Fall through to the next rule.
    Declined,
}

/// A behavior rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Decrement the cooldown; resolve while it is still positive.
    CooldownDecay,
    /// Attack the nearest enemy in reach, or chase it.
    ThreatEngagement,
    /// Move towards the persistent goal.
    DefaultAdvance,
}

impl Rule {
    /// Evaluate this rule for `actor`.
    pub fn evaluate<S: OrderSink>(
        self,
        ctx: &BehaviorContext<'_>,
        actor: &Unit,
        dt: Fixed,
        sink: &mut S,
    ) -> Verdict {
        match self {
            Rule::CooldownDecay => {
                let remaining = actor.cooldown - dt;
                sink.submit(Order::SetCooldown {
                    unit: actor.id,
                    remaining,
                });
                if remaining > Fixed::ZERO {
                    Verdict::Resolved
                } else {
                    Verdict::Declined
                }
            }
            Rule::ThreatEngagement => {
                let Some(target) = ctx.nearest_enemy(actor) else {
                    return Verdict::Declined;
                };
                let reach = ctx.config().strike_distance(actor.engagement_range);
                if actor.position.distance_squared(target.position) < reach.saturating_mul(reach) {
                    sink.submit(Order::Attack {
                        attacker: actor.id,
                        target: target.id,
                    });
                } else {
                    sink.submit(Order::MoveTo {
                        unit: actor.id,
                        destination: target.position,
                    });
                }
                Verdict::Resolved
            }
            Rule::DefaultAdvance => {
                sink.submit(Order::MoveTo {
                    unit: actor.id,
                    destination: actor.goal,
                });
                Verdict::Resolved
            }
        }
    }
}

/// Preferred velocity for a move from `from` to `to`.
///
/// Returns `None` inside `epsilon` of the destination: the unit stands
/// still there instead of jittering around the arrival point.
#[must_use]
pub fn move_velocity(from: Vec2Fixed, to: Vec2Fixed, speed: Fixed, epsilon: Fixed) -> Option<Vec2Fixed> {
    let delta = to - from;
    if delta.length_squared() < epsilon * epsilon {
        return None;
    }
    Some(delta.normalize().scale(speed))
}

/// Ordered rule dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorScheduler {
    ai_rules: Vec<Rule>,
    protected_rules: Vec<Rule>,
}

impl Default for BehaviorScheduler {
    fn default() -> Self {
        Self {
            ai_rules: vec![
                Rule::CooldownDecay,
                Rule::ThreatEngagement,
                Rule::DefaultAdvance,
            ],
            protected_rules: vec![Rule::DefaultAdvance],
        }
    }
}

impl BehaviorScheduler {
    /// Scheduler with the standard rule priority.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules that apply to `id`, in priority order.
    #[must_use]
    pub fn rules_for(&self, ctx: &BehaviorContext<'_>, id: UnitId) -> &[Rule] {
        if ctx.is_protected(id) {
            &self.protected_rules
        } else {
            &self.ai_rules
        }
    }

    /// Run `actor`'s rules until one resolves.
    ///
    /// Returns the resolving rule, or `None` if every rule declined.
    pub fn evaluate<S: OrderSink>(
        &self,
        ctx: &BehaviorContext<'_>,
        actor: UnitId,
        dt: Fixed,
        sink: &mut S,
    ) -> Result<Option<Rule>> {
        let unit = ctx.unit(actor)?;
        for &rule in self.rules_for(ctx, actor) {
            if rule.evaluate(ctx, unit, dt, sink) == Verdict::Resolved {
                trace!(unit = actor, ?rule, "Rule resolved");
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LocalAvoidance;
    use crate::slots::SlotIndex;
    use crate::units::{Team, UnitSpawnParams};

    struct World {
        units: UnitRegistry,
        slots: SlotIndex<LocalAvoidance>,
        config: SimConfig,
        hero: UnitId,
    }

    impl World {
        fn new() -> Self {
            let config = SimConfig::default();
            let oracle = LocalAvoidance::new(config.avoidance, config.field, config.unit_radius);
            let mut slots = SlotIndex::new(oracle);
            let mut units = UnitRegistry::new();
            let hero = units.spawn(
                &mut slots,
                &config,
                UnitSpawnParams {
                    team: Team::Blue,
                    position: Vec2Fixed::from_ints(400, 300),
                    ..Default::default()
                },
            );
            Self {
                units,
                slots,
                config,
                hero,
            }
        }

        fn spawn(&mut self, team: Team, x: i32, y: i32, cooldown: i32) -> UnitId {
            self.units.spawn(
                &mut self.slots,
                &self.config,
                UnitSpawnParams {
                    team,
                    position: Vec2Fixed::from_ints(x, y),
                    goal: Some(Vec2Fixed::from_ints(700, 500)),
                    cooldown: Some(Fixed::from_num(cooldown)),
                    ..Default::default()
                },
            )
        }

        fn run(&self, id: UnitId) -> (Option<Rule>, Vec<Order>) {
            let ctx = BehaviorContext::new(&self.units, &self.config, self.hero);
            let mut orders = Vec::new();
            let rule = BehaviorScheduler::new()
                .evaluate(&ctx, id, self.config.tick_duration, &mut orders)
                .unwrap();
            (rule, orders)
        }
    }

    fn dt() -> Fixed {
        SimConfig::default().tick_duration
    }

    #[test]
    fn test_running_cooldown_is_terminal() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 1);
        // Enemy in reach; the lock must still win
        world.spawn(Team::Green, 110, 100, 0);

        let (rule, orders) = world.run(actor);
        assert_eq!(rule, Some(Rule::CooldownDecay));
        assert_eq!(
            orders,
            vec![Order::SetCooldown {
                unit: actor,
                remaining: Fixed::ONE - dt(),
            }]
        );
    }

    #[test]
    fn test_enemy_out_of_reach_is_chased() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        let enemy = world.spawn(Team::Green, 200, 100, 0);

        let (rule, orders) = world.run(actor);
        assert_eq!(rule, Some(Rule::ThreatEngagement));
        assert_eq!(
            orders[1],
            Order::MoveTo {
                unit: actor,
                destination: world.units.get(enemy).unwrap().position,
            }
        );
        assert_eq!(orders.len(), 2);
    }

    #[test]
    fn test_enemy_in_reach_is_attacked() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        // 39 < 8 + 2 * 16
        let enemy = world.spawn(Team::Green, 139, 100, 0);

        let (rule, orders) = world.run(actor);
        assert_eq!(rule, Some(Rule::ThreatEngagement));
        assert_eq!(
            orders[1],
            Order::Attack {
                attacker: actor,
                target: enemy,
            }
        );
    }

    #[test]
    fn test_reach_boundary_is_exclusive() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        world.spawn(Team::Green, 140, 100, 0);

        let (_, orders) = world.run(actor);
        assert!(matches!(orders[1], Order::MoveTo { .. }));
    }

    #[test]
    fn test_no_enemy_falls_through_to_goal() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        world.spawn(Team::Blue, 120, 100, 0);
        // Beyond detection radius
        world.spawn(Team::Green, 100, 450, 0);

        let (rule, orders) = world.run(actor);
        assert_eq!(rule, Some(Rule::DefaultAdvance));
        assert_eq!(
            orders[1],
            Order::MoveTo {
                unit: actor,
                destination: Vec2Fixed::from_ints(700, 500),
            }
        );
    }

    #[test]
    fn test_protected_unit_is_never_targeted() {
        let mut world = World::new();
        // Green unit right next to the Blue hero
        let actor = world.spawn(Team::Green, 410, 300, 0);

        let (rule, _) = world.run(actor);
        assert_eq!(rule, Some(Rule::DefaultAdvance));
    }

    #[test]
    fn test_protected_unit_only_advances() {
        let mut world = World::new();
        world.spawn(Team::Green, 410, 300, 0);
        world.units.get_mut(world.hero).unwrap().cooldown = Fixed::from_num(5);

        let (rule, orders) = world.run(world.hero);
        assert_eq!(rule, Some(Rule::DefaultAdvance));
        assert_eq!(
            orders,
            vec![Order::MoveTo {
                unit: world.hero,
                destination: Vec2Fixed::from_ints(400, 300),
            }]
        );
    }

    #[test]
    fn test_equidistant_enemies_pick_lowest_id() {
        // Tie-break is scan order; pinned because emergent combat depends on it
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        let first = world.spawn(Team::Green, 100, 200, 0);
        let _second = world.spawn(Team::Green, 200, 100, 0);

        let (_, orders) = world.run(actor);
        assert_eq!(
            orders[1],
            Order::MoveTo {
                unit: actor,
                destination: world.units.get(first).unwrap().position,
            }
        );
    }

    #[test]
    fn test_nearest_enemy_wins_over_scan_order() {
        let mut world = World::new();
        let actor = world.spawn(Team::Blue, 100, 100, 0);
        world.spawn(Team::Green, 100, 250, 0);
        let closer = world.spawn(Team::Green, 100, 180, 0);

        let ctx = BehaviorContext::new(&world.units, &world.config, world.hero);
        let unit = world.units.get(actor).unwrap();
        assert_eq!(ctx.nearest_enemy(unit).map(|u| u.id), Some(closer));
    }

    #[test]
    fn test_move_velocity_has_dead_zone() {
        let speed = Fixed::from_num(100);
        let eps = Fixed::from_num(0.1);
        let here = Vec2Fixed::from_ints(10, 10);
        let near = Vec2Fixed::new(Fixed::from_num(10.05), Fixed::from_num(10));
        assert_eq!(move_velocity(here, near, speed, eps), None);

        let v = move_velocity(here, Vec2Fixed::from_ints(10, 60), speed, eps).unwrap();
        assert_eq!(v.x, Fixed::ZERO);
        assert!((v.y - speed).abs() < Fixed::from_num(0.01));
    }

    #[test]
    fn test_empty_rule_list_is_noop() {
        let world = World::new();
        let ctx = BehaviorContext::new(&world.units, &world.config, world.hero);
        let scheduler = BehaviorScheduler {
            ai_rules: Vec::new(),
            protected_rules: Vec::new(),
        };
        let mut orders = Vec::new();
        let rule = scheduler
            .evaluate(&ctx, world.hero, dt(), &mut orders)
            .unwrap();
        assert_eq!(rule, None);
        assert!(orders.is_empty());
    }
}
