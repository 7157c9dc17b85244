//! Unit data model.
//!
//! Units are plain data owned by the [`UnitRegistry`](crate::registry::UnitRegistry).
//! The identifier is the only handle callers ever hold; where a unit lives in
//! storage, or which oracle slot it occupies, is never exposed through it.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// Unique identifier for units.
///
/// Assigned monotonically, never reused.
pub type UnitId = u64;

/// Team tag.
///
/// The two teams start in opposite corners of the field and advance
/// towards each other's corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Team {
    /// Starts near the origin, advances towards the far corner.
    #[default]
    Blue,
    /// Starts in the far corner, advances towards the origin.
    Green,
}

impl Team {
    /// Both teams, in wave spawn order.
    pub const ALL: [Team; 2] = [Team::Blue, Team::Green];

    /// Numeric index of the team (0 or 1).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Team::Blue => 0,
            Team::Green => 1,
        }
    }
}

/// What the unit did on its last resolved order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivityState {
    /// Following a move order.
    #[default]
    Moving,
    /// Standing still and striking a target.
    Attacking,
}

/// A simulated combatant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Stable identifier.
    pub id: UnitId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Persistent destination. For the protected unit this is input-driven.
    pub goal: Vec2Fixed,
    /// Destination of the most recent order. Used for facing only.
    pub sub_goal: Vec2Fixed,
    /// Team tag.
    pub team: Team,
    /// Remaining health. Signed: damage may push it below zero before the sweep.
    pub health: i32,
    /// Seconds until the unit may act again.
    pub cooldown: Fixed,
    /// Extra reach beyond touching distance within which attacks land.
    pub engagement_range: Fixed,
    /// Activity on the last resolved order.
    pub state: ActivityState,
    /// Number of attacks this unit has resolved.
    pub actions: u32,
}

impl Unit {
    /// Whether the unit has no health left.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.health <= 0
    }
}

/// Parameters for spawning a unit.
///
/// Fields left `None` fall back to configured defaults.
#[derive(Debug, Clone, Default)]
pub struct UnitSpawnParams {
    /// Team tag.
    pub team: Team,
    /// Starting position.
    pub position: Vec2Fixed,
    /// Persistent goal. Defaults to the starting position.
    pub goal: Option<Vec2Fixed>,
    /// Engagement range. Defaults to the far tier.
    pub engagement_range: Option<Fixed>,
    /// Starting health. Defaults to the configured maximum.
    pub health: Option<i32>,
    /// Starting cooldown. Defaults to the configured attack cooldown.
    pub cooldown: Option<Fixed>,
}
