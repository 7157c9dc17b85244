//! Render sink contract.
//!
//! The core never draws. After a tick the driver captures one
//! [`UnitFrame`] per live unit and hands the batch to a [`FrameSink`].
//! Presenting may block for display pacing; nothing in the simulation
//! waits on it.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{Team, Unit, UnitId};

/// Renderable snapshot of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFrame {
    /// Unit identifier.
    pub id: UnitId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Team tag.
    pub team: Team,
    /// Remaining health.
    pub health: i32,
    /// Attacks resolved so far.
    pub actions: u32,
    /// Point one unit radius ahead along the current velocity.
    pub facing: Vec2Fixed,
    /// Set for the protected unit.
    pub highlighted: bool,
    /// Engagement range is above the near tier.
    pub long_range: bool,
}

impl UnitFrame {
    /// Capture `unit` given the velocity its oracle slot reports.
    #[must_use]
    pub fn capture(unit: &Unit, velocity: Vec2Fixed, config: &SimConfig, protected: UnitId) -> Self {
        Self {
            id: unit.id,
            position: unit.position,
            team: unit.team,
            health: unit.health,
            actions: unit.actions,
            facing: facing_point(
                unit.position,
                velocity,
                config.unit_radius,
                config.facing_epsilon,
            ),
            highlighted: unit.id == protected,
            long_range: unit.engagement_range > config.near_range,
        }
    }
}

/// Forward-direction point for a unit at `position` moving at `velocity`.
///
/// Velocities shorter than `epsilon` give `position` itself.
#[must_use]
pub fn facing_point(position: Vec2Fixed, velocity: Vec2Fixed, radius: Fixed, epsilon: Fixed) -> Vec2Fixed {
    let length = velocity.length();
    if length < epsilon {
        return position;
    }
    position + velocity.scale(radius / length)
}

/// Consumer of rendered frames.
pub trait FrameSink {
    /// Error raised while presenting.
    type Error;

    /// Present the units live after `tick`, in ascending ID order.
    fn present(&mut self, tick: u64, frame: &[UnitFrame]) -> Result<(), Self::Error>;
}

impl FrameSink for Vec<(u64, Vec<UnitFrame>)> {
    type Error = std::convert::Infallible;

    fn present(&mut self, tick: u64, frame: &[UnitFrame]) -> Result<(), Self::Error> {
        self.push((tick, frame.to_vec()));
        Ok(())
    }
}
