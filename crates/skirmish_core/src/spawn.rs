//! Wave spawn policy.
//!
//! Waves fire on simulated-time boundaries: the very first millisecond, and
//! every multiple of the wave interval. Detection compares the counter
//! before and after each advance, so a boundary fires exactly once however
//! coarse the tick is.

use crate::config::SimConfig;
use crate::math::{Fixed, Vec2Fixed};
use crate::units::{Team, UnitSpawnParams};

/// Millisecond counter that reports wave boundaries as they are crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaveClock {
    elapsed_ms: u64,
    interval_ms: u64,
}

impl WaveClock {
    /// Start at zero elapsed time.
    ///
    /// An interval of zero is treated as one millisecond.
    #[must_use]
    pub fn new(interval_ms: u64) -> Self {
        Self {
            elapsed_ms: 0,
            interval_ms: interval_ms.max(1),
        }
    }

    /// Simulated milliseconds so far.
    #[must_use]
    pub const fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Advance by `delta_ms` and return how many boundaries were crossed.
    pub fn advance(&mut self, delta_ms: u64) -> u64 {
        let before = self.elapsed_ms;
        let after = before.saturating_add(delta_ms);
        self.elapsed_ms = after;

        let first = u64::from(before == 0 && after > 0);
        let multiples = after / self.interval_ms - before / self.interval_ms;
        first + multiples
    }
}

/// Engagement range for the `wave_index`-th member of a wave.
///
/// The first members get the far tier, the rest the near tier.
#[must_use]
pub fn range_tier(config: &SimConfig, wave_index: u32) -> Fixed {
    if wave_index >= config.range_tier_threshold {
        config.near_range
    } else {
        config.far_range
    }
}

/// Starting position of the `wave_index`-th member of `team`'s wave.
///
/// Members stand on the diagonal out of their team's corner, one unit
/// diameter apart.
#[must_use]
pub fn wave_position(config: &SimConfig, team: Team, wave_index: u32) -> Vec2Fixed {
    let r = config.unit_radius;
    let offset = Fixed::from_num(wave_index) * r * Fixed::from_num(2) + r;
    match team {
        Team::Blue => Vec2Fixed::new(offset, offset),
        Team::Green => Vec2Fixed::new(config.field.width - offset, config.field.height - offset),
    }
}

/// Goal of every wave member of `team`: the opposing corner.
#[must_use]
pub fn wave_goal(config: &SimConfig, team: Team) -> Vec2Fixed {
    match team {
        Team::Blue => config.field.far_corner(),
        Team::Green => Vec2Fixed::ZERO,
    }
}

/// Spawn parameters for one wave member.
#[must_use]
pub fn wave_member(config: &SimConfig, team: Team, wave_index: u32) -> UnitSpawnParams {
    UnitSpawnParams {
        team,
        position: wave_position(config, team, wave_index),
        goal: Some(wave_goal(config, team)),
        engagement_range: Some(range_tier(config, wave_index)),
        health: Some(config.max_health),
        cooldown: Some(config.attack_cooldown),
    }
}

/// Spawn order of one full wave of `wave_size` per team: slot-major, team-minor.
pub fn wave_roster(wave_size: u32) -> impl Iterator<Item = (Team, u32)> {
    (0..wave_size).flat_map(|index| Team::ALL.into_iter().map(move |team| (team, index)))
}
