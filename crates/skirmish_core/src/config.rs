//! Simulation configuration.
//!
//! Pure data: fixed at construction, no runtime reconfiguration. File
//! loading lives in the headless crate; this module only defines the
//! structure, its defaults and validation.
//!
//! # Example RON
//!
//! ```ron
//! SimConfig(
//!     tick_duration: 0.1,
//!     field: (width: 800.0, height: 600.0),
//!     wave_size: 6,
//!     ticks_per_oracle_step: 3,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{decimal_serde, Fixed, Vec2Fixed};
use crate::units::Team;

/// Largest accepted field side, detection radius or range.
///
/// Squared distances across a field this size stay well inside the
/// `I32F32` integer range.
pub const MAX_EXTENT: i32 = 16_384;

/// Dimensions of the bounded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Width in world units.
    #[serde(with = "decimal_serde")]
    pub width: Fixed,
    /// Height in world units.
    #[serde(with = "decimal_serde")]
    pub height: Fixed,
}

impl FieldConfig {
    /// Centre of the field.
    #[must_use]
    pub fn center(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.width / Fixed::from_num(2), self.height / Fixed::from_num(2))
    }

    /// Far corner of the field (the near corner is the origin).
    #[must_use]
    pub fn far_corner(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.width, self.height)
    }

    /// Whether `point` lies on the field, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        (Fixed::ZERO..=self.width).contains(&point.x) && (Fixed::ZERO..=self.height).contains(&point.y)
    }

    /// Nearest point of the field to `point`.
    #[must_use]
    pub fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            point.x.clamp(Fixed::ZERO, self.width),
            point.y.clamp(Fixed::ZERO, self.height),
        )
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: Fixed::from_num(800),
            height: Fixed::from_num(600),
        }
    }
}

/// Parameters handed to the reference avoidance oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceConfig {
    /// Integration time step of one oracle step, in seconds.
    #[serde(with = "decimal_serde")]
    pub time_step: Fixed,
    /// Agents further apart than this never influence each other.
    #[serde(with = "decimal_serde")]
    pub neighbor_dist: Fixed,
    /// Maximum neighbours considered per agent.
    pub max_neighbors: usize,
    /// Keep agents inside the field.
    pub enforce_bounds: bool,
}

impl Default for AvoidanceConfig {
    fn default() -> Self {
        Self {
            time_step: Fixed::from_num(0.099),
            neighbor_dist: Fixed::from_num(100),
            max_neighbors: 100,
            enforce_bounds: true,
        }
    }
}

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Elapsed simulated time per [`tick`](crate::simulation::Simulation::tick), in seconds.
    #[serde(with = "decimal_serde")]
    pub tick_duration: Fixed,
    /// Field dimensions.
    pub field: FieldConfig,
    /// Enemies strictly closer than this are engaged.
    #[serde(with = "decimal_serde")]
    pub detection_radius: Fixed,
    /// Short engagement tier, given to wave members at or past the tier threshold.
    #[serde(with = "decimal_serde")]
    pub near_range: Fixed,
    /// Long engagement tier, given to the first wave members.
    #[serde(with = "decimal_serde")]
    pub far_range: Fixed,
    /// Wave index at which spawns switch from the far to the near tier.
    pub range_tier_threshold: u32,
    /// Speed of every move order, in world units per second.
    #[serde(with = "decimal_serde")]
    pub move_speed: Fixed,
    /// Avoidance footprint radius of every unit.
    #[serde(with = "decimal_serde")]
    pub unit_radius: Fixed,
    /// Starting health.
    pub max_health: i32,
    /// Health removed by one resolved attack.
    pub attack_damage: i32,
    /// Recovery lock after an attack, in seconds.
    #[serde(with = "decimal_serde")]
    pub attack_cooldown: Fixed,
    /// Units spawned per team per wave.
    pub wave_size: u32,
    /// Simulated milliseconds between wave boundaries.
    pub wave_interval_ms: u64,
    /// Logic ticks per oracle integration step.
    pub ticks_per_oracle_step: u64,
    /// Move orders closer than this to their destination request zero velocity.
    #[serde(with = "decimal_serde")]
    pub arrival_epsilon: Fixed,
    /// Velocities shorter than this render without a facing line.
    #[serde(with = "decimal_serde")]
    pub facing_epsilon: Fixed,
    /// Team of the protected unit.
    pub protected_team: Team,
    /// Reference oracle parameters.
    pub avoidance: AvoidanceConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        let unit_radius = Fixed::from_num(16);
        Self {
            tick_duration: Fixed::from_num(0.1),
            field: FieldConfig::default(),
            detection_radius: Fixed::from_num(300),
            near_range: unit_radius / Fixed::from_num(2),
            far_range: unit_radius / Fixed::from_num(2),
            range_tier_threshold: 3,
            move_speed: Fixed::from_num(100),
            unit_radius,
            max_health: 100,
            attack_damage: 1,
            attack_cooldown: Fixed::ONE,
            wave_size: 6,
            wave_interval_ms: 10_000,
            ticks_per_oracle_step: 3,
            arrival_epsilon: Fixed::from_num(0.1),
            facing_epsilon: Fixed::from_num(0.001),
            protected_team: Team::Blue,
            avoidance: AvoidanceConfig::default(),
        }
    }
}

impl SimConfig {
    /// Distance under which an attack lands for a unit with `engagement_range`.
    #[must_use]
    pub fn strike_distance(&self, engagement_range: Fixed) -> Fixed {
        engagement_range + self.unit_radius * Fixed::from_num(2)
    }

    /// Tick duration rounded to whole milliseconds.
    #[must_use]
    pub fn tick_duration_ms(&self) -> u64 {
        duration_to_ms(self.tick_duration)
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SimError::InvalidConfig(msg.to_string()));

        if self.tick_duration <= Fixed::ZERO {
            return invalid("tick_duration must be positive");
        }
        if self.ticks_per_oracle_step == 0 {
            return invalid("ticks_per_oracle_step must be at least 1");
        }
        if self.wave_interval_ms == 0 {
            return invalid("wave_interval_ms must be positive");
        }
        if self.unit_radius <= Fixed::ZERO {
            return invalid("unit_radius must be positive");
        }
        if self.move_speed < Fixed::ZERO {
            return invalid("move_speed must not be negative");
        }
        if self.near_range < Fixed::ZERO || self.far_range < Fixed::ZERO {
            return invalid("engagement ranges must not be negative");
        }
        if self.detection_radius <= Fixed::ZERO {
            return invalid("detection_radius must be positive");
        }
        if self.attack_cooldown < Fixed::ZERO {
            return invalid("attack_cooldown must not be negative");
        }
        if self.max_health <= 0 {
            return invalid("max_health must be positive");
        }
        if self.attack_damage < 0 {
            return invalid("attack_damage must not be negative");
        }
        let span = self.unit_radius * Fixed::from_num(2);
        if self.field.width < span || self.field.height < span {
            return invalid("field must fit at least one unit");
        }
        let max = Fixed::from_num(MAX_EXTENT);
        if self.field.width > max || self.field.height > max {
            return invalid("field sides must not exceed MAX_EXTENT");
        }
        let lengths = [
            self.detection_radius,
            self.near_range,
            self.far_range,
            self.unit_radius,
            self.move_speed,
            self.avoidance.neighbor_dist,
        ];
        if lengths.iter().any(|&l| l > max) {
            return invalid("radii, ranges and speeds must not exceed MAX_EXTENT");
        }
        if self.avoidance.time_step <= Fixed::ZERO {
            return invalid("avoidance.time_step must be positive");
        }
        Ok(())
    }
}

/// Convert a duration in seconds to whole milliseconds, rounding to nearest.
///
/// Negative durations clamp to zero.
#[must_use]
pub fn duration_to_ms(seconds: Fixed) -> u64 {
    if seconds <= Fixed::ZERO {
        return 0;
    }
    let ms = seconds.saturating_mul(Fixed::from_num(1000)).round();
    ms.to_num::<u64>()
}
