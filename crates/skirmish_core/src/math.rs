//! Fixed-point math utilities for deterministic simulation.
//!
//! All simulation state uses fixed-point arithmetic so that two runs fed
//! the same inputs produce bit-identical positions on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "decimal_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "decimal_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers written as plain decimals.
///
/// Config files and protocol output are read by humans, so values are
/// exchanged as `f64`. Conversion happens once at the boundary; nothing
/// inside the simulation touches floats.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).length_squared()
    }

    /// Squared magnitude.
    #[must_use]
    pub fn length_squared(self) -> Fixed {
        self.dot(self)
    }

    /// Magnitude.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Dot product of two vectors, saturating at the `Fixed` range.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Multiply both components by a scalar, saturating.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Check whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == Fixed::ZERO && self.y == Fixed::ZERO
    }

    /// Normalize vector using fixed-point math.
    ///
    /// The zero vector normalizes to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Shorten the vector to `max_len` if it is longer, keeping direction.
    #[must_use]
    pub fn clamp_length(self, max_len: Fixed) -> Self {
        if max_len <= Fixed::ZERO {
            return Self::ZERO;
        }
        if self.length_squared() <= max_len.saturating_mul(max_len) {
            return self;
        }
        self.normalize().scale(max_len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
///
/// 64 halvings of the search interval pin the result to the last
/// fractional bit for every value in range.
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        if mid == low {
            break;
        }
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_distance_squared_saturates_far_apart() {
        let near = Vec2Fixed::from_ints(400, 300);
        let far = Vec2Fixed::from_ints(100_000, 300);
        assert_eq!(near.distance_squared(far), Fixed::MAX);
        assert_eq!(far.scale(Fixed::from_num(1 << 20)).x, Fixed::MAX);
    }

    #[test]
    fn test_sqrt_exact_squares() {
        for n in [1, 4, 9, 256, 10_000, 1_000_000] {
            let root = fixed_sqrt(Fixed::from_num(n));
            let expected = Fixed::from_num((n as f64).sqrt());
            assert!(
                (root - expected).abs() < Fixed::from_num(0.0001),
                "sqrt({n}) = {root}"
            );
        }
        assert_eq!(fixed_sqrt(Fixed::ZERO), Fixed::ZERO);
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((norm.length_squared() - Fixed::ONE).abs() < epsilon);

        // 3/5 and 4/5
        assert!((norm.x - Fixed::from_num(0.6)).abs() < epsilon);
        assert!((norm.y - Fixed::from_num(0.8)).abs() < epsilon);

        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_clamp_length() {
        let v = Vec2Fixed::from_ints(30, 40);
        let clamped = v.clamp_length(Fixed::from_num(5));
        let epsilon = Fixed::from_num(0.001);
        assert!((clamped.length() - Fixed::from_num(5)).abs() < epsilon);

        // Short vectors pass through unchanged
        let short = Vec2Fixed::from_ints(1, 1);
        assert_eq!(short.clamp_length(Fixed::from_num(5)), short);

        // Zero cap stops everything
        assert_eq!(v.clamp_length(Fixed::ZERO), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }
}
