//! 2D Vector
//!
//! Pixel-space vector used for positions, velocities and easing targets.
//! Screen convention: +X right, +Y down.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

/// 2D vector with `f32` components in world pixels.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component (pixels, grows to the right)
    pub x: f32,
    /// Y component (pixels, grows downward)
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared length (avoids the sqrt).
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Scale by a scalar.
    #[inline]
    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }

    /// Move a fraction `t` of the way toward `target`.
    ///
    /// Used for exponential smoothing (camera, boss segments, flyer easing).
    #[inline]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        Self::new(self.x + (target.x - self.x) * t, self.y + (target.y - self.y) * t)
    }

    /// Unit step of `speed` toward `target`, plus the remaining distance.
    pub fn step_toward(self, target: Self, speed: f32) -> (Self, f32) {
        let delta = target - self;
        let distance = delta.length();
        (delta.normalize().scale(speed), distance)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        self.scale(rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Debug for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vec2({:.2}, {:.2})", self.x, self.y)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_distance() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.length_squared(), 25.0);
        assert_eq!(Vec2::ZERO.distance(v), 5.0);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
        let n = Vec2::new(10.0, 0.0).normalize();
        assert_eq!(n, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_lerp_moves_fractionally() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, -50.0);
        let mid = a.lerp(b, 0.1);
        assert!((mid.x - 10.0).abs() < 1e-5);
        assert!((mid.y + 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_step_toward() {
        let (step, dist) = Vec2::ZERO.step_toward(Vec2::new(0.0, 20.0), 8.0);
        assert_eq!(dist, 20.0);
        assert!((step.y - 8.0).abs() < 1e-5);
        assert_eq!(step.x, 0.0);
    }

    #[test]
    fn test_operators() {
        let mut a = Vec2::new(1.0, 2.0);
        a += Vec2::new(1.0, 1.0);
        assert_eq!(a, Vec2::new(2.0, 3.0));
        assert_eq!(a - Vec2::new(2.0, 3.0), Vec2::ZERO);
        assert_eq!(-a, Vec2::new(-2.0, -3.0));
        assert_eq!(a * 2.0, Vec2::new(4.0, 6.0));
    }
}
