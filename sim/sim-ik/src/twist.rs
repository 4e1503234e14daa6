//! Tip twist: the Cartesian velocity a solve is asked to realize.

use nalgebra::{Vector3, Vector6};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Desired (or achieved) velocity of the chain tip, in the base frame.
///
/// This is the right-hand side of `J · q̇ = ẋ`. Stacked as
/// `[vx, vy, vz, wx, wy, wz]` wherever a 6-vector is needed, matching the
/// Jacobian row order. In position-only solves the angular half is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Tip translation rate, first three Jacobian rows.
    pub linear: Vector3<f64>,
    /// Tip rotation rate, last three Jacobian rows.
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Tip twist from its translational and rotational parts.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Hold the tip still.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Translate the tip without rotating it.
    #[must_use]
    pub fn linear(velocity: Vector3<f64>) -> Self {
        Self::new(velocity, Vector3::zeros())
    }

    /// Rotate the tip about its own origin.
    #[must_use]
    pub fn angular(rate: Vector3<f64>) -> Self {
        Self::new(Vector3::zeros(), rate)
    }

    /// Build from a stacked `[linear; angular]` vector.
    #[must_use]
    pub fn from_vector(v: &Vector6<f64>) -> Self {
        Self {
            linear: v.fixed_rows::<3>(0).into_owned(),
            angular: v.fixed_rows::<3>(3).into_owned(),
        }
    }

    /// Stack into `[linear; angular]`.
    #[must_use]
    pub fn to_vector(&self) -> Vector6<f64> {
        let mut v = Vector6::zeros();
        v.fixed_rows_mut::<3>(0).copy_from(&self.linear);
        v.fixed_rows_mut::<3>(3).copy_from(&self.angular);
        v
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().chain(self.angular.iter()).all(|c| c.is_finite())
    }
}

impl From<Vector6<f64>> for Twist {
    fn from(v: Vector6<f64>) -> Self {
        Self::from_vector(&v)
    }
}

impl From<Twist> for Vector6<f64> {
    fn from(t: Twist) -> Self {
        t.to_vector()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_stacking_order() {
        let t = Twist::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        let v = t.to_vector();
        assert_eq!(v, Vector6::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!(Twist::from_vector(&v), t);
    }

    #[test]
    fn test_constructors() {
        assert_eq!(Twist::default().to_vector(), Vector6::zeros());
        assert_eq!(Twist::angular(Vector3::z()).to_vector()[5], 1.0);
        assert_eq!(Twist::linear(Vector3::x()).to_vector()[0], 1.0);
    }

    #[test]
    fn test_is_finite() {
        assert!(Twist::zero().is_finite());
        let t = Twist::linear(Vector3::new(f64::NAN, 0.0, 0.0));
        assert!(!t.is_finite());
    }
}
