//! Configuration for the velocity solver.
//!
//! The truncation threshold and the SVD iteration cap are exposed rather than
//! hard-coded. Neither default has a derivation behind it; they are the usual
//! values for chains expressed in meters and radians.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{IkError, Result};

/// Default singular-value truncation threshold.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Default cap on SVD sweeps.
pub const DEFAULT_MAX_ITERATIONS: usize = 150;

/// Configuration for [`MimicSvdSolver`](crate::MimicSvdSolver).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VelocitySolverConfig {
    /// Singular values at or below this are treated as zero in the
    /// pseudo-inverse (units of the Jacobian).
    pub epsilon: f64,
    /// Maximum number of iterations the SVD may take before giving up.
    pub max_iterations: usize,
    /// Only track the linear part of the twist (rows `vx, vy, vz`).
    pub position_only: bool,
}

impl Default for VelocitySolverConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            position_only: false,
        }
    }
}

impl VelocitySolverConfig {
    /// Tighter threshold and a generous iteration budget, for offline use.
    #[must_use]
    pub fn precise() -> Self {
        Self {
            epsilon: 1e-9,
            max_iterations: 500,
            ..Default::default()
        }
    }

    /// Coarser threshold and a small iteration budget, for tight control loops.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            epsilon: 1e-3,
            max_iterations: 30,
            ..Default::default()
        }
    }

    /// Set the truncation threshold.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the SVD iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Solve for the linear velocity only, ignoring the angular request.
    #[must_use]
    pub fn position_only(mut self) -> Self {
        self.position_only = true;
        self
    }

    /// Number of twist rows the solver tracks.
    #[must_use]
    pub fn task_rows(&self) -> usize {
        if self.position_only {
            3
        } else {
            6
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(IkError::invalid_config(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }

        // nalgebra reads a cap of zero as "unbounded".
        if self.max_iterations == 0 {
            return Err(IkError::invalid_config(
                "max_iterations must be at least 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_config() {
        let config = VelocitySolverConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.epsilon, 1e-5);
        assert_eq!(config.max_iterations, 150);
        assert!(!config.position_only);
        assert_eq!(config.task_rows(), 6);
    }

    #[test]
    fn test_config_presets() {
        let precise = VelocitySolverConfig::precise();
        assert!(precise.epsilon < DEFAULT_EPSILON);
        assert!(precise.max_iterations > DEFAULT_MAX_ITERATIONS);

        let fast = VelocitySolverConfig::fast();
        assert!(fast.epsilon > DEFAULT_EPSILON);
        assert!(fast.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = VelocitySolverConfig::default()
            .with_epsilon(1e-4)
            .with_max_iterations(20)
            .position_only();

        assert_relative_eq!(config.epsilon, 1e-4);
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.task_rows(), 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = VelocitySolverConfig::default();

        config.epsilon = -1.0;
        assert!(config.validate().is_err());

        config.epsilon = f64::NAN;
        assert!(config.validate().is_err());

        config.epsilon = 0.0;
        assert!(config.validate().is_ok());

        config.max_iterations = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, IkError::InvalidConfig { .. }));
    }
}
