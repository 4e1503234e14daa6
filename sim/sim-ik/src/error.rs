//! Error types for velocity IK.

use thiserror::Error;

/// Errors that can occur while solving for joint velocities.
///
/// These are hard failures: no velocity is returned alongside them. A
/// near-singular configuration is not an error, see
/// [`SolveStatus::NearSingular`](crate::SolveStatus::NearSingular).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IkError {
    /// The mimic map is malformed for the given joint.
    #[error("invalid mimic map at joint {joint}: {reason}")]
    InvalidMimicMap {
        /// Index of the offending joint.
        joint: usize,
        /// Description of what is wrong.
        reason: String,
    },

    /// An input or output buffer has the wrong size for the chain.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which quantity disagreed.
        what: &'static str,
        /// Size implied by the chain.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },

    /// The SVD did not converge within the configured iteration cap.
    #[error("SVD did not converge within {max_iterations} iterations")]
    IterationLimitExceeded {
        /// The iteration cap that was hit.
        max_iterations: usize,
    },

    /// An input contains NaN or infinite entries.
    #[error("non-finite values in {what}")]
    NonFinite {
        /// Which input was rejected.
        what: &'static str,
    },

    /// Invalid solver configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },

    /// The decomposition finished but did not produce the requested factors.
    #[error("decomposition failed: {reason}")]
    Decomposition {
        /// Description of what went wrong.
        reason: String,
    },
}

impl IkError {
    /// Create an invalid mimic map error.
    #[must_use]
    pub fn invalid_mimic(joint: usize, reason: impl Into<String>) -> Self {
        Self::InvalidMimicMap {
            joint,
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Create a non-finite input error.
    #[must_use]
    pub fn non_finite(what: &'static str) -> Self {
        Self::NonFinite { what }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a decomposition error.
    #[must_use]
    pub fn decomposition(reason: impl Into<String>) -> Self {
        Self::Decomposition {
            reason: reason.into(),
        }
    }

    /// Check if this is a mimic map error.
    #[must_use]
    pub fn is_mimic_error(&self) -> bool {
        matches!(self, Self::InvalidMimicMap { .. })
    }

    /// Check if this is a dimension mismatch.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    /// Check if the SVD ran out of iterations.
    #[must_use]
    pub fn is_iteration_limit(&self) -> bool {
        matches!(self, Self::IterationLimitExceeded { .. })
    }

    /// Check if an input was rejected for NaN or infinite entries.
    #[must_use]
    pub fn is_non_finite(&self) -> bool {
        matches!(self, Self::NonFinite { .. })
    }
}
