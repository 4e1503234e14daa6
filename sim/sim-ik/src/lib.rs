//! Velocity-level inverse kinematics for serial chains with mimic joints.
//!
//! Given the current configuration of a chain and a desired tip twist, the
//! solver returns the joint velocities that realize the twist as closely as
//! possible in the least-squares sense.
//!
//! Mimic joints (a gripper's second finger, a gear-coupled axis) are not free
//! variables: each one follows a master joint through
//! `q_mimic = multiplier · q_master + offset`. The solver works in the
//! reduced space of independent joints and rebuilds the mimic velocities
//! afterwards.
//!
//! - [`ChainGeometry`] - Source of the 6×N Jacobian ([`SerialChain`], [`ConstantJacobian`])
//! - [`MimicMap`] - Per-joint roles (independent or mimic)
//! - [`ReducedLayout`] - Jacobian reducer over the independent joints
//! - [`solve_truncated`] - Truncated SVD least-squares solve
//! - [`expand_velocities`] - Mimic velocity reconstruction
//! - [`MimicSvdSolver`] - The full pipeline
//!
//! # Singularities
//!
//! Singular values at or below [`VelocitySolverConfig::epsilon`] are dropped
//! from the pseudo-inverse. The solve still succeeds and reports
//! [`SolveStatus::NearSingular`]; only malformed input and a non-converging
//! SVD are errors ([`IkError`]).
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//!
//! - Motion planning and position-level IK loops
//! - Hardware control code
//! - Analysis tools
//!
//! # Example
//!
//! ```
//! use nalgebra::{Isometry3, Vector3};
//! use sim_ik::{
//!     ChainSegment, MimicMap, MimicSvdSolver, SerialChain, Twist, VelocityIkSolver,
//!     VelocitySolverConfig,
//! };
//!
//! // Planar arm with a mirrored two-finger gripper at the end.
//! let chain = SerialChain::new()
//!     .with_segment(ChainSegment::revolute("shoulder", Vector3::zeros(), Vector3::z()))
//!     .with_segment(ChainSegment::revolute("elbow", Vector3::x(), Vector3::z()))
//!     .with_segment(ChainSegment::prismatic("finger_l", Vector3::x(), Vector3::y()))
//!     .with_segment(ChainSegment::prismatic("finger_r", Vector3::zeros(), Vector3::y()))
//!     .with_tip(Isometry3::translation(0.1, 0.0, 0.0));
//!
//! let mimic = MimicMap::independent(4).with_mimic(3, 2, -1.0, 0.0);
//! let solver = MimicSvdSolver::new(&chain, mimic, VelocitySolverConfig::default()).unwrap();
//!
//! let q = [0.3, 0.6, 0.01, -0.01];
//! let solution = solver
//!     .solve(&q, &Twist::linear(Vector3::new(0.05, 0.0, 0.0)))
//!     .unwrap();
//!
//! assert_eq!(solution.velocities.len(), 4);
//! assert_eq!(solution.velocities[3], -solution.velocities[2]);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-ik/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod chain;
mod config;
mod error;
mod mimic;
mod reconstruct;
mod reduce;
mod solver;
mod svd;
mod twist;

pub use chain::{ChainGeometry, ChainSegment, ConstantJacobian, SegmentJoint, SerialChain};
pub use config::{VelocitySolverConfig, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS};
pub use error::IkError;
pub use mimic::{JointRole, MimicMap, MimicRelation};
pub use reconstruct::{expand_velocities, expand_velocities_into};
pub use reduce::{reduce_jacobian, ColumnContribution, ReducedJacobian, ReducedLayout};
pub use solver::{
    MimicSvdSolver, SolveReport, SolveStatus, SolveWeights, VelocityIkSolver, VelocitySolution,
};
pub use svd::{solve_truncated, TruncatedSolution};
pub use twist::Twist;

// Re-export math types used in the public API
pub use nalgebra::{DMatrix, DVector, Isometry3, Matrix6xX, Vector3, Vector6};

/// Result type for IK operations.
pub type Result<T> = std::result::Result<T, IkError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gripper_pipeline() {
        let col = Vector6::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let jac = Matrix6xX::from_columns(&[col, -col]);
        let map = MimicMap::independent(2).with_mimic(1, 0, -1.0, 0.0);

        let reduced = reduce_jacobian(&jac, &map).unwrap();
        assert_relative_eq!(reduced.matrix[(1, 0)], 2.0, epsilon = 1e-12);

        let twist = Twist::linear(Vector3::new(0.0, 1.0, 0.0)).to_vector();
        let rhs = DVector::from_column_slice(twist.as_slice());
        let sol = solve_truncated(&reduced.matrix, &rhs, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS)
            .unwrap();
        let layout = ReducedLayout::new(&map).unwrap();
        let full = expand_velocities(&layout, &sol.solution).unwrap();

        assert_relative_eq!(full[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(full[1], -0.5, epsilon = 1e-12);
    }
}
