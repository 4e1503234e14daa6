//! Mimic-aware velocity IK solver.
//!
//! # Pipeline
//!
//! 1. The chain produces the full 6×N Jacobian for the configuration.
//! 2. Mimic columns are folded into their masters (6×K reduced Jacobian).
//! 3. The reduced system is solved with a truncated SVD pseudo-inverse.
//! 4. Mimic velocities are rebuilt from their masters.
//!
//! Truncating a direction is not an error: the least-squares velocity is
//! still returned, flagged with [`SolveStatus::NearSingular`]. The caller
//! (typically a position-level IK loop) decides what to do about it.
//!
//! # Weights
//!
//! [`MimicSvdSolver::solve_weighted`] solves the scaled system
//!
//! ```text
//! q̇ = W_q · (W_x · J_red · W_q)⁺ · W_x · ẋ
//! ```
//!
//! where `W_x` weights twist rows and `W_q` weights independent joints. A
//! zero joint weight freezes that joint and counts as a truncated direction.

use nalgebra::{DMatrix, DVector, Matrix6xX, Vector6};

use crate::{
    reconstruct::expand_velocities_into, svd::solve_truncated, ChainGeometry, IkError, MimicMap,
    ReducedLayout, Result, Twist, VelocitySolverConfig,
};

/// Outcome of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Every singular value was above the threshold.
    Success,
    /// Some directions were dropped; the twist is only tracked approximately.
    NearSingular {
        /// Number of singular values at or below the threshold.
        truncated: usize,
    },
}

impl SolveStatus {
    /// Check if the solve was near-singular.
    #[must_use]
    pub const fn is_near_singular(self) -> bool {
        matches!(self, Self::NearSingular { .. })
    }
}

/// Diagnostics of a solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    /// Success or near-singular.
    pub status: SolveStatus,
    /// Singular values of the (weighted) reduced Jacobian, descending.
    pub singular_values: DVector<f64>,
    /// Smallest singular value that was inverted.
    pub smallest_retained: Option<f64>,
    /// Norm of `J · q̇ − ẋ` over the tracked rows.
    pub residual: f64,
}

/// Joint velocities together with their diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocitySolution {
    /// One velocity per chain joint (N).
    pub velocities: DVector<f64>,
    /// Diagnostics.
    pub report: SolveReport,
}

impl VelocitySolution {
    /// Shorthand for `report.status`.
    #[must_use]
    pub fn status(&self) -> SolveStatus {
        self.report.status
    }
}

/// Row and column weights for [`MimicSvdSolver::solve_weighted`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolveWeights {
    /// One weight per independent joint (K), in chain order.
    pub joint: DVector<f64>,
    /// One weight per twist row `[vx, vy, vz, wx, wy, wz]`.
    pub cartesian: Vector6<f64>,
}

impl SolveWeights {
    /// Unit weights for `independent_joints` joints.
    #[must_use]
    pub fn uniform(independent_joints: usize) -> Self {
        Self {
            joint: DVector::from_element(independent_joints, 1.0),
            cartesian: Vector6::repeat(1.0),
        }
    }

    /// Set the joint weights.
    #[must_use]
    pub fn with_joint(mut self, joint: DVector<f64>) -> Self {
        self.joint = joint;
        self
    }

    /// Set the twist row weights.
    #[must_use]
    pub fn with_cartesian(mut self, cartesian: Vector6<f64>) -> Self {
        self.cartesian = cartesian;
        self
    }

    fn validate(&self, independent_joints: usize) -> Result<()> {
        if self.joint.len() != independent_joints {
            return Err(IkError::dimension(
                "joint weights",
                independent_joints,
                self.joint.len(),
            ));
        }
        let all = self.joint.iter().chain(self.cartesian.iter());
        if all.copied().any(|w| !w.is_finite() || w < 0.0) {
            return Err(IkError::invalid_config(
                "weights must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// A velocity IK solver over a chain's independent joints.
pub trait VelocityIkSolver {
    /// Number of chain joints (N).
    fn joint_count(&self) -> usize;

    /// Joint velocities realizing `twist` at `positions` as closely as possible.
    fn solve(&self, positions: &[f64], twist: &Twist) -> Result<VelocitySolution>;
}

/// Truncated-SVD velocity solver aware of mimic joints.
///
/// Borrows the chain; owns the mimic map and the reduced layout derived from
/// it. Solving takes `&self` and keeps no state between calls.
///
/// # Example
///
/// ```
/// use nalgebra::{Matrix6xX, Vector3, Vector6};
/// use sim_ik::{ConstantJacobian, MimicMap, MimicSvdSolver, Twist, VelocityIkSolver};
///
/// let col = Vector6::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
/// let chain = ConstantJacobian::new(Matrix6xX::from_columns(&[col, col]));
/// let mimic = MimicMap::independent(2).with_mimic(1, 0, 2.0, 0.0);
///
/// let solver = MimicSvdSolver::new(&chain, mimic, Default::default()).unwrap();
/// let solution = solver
///     .solve(&[0.0, 0.0], &Twist::angular(Vector3::new(0.0, 0.0, 3.0)))
///     .unwrap();
///
/// assert!((solution.velocities[0] - 1.0).abs() < 1e-9);
/// assert!((solution.velocities[1] - 2.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct MimicSvdSolver<'c, C: ChainGeometry + ?Sized> {
    chain: &'c C,
    mimic: MimicMap,
    layout: ReducedLayout,
    config: VelocitySolverConfig,
}

impl<'c, C: ChainGeometry + ?Sized> MimicSvdSolver<'c, C> {
    /// Create a solver for `chain`.
    ///
    /// # Errors
    ///
    /// - [`IkError::InvalidConfig`] for an invalid configuration.
    /// - [`IkError::DimensionMismatch`] if the map does not cover every joint.
    /// - [`IkError::InvalidMimicMap`] if the map is malformed.
    pub fn new(chain: &'c C, mimic: MimicMap, config: VelocitySolverConfig) -> Result<Self> {
        config.validate()?;
        let layout = Self::layout_for(chain, &mimic)?;
        Ok(Self {
            chain,
            mimic,
            layout,
            config,
        })
    }

    /// Create a solver for a chain without mimic joints.
    pub fn without_mimics(chain: &'c C, config: VelocitySolverConfig) -> Result<Self> {
        Self::new(chain, MimicMap::independent(chain.joint_count()), config)
    }

    fn layout_for(chain: &C, mimic: &MimicMap) -> Result<ReducedLayout> {
        if mimic.len() != chain.joint_count() {
            return Err(IkError::dimension(
                "mimic map",
                chain.joint_count(),
                mimic.len(),
            ));
        }
        ReducedLayout::new(mimic)
    }

    /// Replace the mimic map.
    ///
    /// On error the previous map stays in effect.
    pub fn set_mimic_map(&mut self, mimic: MimicMap) -> Result<()> {
        self.layout = Self::layout_for(self.chain, &mimic)?;
        self.mimic = mimic;
        Ok(())
    }

    /// The mimic map in use.
    #[must_use]
    pub fn mimic_map(&self) -> &MimicMap {
        &self.mimic
    }

    /// The reduced layout derived from the mimic map.
    #[must_use]
    pub fn layout(&self) -> &ReducedLayout {
        &self.layout
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &VelocitySolverConfig {
        &self.config
    }

    /// Number of independent joints (K).
    #[must_use]
    pub fn independent_count(&self) -> usize {
        self.layout.reduced_count()
    }

    /// Solve with per-joint and per-row weights.
    pub fn solve_weighted(
        &self,
        positions: &[f64],
        twist: &Twist,
        weights: &SolveWeights,
    ) -> Result<VelocitySolution> {
        let jacobian = self.jacobian_at(positions)?;
        self.solve_jacobian_weighted(&jacobian, twist, weights)
    }

    /// Solve into a caller-owned buffer of length N.
    ///
    /// The buffer is left untouched on error.
    pub fn solve_into(
        &self,
        positions: &[f64],
        twist: &Twist,
        out: &mut DVector<f64>,
    ) -> Result<SolveReport> {
        if out.len() != self.layout.joint_count() {
            return Err(IkError::dimension(
                "velocity output",
                self.layout.joint_count(),
                out.len(),
            ));
        }
        let jacobian = self.jacobian_at(positions)?;
        let weights = SolveWeights::uniform(self.independent_count());
        self.solve_core(&jacobian, twist, &weights, out)
    }

    /// Solve against a Jacobian the caller already has.
    ///
    /// The chain is only consulted for its joint count.
    pub fn solve_with_jacobian(
        &self,
        jacobian: &Matrix6xX<f64>,
        twist: &Twist,
    ) -> Result<VelocitySolution> {
        let weights = SolveWeights::uniform(self.independent_count());
        self.solve_jacobian_weighted(jacobian, twist, &weights)
    }

    /// Weighted solve against a caller-supplied Jacobian.
    pub fn solve_jacobian_weighted(
        &self,
        jacobian: &Matrix6xX<f64>,
        twist: &Twist,
        weights: &SolveWeights,
    ) -> Result<VelocitySolution> {
        let mut velocities = DVector::zeros(self.layout.joint_count());
        let report = self.solve_core(jacobian, twist, weights, &mut velocities)?;
        Ok(VelocitySolution { velocities, report })
    }

    fn jacobian_at(&self, positions: &[f64]) -> Result<Matrix6xX<f64>> {
        if positions.len() != self.layout.joint_count() {
            return Err(IkError::dimension(
                "joint positions",
                self.layout.joint_count(),
                positions.len(),
            ));
        }
        self.chain.jacobian(positions)
    }

    fn solve_core(
        &self,
        jacobian: &Matrix6xX<f64>,
        twist: &Twist,
        weights: &SolveWeights,
        out: &mut DVector<f64>,
    ) -> Result<SolveReport> {
        if !twist.is_finite() {
            return Err(IkError::non_finite("twist"));
        }
        weights.validate(self.independent_count())?;
        let reduced = self.layout.reduce(jacobian)?;
        if !jacobian.iter().all(|x| x.is_finite()) {
            return Err(IkError::non_finite("jacobian"));
        }

        let task_rows = self.config.task_rows();
        let target = twist.to_vector();
        let (weighted, rhs) = weighted_system(&reduced, &target, weights, task_rows);

        tracing::trace!(
            joints = self.layout.joint_count(),
            independent = self.independent_count(),
            task_rows,
            "solving velocity IK"
        );

        let solution = solve_truncated(
            &weighted,
            &rhs,
            self.config.epsilon,
            self.config.max_iterations,
        )?;

        let reduced_velocities = solution.solution.component_mul(&weights.joint);
        expand_velocities_into(&self.layout, &reduced_velocities, out)?;

        let achieved: Vector6<f64> = jacobian * &*out;
        let residual = (achieved - target).rows(0, task_rows).norm();

        let status = if solution.is_near_singular() {
            tracing::debug!(
                truncated = solution.truncated,
                smallest_singular = solution.singular_values.min(),
                epsilon = self.config.epsilon,
                residual,
                "velocity IK near singular"
            );
            SolveStatus::NearSingular {
                truncated: solution.truncated,
            }
        } else {
            SolveStatus::Success
        };

        Ok(SolveReport {
            status,
            singular_values: solution.singular_values,
            smallest_retained: solution.smallest_retained,
            residual,
        })
    }
}

impl<C: ChainGeometry + ?Sized> VelocityIkSolver for MimicSvdSolver<'_, C> {
    fn joint_count(&self) -> usize {
        self.layout.joint_count()
    }

    fn solve(&self, positions: &[f64], twist: &Twist) -> Result<VelocitySolution> {
        let weights = SolveWeights::uniform(self.independent_count());
        self.solve_weighted(positions, twist, &weights)
    }
}

/// Scale the tracked rows of the reduced system by the weights.
fn weighted_system(
    reduced: &DMatrix<f64>,
    target: &Vector6<f64>,
    weights: &SolveWeights,
    task_rows: usize,
) -> (DMatrix<f64>, DVector<f64>) {
    let cols = reduced.ncols();
    let matrix = DMatrix::from_fn(task_rows, cols, |r, c| {
        weights.cartesian[r] * reduced[(r, c)] * weights.joint[c]
    });
    let rhs = DVector::from_fn(task_rows, |r, _| weights.cartesian[r] * target[r]);
    (matrix, rhs)
}
