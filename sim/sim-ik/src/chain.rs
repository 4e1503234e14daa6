//! Chain geometry: forward kinematics and the geometric Jacobian.
//!
//! The solver only needs something that can produce a 6×N Jacobian for a
//! configuration, expressed by [`ChainGeometry`]. [`SerialChain`] is a small
//! implementation for chains of revolute and prismatic joints;
//! [`ConstantJacobian`] wraps a Jacobian computed elsewhere.
//!
//! # Conventions
//!
//! - Jacobian rows are `[vx, vy, vz, wx, wy, wz]`, in the base frame.
//! - The reference point for the linear rows is the chain tip.
//! - Each segment applies its fixed `origin` transform first, then the joint
//!   motion about (or along) an axis given in the joint frame.
//!
//! | Joint     | linear column       | angular column |
//! |-----------|---------------------|----------------|
//! | Revolute  | `a × (p_tip − p_j)` | `a`            |
//! | Prismatic | `a`                 | `0`            |
//! | Fixed     | no column           | no column      |

use nalgebra::{Isometry3, Matrix6xX, Translation3, Unit, UnitQuaternion, Vector3};

use crate::{IkError, Result};

/// Source of the full Jacobian for a configuration.
pub trait ChainGeometry {
    /// Number of actuated joints (N).
    fn joint_count(&self) -> usize;

    /// The 6×N geometric Jacobian at `positions`.
    ///
    /// # Errors
    ///
    /// [`IkError::DimensionMismatch`] if `positions.len() != joint_count()`.
    fn jacobian(&self, positions: &[f64]) -> Result<Matrix6xX<f64>>;
}

/// Motion allowed by a segment's joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentJoint {
    /// Rigid connection, contributes no column.
    Fixed,
    /// Rotation about an axis in the joint frame.
    Revolute(Unit<Vector3<f64>>),
    /// Translation along an axis in the joint frame.
    Prismatic(Unit<Vector3<f64>>),
}

impl SegmentJoint {
    /// Whether this joint has a degree of freedom.
    #[must_use]
    pub const fn is_actuated(&self) -> bool {
        !matches!(self, Self::Fixed)
    }

    fn motion(&self, q: f64) -> Isometry3<f64> {
        match self {
            Self::Fixed => Isometry3::identity(),
            Self::Revolute(axis) => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(axis, q),
            ),
            Self::Prismatic(axis) => Isometry3::from_parts(
                Translation3::from(axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
        }
    }
}

/// One link of a serial chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSegment {
    /// Segment name, for diagnostics.
    pub name: String,
    /// Joint at the start of the segment.
    pub joint: SegmentJoint,
    /// Transform from the previous frame to this joint's frame.
    pub origin: Isometry3<f64>,
}

impl ChainSegment {
    /// Create a segment.
    #[must_use]
    pub fn new(name: impl Into<String>, joint: SegmentJoint, origin: Isometry3<f64>) -> Self {
        Self {
            name: name.into(),
            joint,
            origin,
        }
    }

    /// A revolute segment offset by `translation` from the previous frame.
    #[must_use]
    pub fn revolute(
        name: impl Into<String>,
        translation: Vector3<f64>,
        axis: Vector3<f64>,
    ) -> Self {
        Self::new(
            name,
            SegmentJoint::Revolute(Unit::new_normalize(axis)),
            Isometry3::translation(translation.x, translation.y, translation.z),
        )
    }

    /// A prismatic segment offset by `translation` from the previous frame.
    #[must_use]
    pub fn prismatic(
        name: impl Into<String>,
        translation: Vector3<f64>,
        axis: Vector3<f64>,
    ) -> Self {
        Self::new(
            name,
            SegmentJoint::Prismatic(Unit::new_normalize(axis)),
            Isometry3::translation(translation.x, translation.y, translation.z),
        )
    }

    /// A rigid segment offset by `origin` from the previous frame.
    #[must_use]
    pub fn fixed(name: impl Into<String>, origin: Isometry3<f64>) -> Self {
        Self::new(name, SegmentJoint::Fixed, origin)
    }
}

/// A serial chain from base to tip.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialChain {
    segments: Vec<ChainSegment>,
    tip: Isometry3<f64>,
}

impl Default for SerialChain {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialChain {
    /// Create an empty chain with the tip at the base.
    #[must_use]
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            tip: Isometry3::identity(),
        }
    }

    /// Append a segment.
    #[must_use]
    pub fn with_segment(mut self, segment: ChainSegment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Set the tip offset from the last segment's frame.
    #[must_use]
    pub fn with_tip(mut self, tip: Isometry3<f64>) -> Self {
        self.tip = tip;
        self
    }

    /// The segments, base first.
    #[must_use]
    pub fn segments(&self) -> &[ChainSegment] {
        &self.segments
    }

    /// Names of the actuated joints, in Jacobian column order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments
            .iter()
            .filter(|s| s.joint.is_actuated())
            .map(|s| s.name.as_str())
    }

    /// Pose of the tip in the base frame.
    pub fn forward_kinematics(&self, positions: &[f64]) -> Result<Isometry3<f64>> {
        self.check_positions(positions)?;
        let mut frame = Isometry3::identity();
        let mut q = positions.iter();
        for segment in &self.segments {
            frame *= segment.origin;
            if segment.joint.is_actuated() {
                let qi = q.next().copied().unwrap_or_default();
                frame *= segment.joint.motion(qi);
            }
        }
        Ok(frame * self.tip)
    }

    fn check_positions(&self, positions: &[f64]) -> Result<()> {
        let n = self.joint_count();
        if positions.len() == n {
            Ok(())
        } else {
            Err(IkError::dimension("joint positions", n, positions.len()))
        }
    }
}

impl ChainGeometry for SerialChain {
    fn joint_count(&self) -> usize {
        self.segments.iter().filter(|s| s.joint.is_actuated()).count()
    }

    fn jacobian(&self, positions: &[f64]) -> Result<Matrix6xX<f64>> {
        self.check_positions(positions)?;

        // World-frame axis and anchor of every actuated joint.
        let mut axes = Vec::with_capacity(positions.len());
        let mut frame = Isometry3::identity();
        let mut q = positions.iter();
        for segment in &self.segments {
            frame *= segment.origin;
            if segment.joint.is_actuated() {
                axes.push((segment.joint, frame));
                let qi = q.next().copied().unwrap_or_default();
                frame *= segment.joint.motion(qi);
            }
        }
        let tip = (frame * self.tip).translation.vector;

        let mut jac = Matrix6xX::zeros(axes.len());
        for (col, (joint, joint_frame)) in axes.iter().enumerate() {
            match joint {
                SegmentJoint::Revolute(axis) => {
                    let a = joint_frame.rotation * axis.into_inner();
                    let r = tip - joint_frame.translation.vector;
                    let linear = a.cross(&r);
                    for k in 0..3 {
                        jac[(k, col)] = linear[k];
                        jac[(k + 3, col)] = a[k];
                    }
                }
                SegmentJoint::Prismatic(axis) => {
                    let a = joint_frame.rotation * axis.into_inner();
                    for k in 0..3 {
                        jac[(k, col)] = a[k];
                    }
                }
                SegmentJoint::Fixed => {}
            }
        }
        Ok(jac)
    }
}

/// A chain whose Jacobian is supplied directly and does not change with the
/// configuration.
///
/// Useful when the Jacobian comes from an external kinematics library, and for
/// locally linear models.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantJacobian {
    jacobian: Matrix6xX<f64>,
}

impl ConstantJacobian {
    /// Wrap a 6×N Jacobian.
    #[must_use]
    pub fn new(jacobian: Matrix6xX<f64>) -> Self {
        Self { jacobian }
    }

    /// Replace the stored Jacobian, keeping the joint count.
    pub fn update(&mut self, jacobian: Matrix6xX<f64>) -> Result<()> {
        if jacobian.ncols() != self.jacobian.ncols() {
            return Err(IkError::dimension(
                "jacobian columns",
                self.jacobian.ncols(),
                jacobian.ncols(),
            ));
        }
        self.jacobian = jacobian;
        Ok(())
    }
}

impl ChainGeometry for ConstantJacobian {
    fn joint_count(&self) -> usize {
        self.jacobian.ncols()
    }

    fn jacobian(&self, positions: &[f64]) -> Result<Matrix6xX<f64>> {
        if positions.len() != self.jacobian.ncols() {
            return Err(IkError::dimension(
                "joint positions",
                self.jacobian.ncols(),
                positions.len(),
            ));
        }
        Ok(self.jacobian.clone())
    }
}
