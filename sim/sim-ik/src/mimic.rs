//! Mimic joint relations.
//!
//! A mimic joint follows a master joint through an affine relation:
//!
//! ```text
//! q_mimic = multiplier · q_master + offset
//! ```
//!
//! Differentiating drops the offset, so at the velocity level only the
//! multiplier matters. A master must itself be independent; chains of mimics
//! are rejected by [`MimicMap::validate`].
//!
//! # Example
//!
//! ```
//! use sim_ik::MimicMap;
//!
//! // A parallel gripper: joint 2 mirrors joint 1.
//! let map = MimicMap::independent(3).with_mimic(2, 1, -1.0, 0.0);
//! assert!(map.validate().is_ok());
//! assert_eq!(map.independent_count(), 2);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{IkError, Result};

/// How a mimic joint follows its master.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MimicRelation {
    /// Index of the master joint in the chain.
    pub master: usize,
    /// Velocity (and position) scale applied to the master.
    pub multiplier: f64,
    /// Position offset. Ignored by the velocity solver.
    pub offset: f64,
}

impl MimicRelation {
    /// Create a new relation.
    #[must_use]
    pub const fn new(master: usize, multiplier: f64, offset: f64) -> Self {
        Self {
            master,
            multiplier,
            offset,
        }
    }

    /// Position of the mimic joint for a given master position.
    #[must_use]
    pub fn position(&self, master_position: f64) -> f64 {
        self.multiplier.mul_add(master_position, self.offset)
    }

    /// Velocity of the mimic joint for a given master velocity.
    #[must_use]
    pub fn velocity(&self, master_velocity: f64) -> f64 {
        self.multiplier * master_velocity
    }
}

/// Role of a single joint in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointRole {
    /// The joint is a free variable of the solve.
    #[default]
    Independent,
    /// The joint follows another joint.
    Mimic(MimicRelation),
}

impl JointRole {
    /// Check if this joint is independent.
    #[must_use]
    pub const fn is_independent(&self) -> bool {
        matches!(self, Self::Independent)
    }

    /// The mimic relation, if any.
    #[must_use]
    pub const fn relation(&self) -> Option<&MimicRelation> {
        match self {
            Self::Independent => None,
            Self::Mimic(relation) => Some(relation),
        }
    }
}

/// Per-joint roles for a chain, indexed by joint position.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MimicMap {
    roles: Vec<JointRole>,
}

impl MimicMap {
    /// Create a map from explicit roles.
    #[must_use]
    pub fn new(roles: Vec<JointRole>) -> Self {
        Self { roles }
    }

    /// A map of `joint_count` independent joints.
    #[must_use]
    pub fn independent(joint_count: usize) -> Self {
        Self {
            roles: vec![JointRole::Independent; joint_count],
        }
    }

    /// Make `joint` follow `master`.
    ///
    /// A `joint` outside the map is ignored; size the map with
    /// [`independent`](Self::independent) first. The master is checked by
    /// [`validate`](Self::validate).
    #[must_use]
    pub fn with_mimic(mut self, joint: usize, master: usize, multiplier: f64, offset: f64) -> Self {
        if let Some(role) = self.roles.get_mut(joint) {
            *role = JointRole::Mimic(MimicRelation::new(master, multiplier, offset));
        }
        self
    }

    /// Number of joints covered by the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether the map covers no joints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// All roles, in joint order.
    #[must_use]
    pub fn roles(&self) -> &[JointRole] {
        &self.roles
    }

    /// Role of one joint.
    #[must_use]
    pub fn role(&self, joint: usize) -> Option<&JointRole> {
        self.roles.get(joint)
    }

    /// Number of independent joints (the reduced dimension K).
    #[must_use]
    pub fn independent_count(&self) -> usize {
        self.roles.iter().filter(|r| r.is_independent()).count()
    }

    /// Number of mimic joints.
    #[must_use]
    pub fn mimic_count(&self) -> usize {
        self.len() - self.independent_count()
    }

    /// Original indices of the independent joints, in order.
    pub fn independent_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.roles
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_independent())
            .map(|(i, _)| i)
    }

    /// Mimic joints with their relations, in joint order.
    pub fn mimics(&self) -> impl Iterator<Item = (usize, &MimicRelation)> + '_ {
        self.roles
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.relation().map(|rel| (i, rel)))
    }

    /// Check that every mimic refers to an in-range, independent master.
    pub fn validate(&self) -> Result<()> {
        for (joint, relation) in self.mimics() {
            if relation.master == joint {
                return Err(IkError::invalid_mimic(joint, "joint mimics itself"));
            }
            match self.roles.get(relation.master) {
                None => {
                    return Err(IkError::invalid_mimic(
                        joint,
                        format!(
                            "master {} out of range for {} joints",
                            relation.master,
                            self.len()
                        ),
                    ));
                }
                Some(JointRole::Mimic(_)) => {
                    return Err(IkError::invalid_mimic(
                        joint,
                        format!("master {} is itself a mimic joint", relation.master),
                    ));
                }
                Some(JointRole::Independent) => {}
            }
            if !relation.multiplier.is_finite() {
                return Err(IkError::invalid_mimic(
                    joint,
                    format!("multiplier {} is not finite", relation.multiplier),
                ));
            }
        }
        Ok(())
    }

    /// Overwrite every mimic joint's position from its master.
    pub fn apply_positions(&self, positions: &mut [f64]) -> Result<()> {
        self.check_len("joint positions", positions.len())?;
        self.validate()?;
        for (joint, relation) in self.mimics() {
            positions[joint] = relation.position(positions[relation.master]);
        }
        Ok(())
    }

    /// Extract the independent joints' positions from a full configuration.
    pub fn independent_positions(&self, positions: &[f64]) -> Result<Vec<f64>> {
        self.check_len("joint positions", positions.len())?;
        Ok(self.independent_indices().map(|i| positions[i]).collect())
    }

    fn check_len(&self, what: &'static str, actual: usize) -> Result<()> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(IkError::dimension(what, self.len(), actual))
        }
    }
}

impl FromIterator<JointRole> for MimicMap {
    fn from_iter<I: IntoIterator<Item = JointRole>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gripper() -> MimicMap {
        // arm joint, finger, mirrored finger
        MimicMap::independent(3).with_mimic(2, 1, -1.0, 0.1)
    }

    #[test]
    fn test_counts() {
        let map = gripper();
        assert_eq!(map.len(), 3);
        assert_eq!(map.independent_count(), 2);
        assert_eq!(map.mimic_count(), 1);
        assert_eq!(map.independent_indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(map.mimics().map(|(i, _)| i).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_relation_affine() {
        let rel = MimicRelation::new(0, -2.0, -0.4);
        assert_relative_eq!(rel.position(0.2), -0.8, epsilon = 1e-12);
        assert_relative_eq!(rel.velocity(0.5), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_ok() {
        assert!(gripper().validate().is_ok());
        assert!(MimicMap::default().validate().is_ok());
    }

    #[test]
    fn test_validate_transitive() {
        let map = MimicMap::independent(3)
            .with_mimic(1, 0, 1.0, 0.0)
            .with_mimic(2, 1, 1.0, 0.0);
        let err = map.validate().unwrap_err();
        assert_eq!(
            err,
            IkError::invalid_mimic(2, "master 1 is itself a mimic joint")
        );
    }

    #[test]
    fn test_validate_out_of_range_and_self() {
        let map = MimicMap::independent(2).with_mimic(1, 7, 1.0, 0.0);
        assert!(map.validate().unwrap_err().is_mimic_error());

        let map = MimicMap::independent(2).with_mimic(1, 1, 1.0, 0.0);
        assert!(map.validate().unwrap_err().is_mimic_error());

        let map = MimicMap::independent(2).with_mimic(1, 0, f64::INFINITY, 0.0);
        assert!(map.validate().unwrap_err().is_mimic_error());
    }

    #[test]
    fn test_apply_positions() {
        let map = gripper();
        let mut q = [0.3, 0.5, 0.0];
        map.apply_positions(&mut q).unwrap();
        assert_relative_eq!(q[2], -0.4, epsilon = 1e-12);
        assert_eq!(map.independent_positions(&q).unwrap(), vec![0.3, 0.5]);

        let mut short = [0.0; 2];
        assert!(map.apply_positions(&mut short).unwrap_err().is_dimension_mismatch());
    }

    #[test]
    fn test_from_iter() {
        let map: MimicMap = [
            JointRole::Independent,
            JointRole::Mimic(MimicRelation::new(0, 2.0, 0.0)),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.role(1).and_then(JointRole::relation).map(|r| r.master), Some(0));
    }
}
