//! Jacobian reduction over the independent joints.
//!
//! Every mimic joint's column is folded, scaled by its multiplier, into its
//! master's column. By the chain rule the reduced column is exactly the twist
//! produced by unit velocity of the master with all of its followers moving
//! along:
//!
//! ```text
//! J_red[:, k(i)] = J[:, i] + Σ_{m follows i} multiplier(m) · J[:, m]
//! ```

use nalgebra::{DMatrix, Matrix6xX};

use crate::{IkError, MimicMap, Result};

/// Where one chain joint lands in the reduced joint space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnContribution {
    /// Reduced column this joint feeds.
    pub column: usize,
    /// Scale applied to the joint's Jacobian column (1 for independent joints).
    pub factor: f64,
}

/// Validated mapping between the full and the reduced joint space.
///
/// Built once from a [`MimicMap`] and reused for every solve.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedLayout {
    contributions: Vec<ColumnContribution>,
    independent: Vec<usize>,
}

impl ReducedLayout {
    /// Build the layout, rejecting malformed maps.
    pub fn new(map: &MimicMap) -> Result<Self> {
        map.validate()?;

        let mut column_of = vec![usize::MAX; map.len()];
        let independent: Vec<usize> = map.independent_indices().collect();
        for (column, &joint) in independent.iter().enumerate() {
            column_of[joint] = column;
        }

        let contributions = map
            .roles()
            .iter()
            .enumerate()
            .map(|(joint, role)| match role.relation() {
                None => ColumnContribution {
                    column: column_of[joint],
                    factor: 1.0,
                },
                Some(relation) => ColumnContribution {
                    column: column_of[relation.master],
                    factor: relation.multiplier,
                },
            })
            .collect();

        Ok(Self {
            contributions,
            independent,
        })
    }

    /// Number of joints in the full chain (N).
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.contributions.len()
    }

    /// Number of independent joints (K).
    #[must_use]
    pub fn reduced_count(&self) -> usize {
        self.independent.len()
    }

    /// Original joint index for each reduced column.
    #[must_use]
    pub fn independent_joints(&self) -> &[usize] {
        &self.independent
    }

    /// Per-joint contributions, in chain order.
    #[must_use]
    pub fn contributions(&self) -> &[ColumnContribution] {
        &self.contributions
    }

    /// Collapse a full 6×N Jacobian into the 6×K reduced Jacobian.
    pub fn reduce(&self, jacobian: &Matrix6xX<f64>) -> Result<DMatrix<f64>> {
        if jacobian.ncols() != self.joint_count() {
            return Err(IkError::dimension(
                "jacobian columns",
                self.joint_count(),
                jacobian.ncols(),
            ));
        }

        let mut reduced = DMatrix::zeros(6, self.reduced_count());
        for (joint, c) in self.contributions.iter().enumerate() {
            for row in 0..6 {
                reduced[(row, c.column)] += c.factor * jacobian[(row, joint)];
            }
        }
        Ok(reduced)
    }
}

/// A reduced Jacobian together with its column-to-joint mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedJacobian {
    /// The 6×K reduced Jacobian.
    pub matrix: DMatrix<f64>,
    /// Original joint index of each reduced column.
    pub independent_joints: Vec<usize>,
}

/// One-shot reduction of `jacobian` under `map`.
pub fn reduce_jacobian(jacobian: &Matrix6xX<f64>, map: &MimicMap) -> Result<ReducedJacobian> {
    let layout = ReducedLayout::new(map)?;
    let matrix = layout.reduce(jacobian)?;
    Ok(ReducedJacobian {
        matrix,
        independent_joints: layout.independent,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector6;

    fn sample_jacobian() -> Matrix6xX<f64> {
        Matrix6xX::from_columns(&[
            Vector6::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0),
            Vector6::new(0.0, 2.0, 0.0, 0.0, 1.0, 0.0),
            Vector6::new(0.5, 0.5, 1.0, 1.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_identity_without_mimics() {
        let jac = sample_jacobian();
        let reduced = reduce_jacobian(&jac, &MimicMap::independent(3)).unwrap();
        assert_eq!(reduced.matrix.shape(), (6, 3));
        assert_eq!(reduced.independent_joints, vec![0, 1, 2]);
        for c in 0..3 {
            for r in 0..6 {
                assert_eq!(reduced.matrix[(r, c)], jac[(r, c)]);
            }
        }
    }

    #[test]
    fn test_mimic_column_folded_into_master() {
        let jac = sample_jacobian();
        // joint 2 follows joint 0 at -0.5
        let map = MimicMap::independent(3).with_mimic(2, 0, -0.5, 1.0);
        let reduced = reduce_jacobian(&jac, &map).unwrap();

        assert_eq!(reduced.matrix.shape(), (6, 2));
        assert_eq!(reduced.independent_joints, vec![0, 1]);
        for r in 0..6 {
            assert_relative_eq!(
                reduced.matrix[(r, 0)],
                jac[(r, 0)] - 0.5 * jac[(r, 2)],
                epsilon = 1e-12
            );
            assert_eq!(reduced.matrix[(r, 1)], jac[(r, 1)]);
        }
    }

    #[test]
    fn test_several_followers_accumulate() {
        let col = Vector6::new(0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let jac = Matrix6xX::from_columns(&[col, col, col]);
        let map = MimicMap::independent(3)
            .with_mimic(1, 0, 2.0, 0.0)
            .with_mimic(2, 0, -1.0, 0.0);
        let reduced = reduce_jacobian(&jac, &map).unwrap();
        assert_eq!(reduced.matrix.shape(), (6, 1));
        assert_relative_eq!(reduced.matrix[(5, 0)], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_layout_contributions() {
        let map = MimicMap::independent(4).with_mimic(1, 3, 0.5, 0.0);
        let layout = ReducedLayout::new(&map).unwrap();
        assert_eq!(layout.joint_count(), 4);
        assert_eq!(layout.reduced_count(), 3);
        assert_eq!(layout.independent_joints(), &[0, 2, 3]);
        assert_eq!(
            layout.contributions()[1],
            ColumnContribution {
                column: 2,
                factor: 0.5
            }
        );
    }

    #[test]
    fn test_wrong_column_count() {
        let layout = ReducedLayout::new(&MimicMap::independent(2)).unwrap();
        let err = layout.reduce(&sample_jacobian()).unwrap_err();
        assert_eq!(err, IkError::dimension("jacobian columns", 2, 3));
    }

    #[test]
    fn test_rejects_transitive_map() {
        let map = MimicMap::independent(3)
            .with_mimic(1, 0, 1.0, 0.0)
            .with_mimic(2, 1, 1.0, 0.0);
        assert!(ReducedLayout::new(&map).unwrap_err().is_mimic_error());
    }

    #[test]
    fn test_empty_chain() {
        let layout = ReducedLayout::new(&MimicMap::default()).unwrap();
        let reduced = layout.reduce(&Matrix6xX::zeros(0)).unwrap();
        assert_eq!(reduced.shape(), (6, 0));
    }
}
