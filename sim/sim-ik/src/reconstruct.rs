//! Expansion of independent-joint velocities back to the full chain.

use nalgebra::DVector;

use crate::{IkError, ReducedLayout, Result};

/// Expand K independent velocities to N joint velocities.
///
/// Independent joints take their reduced entry; every mimic joint takes
/// `multiplier × master velocity`.
pub fn expand_velocities(
    layout: &ReducedLayout,
    reduced: &DVector<f64>,
) -> Result<DVector<f64>> {
    let mut out = DVector::zeros(layout.joint_count());
    expand_velocities_into(layout, reduced, &mut out)?;
    Ok(out)
}

/// Like [`expand_velocities`], writing into a caller-owned buffer of length N.
pub fn expand_velocities_into(
    layout: &ReducedLayout,
    reduced: &DVector<f64>,
    out: &mut DVector<f64>,
) -> Result<()> {
    if reduced.len() != layout.reduced_count() {
        return Err(IkError::dimension(
            "reduced velocities",
            layout.reduced_count(),
            reduced.len(),
        ));
    }
    if out.len() != layout.joint_count() {
        return Err(IkError::dimension(
            "velocity output",
            layout.joint_count(),
            out.len(),
        ));
    }

    for (joint, contribution) in layout.contributions().iter().enumerate() {
        out[joint] = contribution.factor * reduced[contribution.column];
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::MimicMap;

    #[test]
    fn test_identity_layout() {
        let layout = ReducedLayout::new(&MimicMap::independent(3)).unwrap();
        let reduced = DVector::from_vec(vec![1.0, -2.0, 0.5]);
        let full = expand_velocities(&layout, &reduced).unwrap();
        assert_eq!(full, reduced);
    }

    #[test]
    fn test_mimic_follows_master() {
        // joint 0 follows joint 2, joint 3 follows joint 1
        let map = MimicMap::independent(4)
            .with_mimic(0, 2, -1.5, 0.3)
            .with_mimic(3, 1, 2.0, 0.0);
        let layout = ReducedLayout::new(&map).unwrap();
        let reduced = DVector::from_vec(vec![0.4, 1.0]);
        let full = expand_velocities(&layout, &reduced).unwrap();

        assert_eq!(full.len(), 4);
        assert_eq!(full[1], 0.4);
        assert_eq!(full[2], 1.0);
        assert_eq!(full[0], -1.5 * full[2]);
        assert_eq!(full[3], 2.0 * full[1]);
    }

    #[test]
    fn test_zero_multiplier() {
        let map = MimicMap::independent(2).with_mimic(1, 0, 0.0, 0.0);
        let layout = ReducedLayout::new(&map).unwrap();
        let full = expand_velocities(&layout, &DVector::from_vec(vec![3.0])).unwrap();
        assert_eq!(full[1], 0.0);
    }

    #[test]
    fn test_buffer_sizes_checked() {
        let map = MimicMap::independent(3).with_mimic(2, 0, 1.0, 0.0);
        let layout = ReducedLayout::new(&map).unwrap();

        let err = expand_velocities(&layout, &DVector::zeros(3)).unwrap_err();
        assert_eq!(err, IkError::dimension("reduced velocities", 2, 3));

        let mut out = DVector::zeros(2);
        let err = expand_velocities_into(&layout, &DVector::zeros(2), &mut out).unwrap_err();
        assert_eq!(err, IkError::dimension("velocity output", 3, 2));
    }
}
