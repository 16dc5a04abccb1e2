//! Block solution vector for multiphase flow unknowns.
//!
//! Every degree of freedom carries a fixed-size tuple of primary variables.
//! The first slot always holds the (gas-phase) pressure; the meaning of the
//! two remaining slots depends on the phase presence at that DOF:
//! a saturation in one presence state, a mole fraction in another. This module
//! only fixes the storage layout; the interpretation lives with the
//! phase-presence state machine.

use nalgebra::{DVector, SVector};

use crate::dof::DofIndex;
use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// Number of equations (and primary variables) per DOF.
pub const NUM_EQ: usize = 3;

/// Slot of the pressure unknown within a primary-variable block.
pub const PRESSURE_IDX: usize = 0;
/// First switchable slot (saturation or mole fraction, by presence state).
pub const SWITCH_1: usize = 1;
/// Second switchable slot.
pub const SWITCH_2: usize = 2;

/// The primary-variable tuple stored at one DOF.
pub type PrimaryVariables = SVector<Real, NUM_EQ>;

/// An ordered collection of per-DOF primary-variable blocks.
///
/// Owned by the outer time-stepping driver; the Newton controller receives
/// it by mutable reference for the duration of one nonlinear solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionVector {
    blocks: Vec<PrimaryVariables>,
}

impl SolutionVector {
    /// A solution with `num_dofs` copies of the same initial block.
    pub fn constant(num_dofs: usize, init: PrimaryVariables) -> Self {
        Self {
            blocks: vec![init; num_dofs],
        }
    }

    pub fn from_blocks(blocks: Vec<PrimaryVariables>) -> Self {
        Self { blocks }
    }

    pub fn num_dofs(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[PrimaryVariables] {
        &self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrimaryVariables> {
        self.blocks.iter()
    }

    /// `prev - lambda * delta`, block-wise. `lambda = 1` is the plain
    /// Newton update; the line search passes smaller factors.
    pub fn updated(prev: &Self, delta: &Self, lambda: Real) -> Self {
        debug_assert_eq!(prev.num_dofs(), delta.num_dofs());
        Self {
            blocks: prev
                .blocks
                .iter()
                .zip(delta.blocks.iter())
                .map(|(p, d)| p - d * lambda)
                .collect(),
        }
    }

    /// Euclidean norm over all blocks (local part in distributed runs).
    pub fn two_norm(&self) -> Real {
        self.two_norm_squared().sqrt()
    }

    pub fn two_norm_squared(&self) -> Real {
        self.blocks.iter().map(|b| b.norm_squared()).sum()
    }

    /// Flatten into a single dense vector, DOF-major.
    pub fn as_flat(&self) -> DVector<Real> {
        let mut flat = DVector::zeros(self.blocks.len() * NUM_EQ);
        for (i, block) in self.blocks.iter().enumerate() {
            for eq in 0..NUM_EQ {
                flat[i * NUM_EQ + eq] = block[eq];
            }
        }
        flat
    }

    /// Rebuild the block structure from a flat vector.
    pub fn from_flat(flat: &DVector<Real>) -> CoreResult<Self> {
        if flat.len() % NUM_EQ != 0 {
            return Err(CoreError::InvalidArg {
                what: "flat vector length is not a multiple of the block size",
            });
        }
        let blocks = flat
            .as_slice()
            .chunks_exact(NUM_EQ)
            .map(PrimaryVariables::from_column_slice)
            .collect();
        Ok(Self { blocks })
    }
}

impl std::ops::Index<usize> for SolutionVector {
    type Output = PrimaryVariables;

    fn index(&self, dof: usize) -> &PrimaryVariables {
        &self.blocks[dof]
    }
}

impl std::ops::IndexMut<usize> for SolutionVector {
    fn index_mut(&mut self, dof: usize) -> &mut PrimaryVariables {
        &mut self.blocks[dof]
    }
}

impl std::ops::Index<DofIndex> for SolutionVector {
    type Output = PrimaryVariables;

    fn index(&self, dof: DofIndex) -> &PrimaryVariables {
        &self.blocks[dof.index()]
    }
}

impl std::ops::IndexMut<DofIndex> for SolutionVector {
    fn index_mut(&mut self, dof: DofIndex) -> &mut PrimaryVariables {
        &mut self.blocks[dof.index()]
    }
}

/// Relative shift between two iterates of one DOF.
///
/// For each slot the difference is scaled by the magnitude of the mean of
/// the two values, floored at one so that near-zero unknowns are compared
/// absolutely. The block shift is the worst slot.
pub fn relative_shift(a: &PrimaryVariables, b: &PrimaryVariables) -> Real {
    let mut result: Real = 0.0;
    for eq in 0..NUM_EQ {
        let scale = Real::max(1.0, ((a[eq] + b[eq]) / 2.0).abs());
        result = result.max((a[eq] - b[eq]).abs() / scale);
    }
    result
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn relative_shift_is_symmetric_and_nonnegative(
            a in prop::collection::vec(-1e6_f64..1e6, NUM_EQ),
            b in prop::collection::vec(-1e6_f64..1e6, NUM_EQ),
        ) {
            let pa = PrimaryVariables::from_column_slice(&a);
            let pb = PrimaryVariables::from_column_slice(&b);
            let s_ab = relative_shift(&pa, &pb);
            let s_ba = relative_shift(&pb, &pa);
            prop_assert!(s_ab >= 0.0);
            prop_assert!((s_ab - s_ba).abs() <= 1e-12 * s_ab.max(1.0));
            prop_assert_eq!(relative_shift(&pa, &pa), 0.0);
        }
    }
}
