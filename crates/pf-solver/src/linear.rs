//! Linear solve oracle.

use nalgebra::{DMatrix, DVector};
use pf_core::Real;

use crate::error::{SolverError, SolverResult};

/// Outcome of one linear solve attempt.
#[derive(Debug, Clone)]
pub struct LinearOutcome {
    /// The increment solving `J * delta = rhs`.
    pub delta: DVector<Real>,
    /// Whether the solver reached its own tolerance. The controller turns
    /// a local or remote `false` into a `LinearSolveFailure`.
    pub converged: bool,
    /// Iteration count reported by the solver (1 for direct solvers).
    pub iterations: u32,
}

/// External linear solver contract.
///
/// Iterative solvers report `converged: false` instead of an error when
/// they merely ran out of iterations; errors are reserved for conditions
/// that make the attempt meaningless (wrong dimensions, broken setup).
pub trait LinearSolver {
    fn solve(&mut self, jacobian: &DMatrix<Real>, rhs: &DVector<Real>)
    -> SolverResult<LinearOutcome>;
}

/// Dense LU reference solver for tests and small systems.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLu;

impl LinearSolver for DenseLu {
    fn solve(
        &mut self,
        jacobian: &DMatrix<Real>,
        rhs: &DVector<Real>,
    ) -> SolverResult<LinearOutcome> {
        if jacobian.nrows() != rhs.len() {
            return Err(SolverError::NumericalProblem {
                what: format!(
                    "Jacobian has {} rows but the residual has {} entries",
                    jacobian.nrows(),
                    rhs.len()
                ),
            });
        }
        match jacobian.clone().lu().solve(rhs) {
            Some(delta) => Ok(LinearOutcome {
                delta,
                converged: true,
                iterations: 1,
            }),
            // singular matrix: report non-convergence, the controller
            // escalates it collectively
            None => Ok(LinearOutcome {
                delta: DVector::zeros(rhs.len()),
                converged: false,
                iterations: 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_lu_solves_a_small_system() {
        let jacobian = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 4.0]);
        let rhs = DVector::from_row_slice(&[2.0, 8.0]);
        let outcome = DenseLu.solve(&jacobian, &rhs).unwrap();
        assert!(outcome.converged);
        assert!((outcome.delta[0] - 1.0).abs() < 1e-12);
        assert!((outcome.delta[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn dense_lu_reports_singular_matrix_as_nonconverged() {
        let jacobian = DMatrix::zeros(2, 2);
        let rhs = DVector::from_element(2, 1.0);
        let outcome = DenseLu.solve(&jacobian, &rhs).unwrap();
        assert!(!outcome.converged);
    }

    #[test]
    fn dense_lu_rejects_dimension_mismatch() {
        let jacobian = DMatrix::zeros(2, 2);
        let rhs = DVector::from_element(3, 1.0);
        assert!(DenseLu.solve(&jacobian, &rhs).is_err());
    }
}
