//! Residual and assembly oracle for the Newton controller.

use nalgebra::{DMatrix, DVector};
use pf_core::{JacobianAssembler, PrimaryVariables, Real, SolutionVector};

use crate::error::SolverResult;

/// The nonlinear system `R(u) = 0` as seen by the controller.
///
/// The discretization behind this trait is an external collaborator; the
/// controller only needs the residual, the Jacobian, and a per-DOF shift
/// metric. Sign convention: the linear stage solves `J * delta = R(u)` and
/// the update subtracts, `u_new = u - lambda * delta`.
pub trait NonlinearModel: Sync {
    /// Called before each solve attempt with the step's time and size;
    /// implicit models fold `dt` into their residual. Retried steps call
    /// this again with the shrunken size.
    fn prepare_step(&mut self, _t: Real, _dt: Real) {}

    /// Assemble the residual and the Jacobian at `u`.
    ///
    /// The assembler carries the reassembly mask; implementations honoring
    /// partial reassembly may keep rows of clean DOFs from the previous
    /// linearization.
    fn assemble(
        &mut self,
        u: &SolutionVector,
        assembler: &mut dyn JacobianAssembler,
    ) -> SolverResult<(DMatrix<Real>, DVector<Real>)>;

    /// Euclidean norm of the residual at `u` (local part in distributed
    /// runs; the controller folds in the collective sum of squares).
    fn global_residual(&mut self, u: &SolutionVector) -> SolverResult<Real>;

    /// Relative shift of one DOF between two iterates. The default floors
    /// the scale at one, comparing small unknowns absolutely.
    fn relative_shift_at_dof(&self, prev: &PrimaryVariables, new: &PrimaryVariables) -> Real {
        pf_core::relative_shift(prev, new)
    }
}
