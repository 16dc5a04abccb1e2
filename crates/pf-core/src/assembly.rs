//! Jacobian assembler collaborator contract.
//!
//! The assembler owns the reassembly mask: a per-DOF record of whether the
//! Jacobian rows and columns of that DOF must be recomputed in the next
//! assembly. The Newton controller and the primary-variable switch only
//! talk to it through this trait: the controller to request full
//! reassembly after a failed solve or to hand over recycling hints, the
//! switch to mark DOFs whose linearization became meaningless after a
//! phase-presence change.

use crate::dof::DofIndex;
use crate::numeric::Real;
use crate::solution::SolutionVector;

pub trait JacobianAssembler {
    /// Invalidate the cached linearization at one DOF. Called by the
    /// primary-variable switch whenever the presence tag of a DOF changed.
    fn mark_dof_dirty(&mut self, dof: DofIndex);

    /// Request a full reassembly of the Jacobian on the next assembly.
    fn reassemble_all(&mut self);

    /// Hint that the current Jacobian may be reused as the initial
    /// linearization of the next solve. Never a correctness requirement.
    fn set_matrix_reusable(&mut self, reusable: bool);

    /// Accumulate the drift of the solution away from the last
    /// linearization point. Assemblers without partial reassembly ignore it.
    fn update_discrepancy(&mut self, _u_last: &SolutionVector, _delta: &SolutionVector) {}

    /// Recompute the per-DOF reassembly colors from the accumulated
    /// discrepancy; DOFs that drifted further than `relative_tolerance`
    /// must be recomputed.
    fn compute_colors(&mut self, _relative_tolerance: Real) {}
}

/// An assembler without partial reassembly: every request degenerates to
/// "recompute everything". Records what was requested so callers (and
/// tests) can observe the interaction.
#[derive(Debug, Clone, Default)]
pub struct FullAssembly {
    dirty: Vec<DofIndex>,
    full_reassembly: bool,
    matrix_reusable: bool,
}

impl FullAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// DOFs marked dirty since the last `clear`.
    pub fn dirty_dofs(&self) -> &[DofIndex] {
        &self.dirty
    }

    pub fn full_reassembly_requested(&self) -> bool {
        self.full_reassembly
    }

    pub fn matrix_reusable(&self) -> bool {
        self.matrix_reusable
    }

    /// Forget recorded requests, typically at the start of an assembly.
    pub fn clear(&mut self) {
        self.dirty.clear();
        self.full_reassembly = false;
    }
}

impl JacobianAssembler for FullAssembly {
    fn mark_dof_dirty(&mut self, dof: DofIndex) {
        self.dirty.push(dof);
    }

    fn reassemble_all(&mut self) {
        self.full_reassembly = true;
        self.matrix_reusable = false;
    }

    fn set_matrix_reusable(&mut self, reusable: bool) {
        self.matrix_reusable = reusable;
    }
}
