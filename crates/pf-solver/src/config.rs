//! Newton controller configuration.

use pf_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Newton controller configuration.
///
/// Convergence is declared from the relative-shift metric (largest relative
/// change of any primary variable between two iterates), the
/// residual-reduction metric (residual norm relative to the start of the
/// solve), or a combination of both, depending on which criteria are
/// enabled and whether both must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Use the maximum relative shift as a convergence criterion.
    pub enable_shift_criterion: bool,
    /// Use the residual reduction as a convergence criterion.
    pub enable_residual_criterion: bool,
    /// With both criteria enabled: require both (true) or either (false).
    pub require_both_criteria: bool,
    /// Largest relative shift at which the solve counts as converged.
    pub max_relative_shift: Real,
    /// Residual reduction at which the solve counts as converged.
    pub residual_reduction: Real,
    /// Iteration count the step-size heuristic aims at.
    pub target_iterations: u32,
    /// Iteration count after which the controller gives up.
    pub max_iterations: u32,
    /// Backtracking line search instead of the plain full-step update.
    pub use_line_search: bool,
    /// Let the assembler recompute only rows/columns of DOFs that drifted
    /// from their linearization point.
    pub enable_partial_reassemble: bool,
    /// Offer the converged Jacobian for reuse in the next solve.
    pub enable_jacobian_recycling: bool,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            enable_shift_criterion: true,
            enable_residual_criterion: false,
            require_both_criteria: false,
            max_relative_shift: 1e-8,
            residual_reduction: 1e-5,
            target_iterations: 10,
            max_iterations: 18,
            use_line_search: false,
            enable_partial_reassemble: false,
            enable_jacobian_recycling: false,
        }
    }
}

impl NewtonConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !self.enable_shift_criterion && !self.enable_residual_criterion {
            return Err(SolverError::Configuration {
                what: "at least one of the shift and residual criteria must be enabled",
            });
        }
        if self.target_iterations == 0 {
            return Err(SolverError::Configuration {
                what: "target_iterations must be positive",
            });
        }
        if self.max_iterations == 0 {
            return Err(SolverError::Configuration {
                what: "max_iterations must be positive",
            });
        }
        if !(self.max_relative_shift > 0.0) {
            return Err(SolverError::Configuration {
                what: "max_relative_shift must be positive",
            });
        }
        if !(self.residual_reduction > 0.0) {
            return Err(SolverError::Configuration {
                what: "residual_reduction must be positive",
            });
        }
        Ok(())
    }
}
