//! Per-solve iteration state.

use pf_core::Real;

/// Convergence and iteration state of one nonlinear solve.
///
/// Owned by the driver and passed into every controller call, so the data
/// the control decisions depend on is explicit rather than hidden in
/// controller fields. `begin_solve` resets it; `begin_iteration` snapshots
/// the metrics into the `last_*` slots before the current iteration
/// overwrites them.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationState {
    /// Iterations completed since `begin_solve`.
    pub num_steps: u32,
    /// Maximum relative change of any primary variable in the last update.
    pub shift: Real,
    pub last_shift: Real,
    /// Residual norm relative to the start of this solve.
    pub reduction: Real,
    pub last_reduction: Real,
    /// Residual norm recorded on the first iteration, the denominator of
    /// `reduction`.
    pub initial_residual: Real,
    /// At least one DOF changed its phase-presence tag this iteration; the
    /// unknowns changed meaning, so convergence is deferred.
    pub switched: bool,
}

impl IterationState {
    pub fn new() -> Self {
        Self {
            num_steps: 0,
            shift: Real::INFINITY,
            last_shift: Real::INFINITY,
            // the reduction of the initial iterate is 1 by definition
            reduction: 1.0,
            last_reduction: 1.0,
            initial_residual: 0.0,
            switched: false,
        }
    }
}

impl Default for IterationState {
    fn default() -> Self {
        Self::new()
    }
}
