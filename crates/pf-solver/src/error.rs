//! Error types for the nonlinear solver.

use pf_core::CoreError;
use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

/// Errors surfaced by the Newton controller.
///
/// Everything except a configuration error is recoverable by the outer
/// time-stepping driver: it rolls the solution back, shrinks the step size
/// and retries. The controller itself never retries.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid solver configuration: {what}")]
    Configuration { what: &'static str },

    #[error("Linear solver did not converge: {what}")]
    LinearSolveFailure { what: String },

    #[error("Numerical problem: {what}")]
    NumericalProblem { what: String },

    #[error("Newton did not converge within {max_iterations} iterations: {what}")]
    IterationsExceeded { max_iterations: u32, what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl SolverError {
    /// Whether the outer driver may retry with a smaller time step.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SolverError::Configuration { .. } | SolverError::Core(_) => false,
            SolverError::LinearSolveFailure { .. }
            | SolverError::NumericalProblem { .. }
            | SolverError::IterationsExceeded { .. } => true,
        }
    }
}
