//! Error types for the outer driver and time loop.

use pf_core::Real;
use pf_solver::SolverError;
use pf_switch::SwitchError;
use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Switch error: {0}")]
    Switch(#[from] SwitchError),

    #[error("Time-step size underflow: suggested {suggested:.3e} below minimum {dt_min:.3e}")]
    StepSizeUnderflow { suggested: Real, dt_min: Real },

    #[error("Retries exhausted after {retries} attempts at t = {t:.6e}: {what}")]
    RetriesExhausted {
        retries: usize,
        t: Real,
        what: String,
    },
}

impl SimError {
    /// Whether shrinking the time step and retrying makes sense.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::Solver(e) => e.is_recoverable(),
            SimError::Switch(e) => e.is_recoverable(),
            SimError::InvalidArg { .. }
            | SimError::StepSizeUnderflow { .. }
            | SimError::RetriesExhausted { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability_follows_the_inner_error() {
        let recoverable: SimError = SolverError::LinearSolveFailure {
            what: "singular".into(),
        }
        .into();
        assert!(recoverable.is_recoverable());

        let fatal: SimError = SolverError::Configuration { what: "bad" }.into();
        assert!(!fatal.is_recoverable());

        assert!(
            !SimError::StepSizeUnderflow {
                suggested: 1e-12,
                dt_min: 1e-9
            }
            .is_recoverable()
        );
    }
}
