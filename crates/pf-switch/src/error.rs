//! Error types for the primary-variable switch.

use pf_core::CoreError;
use thiserror::Error;

pub type SwitchResult<T> = Result<T, SwitchError>;

#[derive(Error, Debug)]
pub enum SwitchError {
    /// A volume-variables evaluation was invalid for one DOF, e.g. a
    /// correlation left its validity range for a freshly guessed primary
    /// variable. Raised by evaluators; the switch pass aggregates these.
    #[error("Volume-variables evaluation failed at dof {dof}: {what}")]
    Evaluation { dof: usize, what: String },

    /// The static-data update pass failed, locally or on a cooperating
    /// process. Recoverable by shrinking the time step.
    #[error("Numerical problem while updating static data: {what}")]
    NumericalProblem { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

impl SwitchError {
    pub fn is_recoverable(&self) -> bool {
        match self {
            SwitchError::Evaluation { .. } | SwitchError::NumericalProblem { .. } => true,
            SwitchError::Core(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerical_problems_are_recoverable() {
        let err = SwitchError::NumericalProblem {
            what: "flash failed".into(),
        };
        assert!(err.is_recoverable());
    }
}
