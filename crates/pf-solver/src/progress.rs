//! Iteration progress reporting.

use core::fmt;

use pf_core::Real;

use crate::criterion::ConvergenceCriterion;

/// Progress of one finished Newton iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub iteration: u32,
    /// Present when the shift criterion is active.
    pub shift: Option<Real>,
    /// Present when the residual criterion is active.
    pub reduction: Option<Real>,
}

impl fmt::Display for IterationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Newton iteration {} done", self.iteration)?;
        if let Some(shift) = self.shift {
            write!(f, ", maximum relative shift = {shift:.3e}")?;
        }
        if let Some(reduction) = self.reduction {
            write!(f, ", residual reduction = {reduction:.3e}")?;
        }
        Ok(())
    }
}

/// Diagnosis of a solve that gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    /// Iterations exhausted before giving up.
    pub iterations: u32,
    pub criterion: ConvergenceCriterion,
    pub shift: Real,
    pub max_relative_shift: Real,
    pub reduction: Real,
    pub residual_reduction: Real,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Newton gave up after {} iterations (criterion: {})",
            self.iterations,
            self.criterion.as_str()
        )?;
        if self.criterion.uses_shift() {
            write!(
                f,
                "; shift {:.3e} vs tolerance {:.3e}",
                self.shift, self.max_relative_shift
            )?;
        }
        if self.criterion.uses_residual() {
            write!(
                f,
                "; reduction {:.3e} vs tolerance {:.3e}",
                self.reduction, self.residual_reduction
            )?;
        }
        Ok(())
    }
}

/// Caller-supplied sink for human-readable progress.
///
/// The only externally observable side effect of the controller besides
/// mutating the solution vector; never required for correctness. Reports
/// are emitted on rank 0 only.
pub trait ProgressSink {
    fn iteration_done(&mut self, report: &IterationReport);

    fn solve_failed(&mut self, _report: &FailureReport) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn iteration_done(&mut self, _report: &IterationReport) {}
}
