//! Convergence criterion strategy.

use crate::config::NewtonConfig;
use crate::error::{SolverError, SolverResult};

/// Which metric combination declares convergence.
///
/// Derived from the configuration flags once at construction; the decision
/// itself is a pure function of the two per-metric verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceCriterion {
    /// Only the relative-shift metric counts.
    ShiftOnly,
    /// Only the residual-reduction metric counts.
    ResidualOnly,
    /// Both metrics must be below their tolerances.
    Both,
    /// Either metric below its tolerance suffices.
    Either,
}

impl ConvergenceCriterion {
    pub fn from_config(config: &NewtonConfig) -> SolverResult<Self> {
        match (
            config.enable_shift_criterion,
            config.enable_residual_criterion,
        ) {
            (true, false) => Ok(ConvergenceCriterion::ShiftOnly),
            (false, true) => Ok(ConvergenceCriterion::ResidualOnly),
            (true, true) if config.require_both_criteria => Ok(ConvergenceCriterion::Both),
            (true, true) => Ok(ConvergenceCriterion::Either),
            (false, false) => Err(SolverError::Configuration {
                what: "at least one of the shift and residual criteria must be enabled",
            }),
        }
    }

    /// Whether the shift metric must be computed at all.
    pub fn uses_shift(self) -> bool {
        !matches!(self, ConvergenceCriterion::ResidualOnly)
    }

    /// Whether the residual must be re-evaluated after each update.
    pub fn uses_residual(self) -> bool {
        !matches!(self, ConvergenceCriterion::ShiftOnly)
    }

    /// Combine the two per-metric verdicts.
    pub fn is_met(self, shift_ok: bool, reduction_ok: bool) -> bool {
        match self {
            ConvergenceCriterion::ShiftOnly => shift_ok,
            ConvergenceCriterion::ResidualOnly => reduction_ok,
            ConvergenceCriterion::Both => shift_ok && reduction_ok,
            ConvergenceCriterion::Either => shift_ok || reduction_ok,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConvergenceCriterion::ShiftOnly => "shift",
            ConvergenceCriterion::ResidualOnly => "residual",
            ConvergenceCriterion::Both => "shift and residual",
            ConvergenceCriterion::Either => "shift or residual",
        }
    }
}
