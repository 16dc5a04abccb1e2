//! Adaptive implicit time loop with cutback retry.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pf_core::{Communicator, Real, SolutionVector};
use pf_solver::{IterationState, LinearSolver, NonlinearModel};
use pf_switch::{PresenceField, StateEvaluator};

use crate::driver::{NewtonDriver, Problem};
use crate::error::{SimError, SimResult};

/// Options for the adaptive time loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeLoopOptions {
    /// Final simulation time.
    pub t_end: Real,
    /// Size of the first step.
    pub dt_initial: Real,
    /// Smallest admissible step; a cutback below it aborts the run.
    pub dt_min: Real,
    /// Largest admissible step.
    pub dt_max: Real,
    /// Safety limit on the number of accepted steps.
    pub max_steps: usize,
    /// Cutback attempts per step before giving up.
    pub max_retries: usize,
}

impl Default for TimeLoopOptions {
    fn default() -> Self {
        Self {
            t_end: 1.0,
            dt_initial: 1e-3,
            dt_min: 1e-9,
            dt_max: 1e2,
            max_steps: 100_000,
            max_retries: 8,
        }
    }
}

impl TimeLoopOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt_initial > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt_initial must be positive",
            });
        }
        if !(self.dt_min > 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt_min must be positive",
            });
        }
        if self.dt_max < self.dt_initial {
            return Err(SimError::InvalidArg {
                what: "dt_max must not be below dt_initial",
            });
        }
        if self.dt_min > self.dt_max {
            return Err(SimError::InvalidArg {
                what: "dt_min must not exceed dt_max",
            });
        }
        if self.t_end < 0.0 {
            return Err(SimError::InvalidArg {
                what: "t_end must be non-negative",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }
}

/// One accepted time step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// Time reached after the step.
    pub t: Real,
    pub dt: Real,
    pub iterations: u32,
    /// Cutback attempts consumed before the step was accepted.
    pub retries: usize,
    pub switched: bool,
}

/// Record of an entire run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeLoopRecord {
    pub steps: Vec<StepRecord>,
}

impl TimeLoopRecord {
    pub fn t_final(&self) -> Real {
        self.steps.last().map_or(0.0, |s| s.t)
    }
}

/// Run the implicit time loop.
///
/// Each step attempts a nonlinear solve. A recoverable failure rolls back
/// (the driver already restored solution and presence tags), shrinks the
/// step via the controller's suggestion and retries; success advances the
/// presence tags, hands out the recycling hint and grows the next step.
pub fn run_time_loop<M, E, L, C>(
    driver: &NewtonDriver<C>,
    problem: &mut Problem<'_, M, E, L>,
    u: &mut SolutionVector,
    presence: &mut PresenceField,
    opts: &TimeLoopOptions,
) -> SimResult<TimeLoopRecord>
where
    M: NonlinearModel,
    E: StateEvaluator,
    L: LinearSolver,
    C: Communicator,
{
    opts.validate()?;

    let mut t: Real = 0.0;
    let mut dt = opts.dt_initial.min(opts.dt_max);
    let mut record = TimeLoopRecord::default();
    let mut step = 0;

    while t < opts.t_end && step < opts.max_steps {
        let mut dt_try = dt.min(opts.t_end - t);
        let mut retries = 0;

        let (report, state) = loop {
            problem.model.prepare_step(t, dt_try);
            let mut state = IterationState::new();
            match driver.solve(problem, u, presence, &mut state) {
                Ok(report) => break (report, state),
                Err(e) if e.is_recoverable() => {
                    retries += 1;
                    if retries > opts.max_retries {
                        return Err(SimError::RetriesExhausted {
                            retries: opts.max_retries,
                            t,
                            what: e.to_string(),
                        });
                    }
                    // the failure hook poisoned the step count, so the
                    // suggestion shrinks
                    let suggested = driver.controller().suggest_next_dt(&state, dt_try);
                    if suggested < opts.dt_min {
                        return Err(SimError::StepSizeUnderflow {
                            suggested,
                            dt_min: opts.dt_min,
                        });
                    }
                    warn!(
                        t,
                        dt = dt_try,
                        suggested,
                        retry = retries,
                        error = %e,
                        "nonlinear solve failed, cutting the step back"
                    );
                    dt_try = suggested;
                }
                Err(e) => return Err(e),
            }
        };

        presence.advance();
        driver.controller().on_success(problem.assembler);
        t += dt_try;
        step += 1;
        record.steps.push(StepRecord {
            t,
            dt: dt_try,
            iterations: report.iterations,
            retries,
            switched: report.switched_any,
        });

        dt = driver
            .controller()
            .suggest_next_dt(&state, dt_try)
            .clamp(opts.dt_min, opts.dt_max);
        info!(
            t,
            dt_next = dt,
            iterations = report.iterations,
            retries,
            "time step accepted"
        );
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_defaults() {
        let opts = TimeLoopOptions::default();
        assert_eq!(opts.t_end, 1.0);
        assert_eq!(opts.dt_initial, 1e-3);
        assert_eq!(opts.max_retries, 8);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn options_validation() {
        let opts = TimeLoopOptions {
            dt_initial: 0.0,
            ..TimeLoopOptions::default()
        };
        assert!(opts.validate().is_err());

        let opts = TimeLoopOptions {
            dt_max: 1e-6,
            ..TimeLoopOptions::default()
        };
        assert!(opts.validate().is_err());

        let opts = TimeLoopOptions {
            max_steps: 0,
            ..TimeLoopOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn empty_record_reports_time_zero() {
        assert_eq!(TimeLoopRecord::default().t_final(), 0.0);
    }

    #[test]
    fn partial_options_deserialize_with_defaults() {
        let opts: TimeLoopOptions =
            serde_json::from_str(r#"{"t_end": 10.0, "max_retries": 3}"#).unwrap();
        assert_eq!(opts.t_end, 10.0);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.dt_initial, 1e-3);
    }
}
