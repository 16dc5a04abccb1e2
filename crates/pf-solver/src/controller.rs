//! The Newton controller: convergence policy and update rule for one
//! nonlinear solve.
//!
//! An outer driver owns the loop and calls the protocol methods in a fixed
//! order per iteration:
//!
//! ```text
//! begin_solve
//! while should_proceed {
//!     begin_iteration
//!     (assemble)
//!     solve_linear_system
//!     update
//!     (primary-variable switch)
//!     end_iteration
//! }
//! then: on_success or on_failure
//! ```
//!
//! The controller holds only policy (configuration, criterion, the
//! communicator); everything that changes during a solve lives in the
//! driver-owned [`IterationState`].

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use pf_core::{Communicator, JacobianAssembler, Real, SolutionVector};

use crate::config::NewtonConfig;
use crate::criterion::ConvergenceCriterion;
use crate::error::{SolverError, SolverResult};
use crate::linear::LinearSolver;
use crate::model::NonlinearModel;
use crate::progress::{FailureReport, IterationReport, ProgressSink};
use crate::state::IterationState;

/// Smallest admissible line-search step-length factor.
const LAMBDA_MIN: Real = 0.125;

pub struct NewtonController<C: Communicator> {
    config: NewtonConfig,
    criterion: ConvergenceCriterion,
    comm: C,
}

impl<C: Communicator> NewtonController<C> {
    pub fn new(config: NewtonConfig, comm: C) -> SolverResult<Self> {
        config.validate()?;
        let criterion = ConvergenceCriterion::from_config(&config)?;
        Ok(Self {
            config,
            criterion,
            comm,
        })
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    pub fn criterion(&self) -> ConvergenceCriterion {
        self.criterion
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Reset the iteration state for a fresh solve. No other side effects.
    pub fn begin_solve(&self, state: &mut IterationState) {
        *state = IterationState::new();
    }

    /// Snapshot the metrics of the previous iteration before the current
    /// one overwrites them; the last-chance rule and the line search
    /// compare against these.
    pub fn begin_iteration(&self, state: &mut IterationState) {
        state.last_shift = state.shift;
        state.last_reduction = state.reduction;
        state.switched = false;
    }

    /// Whether another iteration should be done.
    ///
    /// Always true for the first two iterations; a lucky initial guess must
    /// not pass as convergence. At the iteration cap the solve continues
    /// only if the active metric improved at least fourfold in the last
    /// step.
    pub fn should_proceed(&self, state: &IterationState) -> bool {
        if state.num_steps < 2 {
            return true;
        }
        if self.has_converged(state) {
            return false;
        }
        if state.num_steps >= self.config.max_iterations {
            return if self.criterion.uses_shift() {
                state.shift * 4.0 < state.last_shift
            } else {
                state.reduction * 4.0 < state.last_reduction
            };
        }
        true
    }

    /// Whether the configured criterion combination is satisfied.
    ///
    /// A pending primary-variable switch defers convergence: the unknowns
    /// changed meaning this iteration, so the metrics do not apply yet.
    pub fn has_converged(&self, state: &IterationState) -> bool {
        if state.switched {
            return false;
        }
        let shift_ok = state.shift <= self.config.max_relative_shift;
        let reduction_ok = state.reduction <= self.config.residual_reduction;
        self.criterion.is_met(shift_ok, reduction_ok)
    }

    /// Solve `J * delta = residual` through the external oracle.
    ///
    /// On the first iteration the Euclidean norm of `residual` (summed over
    /// all ranks) becomes the denominator of the reduction metric. The
    /// converged flag is reduced collectively so that every rank either
    /// proceeds or fails together.
    pub fn solve_linear_system<L: LinearSolver>(
        &self,
        linear: &mut L,
        jacobian: &DMatrix<Real>,
        residual: &DVector<Real>,
        state: &mut IterationState,
    ) -> SolverResult<SolutionVector> {
        if state.num_steps == 0 {
            let norm2 = self.comm.sum_real(residual.norm_squared());
            // a zero initial residual would make every reduction 0/0; with
            // a unit denominator an exactly solved system still converges
            state.initial_residual = if norm2 > 0.0 { norm2.sqrt() } else { 1.0 };
            debug!(
                initial_residual = state.initial_residual,
                "recorded initial residual norm"
            );
        }

        let outcome = match linear.solve(jacobian, residual) {
            Ok(outcome) => outcome,
            Err(e) => {
                // let the other ranks observe this rank's failure before
                // propagating it
                self.comm.and_bool(false);
                return Err(e);
            }
        };

        let converged_everywhere = self.comm.and_bool(outcome.converged);
        if !outcome.converged {
            return Err(SolverError::LinearSolveFailure {
                what: format!("no convergence after {} iterations", outcome.iterations),
            });
        }
        if !converged_everywhere {
            return Err(SolverError::LinearSolveFailure {
                what: "no convergence on a cooperating process".into(),
            });
        }

        Ok(SolutionVector::from_flat(&outcome.delta)?)
    }

    /// Apply the Newton update and refresh the convergence metrics.
    ///
    /// Computes the shift metric (when needed by the criterion or the
    /// partial-reassembly heuristic), refreshes the reassembly colors, and
    /// either takes the full step or backtracks via line search.
    pub fn update<M: NonlinearModel>(
        &self,
        model: &mut M,
        assembler: &mut dyn JacobianAssembler,
        u_current: &mut SolutionVector,
        u_last: &SolutionVector,
        delta: &SolutionVector,
        state: &mut IterationState,
    ) -> SolverResult<()> {
        if u_last.num_dofs() != delta.num_dofs() {
            return Err(SolverError::NumericalProblem {
                what: format!(
                    "update increment has {} DOFs but the solution has {}",
                    delta.num_dofs(),
                    u_last.num_dofs()
                ),
            });
        }

        if self.criterion.uses_shift() || self.config.enable_partial_reassemble {
            state.shift = self.compute_shift(model, u_last, delta);
        }

        if self.config.enable_partial_reassemble {
            let min_tol = 1e-2 * self.config.max_relative_shift;
            let max_tol = 1e1 * self.config.max_relative_shift;
            let reassemble_tol = min_tol.max(max_tol.min(state.shift / 1e4));
            assembler.update_discrepancy(u_last, delta);
            assembler.compute_colors(reassemble_tol);
        }

        if self.config.use_line_search {
            self.line_search_update(model, u_current, u_last, delta, state)
        } else {
            *u_current = SolutionVector::updated(u_last, delta, 1.0);
            if self.criterion.uses_residual() {
                state.reduction =
                    self.residual_norm(model, u_current)? / state.initial_residual;
            }
            Ok(())
        }
    }

    /// Close the iteration: bump the counter and report progress.
    pub fn end_iteration(&self, state: &mut IterationState, sink: &mut dyn ProgressSink) {
        state.num_steps += 1;

        let report = IterationReport {
            iteration: state.num_steps,
            shift: self.criterion.uses_shift().then_some(state.shift),
            reduction: self.criterion.uses_residual().then_some(state.reduction),
        };
        info!(
            iteration = state.num_steps,
            shift = state.shift,
            reduction = state.reduction,
            switched = state.switched,
            "newton iteration done"
        );
        if self.comm.rank() == 0 {
            sink.iteration_done(&report);
        }
    }

    /// Called by the driver when the solve gave up.
    ///
    /// Forces full reassembly for the next attempt and poisons the step
    /// count to twice the target so the next step-size suggestion shrinks.
    pub fn on_failure(
        &self,
        state: &mut IterationState,
        assembler: &mut dyn JacobianAssembler,
        sink: &mut dyn ProgressSink,
    ) {
        let report = FailureReport {
            iterations: state.num_steps,
            criterion: self.criterion,
            shift: state.shift,
            max_relative_shift: self.config.max_relative_shift,
            reduction: state.reduction,
            residual_reduction: self.config.residual_reduction,
        };
        warn!(
            iterations = state.num_steps,
            shift = state.shift,
            reduction = state.reduction,
            "newton solve failed"
        );
        if self.comm.rank() == 0 {
            sink.solve_failed(&report);
        }

        assembler.reassemble_all();
        state.num_steps = self.config.target_iterations * 2;
    }

    /// Called by the driver once the solve converged.
    pub fn on_success(&self, assembler: &mut dyn JacobianAssembler) {
        if self.config.enable_jacobian_recycling {
            assembler.set_matrix_reusable(true);
        } else {
            assembler.reassemble_all();
        }
    }

    /// Suggest the next time-step size from the iteration count of the
    /// finished solve: aggressive shrinking above the target count,
    /// conservative growth below it.
    pub fn suggest_next_dt(&self, state: &IterationState, previous_dt: Real) -> Real {
        let target = self.config.target_iterations as Real;
        let steps = state.num_steps as Real;
        if state.num_steps > self.config.target_iterations {
            let percent = (steps - target) / target;
            previous_dt / (1.0 + percent)
        } else {
            let percent = (target - steps) / target;
            previous_dt * (1.0 + percent / 1.2)
        }
    }

    fn compute_shift<M: NonlinearModel>(
        &self,
        model: &M,
        u_last: &SolutionVector,
        delta: &SolutionVector,
    ) -> Real {
        let local = u_last
            .blocks()
            .par_iter()
            .zip(delta.blocks().par_iter())
            .map(|(prev, d)| model.relative_shift_at_dof(prev, &(prev - d)))
            .reduce(|| 0.0, Real::max);
        self.comm.max_real(local)
    }

    fn residual_norm<M: NonlinearModel>(
        &self,
        model: &mut M,
        u: &SolutionVector,
    ) -> SolverResult<Real> {
        let local = model.global_residual(u)?;
        Ok(self.comm.sum_real(local * local).sqrt())
    }

    /// Backtracking update: halve the step length until the residual
    /// improves on the previous iteration, accepting unconditionally at the
    /// floor. Terminates after at most four trial factors
    /// (1.0, 0.5, 0.25, 0.125).
    fn line_search_update<M: NonlinearModel>(
        &self,
        model: &mut M,
        u_current: &mut SolutionVector,
        u_last: &SolutionVector,
        delta: &SolutionVector,
        state: &mut IterationState,
    ) -> SolverResult<()> {
        let mut lambda: Real = 1.0;
        loop {
            *u_current = SolutionVector::updated(u_last, delta, lambda);
            state.reduction =
                self.residual_norm(model, u_current)? / state.initial_residual;

            if state.reduction < state.last_reduction || lambda <= LAMBDA_MIN {
                debug!(
                    lambda,
                    reduction = state.reduction,
                    last_reduction = state.last_reduction,
                    "accepted line-search step"
                );
                return Ok(());
            }

            lambda /= 2.0;
        }
    }
}
