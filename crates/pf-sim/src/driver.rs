//! The Newton driver: one nonlinear solve through the controller protocol.
//!
//! The driver owns the loop the controller's protocol methods are called
//! from, in their fixed order, and wires the primary-variable switch in
//! after every update. On any failure the caller's solution vector and
//! presence field are rolled back to their pre-solve state before the error
//! propagates.

use pf_core::{Communicator, JacobianAssembler, Real, SolutionVector};
use pf_solver::{
    IterationState, LinearSolver, NewtonConfig, NewtonController, NonlinearModel, ProgressSink,
    SolverError,
};
use pf_switch::{PresenceField, PrimaryVariableSwitch, StateEvaluator};

use crate::error::SimResult;

/// The collaborators of one nonlinear solve.
pub struct Problem<'a, M, E, L> {
    pub model: &'a mut M,
    pub evaluator: &'a E,
    pub linear: &'a mut L,
    pub assembler: &'a mut dyn JacobianAssembler,
    pub sink: &'a mut dyn ProgressSink,
}

/// Summary of a converged nonlinear solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub iterations: u32,
    pub shift: Real,
    pub reduction: Real,
    /// Whether any DOF changed its presence tag during this solve.
    pub switched_any: bool,
}

pub struct NewtonDriver<C: Communicator> {
    controller: NewtonController<C>,
    switch: PrimaryVariableSwitch<C>,
}

impl<C: Communicator + Clone> NewtonDriver<C> {
    pub fn new(config: NewtonConfig, comm: C) -> SimResult<Self> {
        Ok(Self {
            controller: NewtonController::new(config, comm.clone())?,
            switch: PrimaryVariableSwitch::new(comm),
        })
    }
}

impl<C: Communicator> NewtonDriver<C> {
    pub fn from_parts(
        controller: NewtonController<C>,
        switch: PrimaryVariableSwitch<C>,
    ) -> Self {
        Self { controller, switch }
    }

    pub fn controller(&self) -> &NewtonController<C> {
        &self.controller
    }

    /// Run one nonlinear solve to convergence or failure.
    ///
    /// On success the solution holds the converged iterate. On failure the
    /// solution and the presence tags are rolled back, the controller's
    /// failure hook has run (for recoverable errors), and the caller
    /// decides whether to shrink the step and retry.
    pub fn solve<M, E, L>(
        &self,
        problem: &mut Problem<'_, M, E, L>,
        u: &mut SolutionVector,
        presence: &mut PresenceField,
        state: &mut IterationState,
    ) -> SimResult<SolveReport>
    where
        M: NonlinearModel,
        E: StateEvaluator,
        L: LinearSolver,
    {
        let u_entry = u.clone();
        self.controller.begin_solve(state);

        match self.iterate(problem, u, presence, state) {
            Ok(report) => Ok(report),
            Err(e) => {
                *u = u_entry;
                presence.reset_to_old();
                if e.is_recoverable() {
                    self.controller
                        .on_failure(state, problem.assembler, problem.sink);
                }
                Err(e)
            }
        }
    }

    fn iterate<M, E, L>(
        &self,
        problem: &mut Problem<'_, M, E, L>,
        u: &mut SolutionVector,
        presence: &mut PresenceField,
        state: &mut IterationState,
    ) -> SimResult<SolveReport>
    where
        M: NonlinearModel,
        E: StateEvaluator,
        L: LinearSolver,
    {
        let mut switched_any = false;

        while self.controller.should_proceed(state) {
            self.controller.begin_iteration(state);

            let (jacobian, residual) = problem.model.assemble(u, problem.assembler)?;
            let delta = self.controller.solve_linear_system(
                problem.linear,
                &jacobian,
                &residual,
                state,
            )?;

            let u_last = u.clone();
            self.controller
                .update(problem.model, problem.assembler, u, &u_last, &delta, state)?;

            // the unknowns may change meaning here; a switch defers
            // convergence to the next iteration
            state.switched = self.switch.update_static_data(
                u,
                presence,
                problem.evaluator,
                problem.assembler,
            )?;
            switched_any |= state.switched;

            self.controller.end_iteration(state, problem.sink);
        }

        if self.controller.has_converged(state) {
            Ok(SolveReport {
                iterations: state.num_steps,
                shift: state.shift,
                reduction: state.reduction,
                switched_any,
            })
        } else {
            Err(SolverError::IterationsExceeded {
                max_iterations: self.controller.config().max_iterations,
                what: format!("gave up after {} iterations", state.num_steps),
            }
            .into())
        }
    }
}
