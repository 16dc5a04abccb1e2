//! Cutback retry of the adaptive time loop.

use nalgebra::{DMatrix, DVector};
use pf_core::{
    FullAssembly, JacobianAssembler, PrimaryVariables, Real, SerialComm, SolutionVector,
};
use pf_sim::{NewtonDriver, Problem, TimeLoopOptions, run_time_loop};
use pf_solver::{DenseLu, NewtonConfig, NonlinearModel, NullSink, SolverError, SolverResult};
use pf_switch::{
    Phase, PhasePresence, PresenceField, StateEvaluator, SwitchResult, TabulatedVolumeVariables,
};

/// Linear relaxation toward a fixed target; fails a scripted number of
/// assembly calls first.
struct FailingModel {
    target: PrimaryVariables,
    failures_left: usize,
}

impl NonlinearModel for FailingModel {
    fn assemble(
        &mut self,
        u: &SolutionVector,
        _assembler: &mut dyn JacobianAssembler,
    ) -> SolverResult<(DMatrix<Real>, DVector<Real>)> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(SolverError::NumericalProblem {
                what: "intentional retryable failure".into(),
            });
        }
        let n = u.num_dofs() * pf_core::NUM_EQ;
        let target = SolutionVector::constant(u.num_dofs(), self.target).as_flat();
        let residual = u.as_flat() - target;
        Ok((DMatrix::identity(n, n), residual))
    }

    fn global_residual(&mut self, u: &SolutionVector) -> SolverResult<Real> {
        let target = SolutionVector::constant(u.num_dofs(), self.target).as_flat();
        Ok((u.as_flat() - target).norm())
    }
}

/// Always reports a state comfortably inside the three-phase region.
struct InteriorEvaluator;

impl StateEvaluator for InteriorEvaluator {
    type Vars = TabulatedVolumeVariables;

    fn evaluate(
        &self,
        _dof: pf_core::DofIndex,
        _primary_vars: &PrimaryVariables,
        _presence: PhasePresence,
    ) -> SwitchResult<TabulatedVolumeVariables> {
        Ok(TabulatedVolumeVariables::new()
            .with_saturation(Phase::Water, 0.4)
            .with_saturation(Phase::Napl, 0.3)
            .with_saturation(Phase::Gas, 0.3))
    }
}

#[test]
fn cutback_retries_the_failed_step() {
    let mut model = FailingModel {
        target: PrimaryVariables::new(1.0, 0.5, 0.25),
        failures_left: 1,
    };
    let evaluator = InteriorEvaluator;
    let mut linear = DenseLu;
    let mut assembler = FullAssembly::new();
    let mut sink = NullSink;
    let mut problem = Problem {
        model: &mut model,
        evaluator: &evaluator,
        linear: &mut linear,
        assembler: &mut assembler,
        sink: &mut sink,
    };

    let driver = NewtonDriver::new(NewtonConfig::default(), SerialComm).unwrap();
    let mut u = SolutionVector::constant(1, PrimaryVariables::zeros());
    let mut presence = PresenceField::uniform(1, PhasePresence::ThreePhases);
    let opts = TimeLoopOptions {
        t_end: 0.2,
        dt_initial: 0.1,
        ..TimeLoopOptions::default()
    };

    let record =
        run_time_loop(&driver, &mut problem, &mut u, &mut presence, &opts).unwrap();

    let first = &record.steps[0];
    assert_eq!(first.retries, 1, "the failure is consumed by one retry");
    assert!(first.dt < opts.dt_initial, "the first step was cut back");
    assert!(record.t_final() >= opts.t_end - 1e-9);
    assert_eq!(model.failures_left, 0);
    for step in &record.steps[1..] {
        assert_eq!(step.retries, 0);
    }
    // the run converged onto the model's target
    for eq in 0..pf_core::NUM_EQ {
        assert!((u[0][eq] - model.target[eq]).abs() < 1e-7);
    }
}

#[test]
fn retries_exhaust_on_a_persistent_failure() {
    let mut model = FailingModel {
        target: PrimaryVariables::zeros(),
        failures_left: usize::MAX,
    };
    let evaluator = InteriorEvaluator;
    let mut linear = DenseLu;
    let mut assembler = FullAssembly::new();
    let mut sink = NullSink;
    let mut problem = Problem {
        model: &mut model,
        evaluator: &evaluator,
        linear: &mut linear,
        assembler: &mut assembler,
        sink: &mut sink,
    };

    let driver = NewtonDriver::new(NewtonConfig::default(), SerialComm).unwrap();
    let mut u = SolutionVector::constant(1, PrimaryVariables::zeros());
    let mut presence = PresenceField::uniform(1, PhasePresence::ThreePhases);
    let opts = TimeLoopOptions {
        t_end: 1.0,
        dt_initial: 0.1,
        max_retries: 2,
        ..TimeLoopOptions::default()
    };

    let err = run_time_loop(&driver, &mut problem, &mut u, &mut presence, &opts).unwrap_err();
    assert!(matches!(err, pf_sim::SimError::RetriesExhausted { .. }));
}

#[test]
fn cutback_below_dt_min_aborts() {
    let mut model = FailingModel {
        target: PrimaryVariables::zeros(),
        failures_left: usize::MAX,
    };
    let evaluator = InteriorEvaluator;
    let mut linear = DenseLu;
    let mut assembler = FullAssembly::new();
    let mut sink = NullSink;
    let mut problem = Problem {
        model: &mut model,
        evaluator: &evaluator,
        linear: &mut linear,
        assembler: &mut assembler,
        sink: &mut sink,
    };

    let driver = NewtonDriver::new(NewtonConfig::default(), SerialComm).unwrap();
    let mut u = SolutionVector::constant(1, PrimaryVariables::zeros());
    let mut presence = PresenceField::uniform(1, PhasePresence::ThreePhases);
    let opts = TimeLoopOptions {
        t_end: 1.0,
        dt_initial: 0.1,
        // the first halving already undershoots
        dt_min: 0.09,
        ..TimeLoopOptions::default()
    };

    let err = run_time_loop(&driver, &mut problem, &mut u, &mut presence, &opts).unwrap_err();
    assert!(matches!(err, pf_sim::SimError::StepSizeUnderflow { .. }));
}
