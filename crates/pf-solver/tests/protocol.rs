//! The full controller protocol driven the way an outer driver would.

use nalgebra::{DMatrix, DVector};
use pf_core::{
    FullAssembly, JacobianAssembler, PrimaryVariables, Real, ScriptedComm, SerialComm,
    SolutionVector,
};
use pf_solver::{
    DenseLu, IterationReport, IterationState, NewtonConfig, NewtonController, NonlinearModel,
    NullSink, ProgressSink, SolverError, SolverResult,
};

/// Decoupled quadratic system: `R_i(u) = u_i^2 - c`, exact root `sqrt(c)`.
struct QuadraticModel {
    c: Real,
}

impl NonlinearModel for QuadraticModel {
    fn assemble(
        &mut self,
        u: &SolutionVector,
        _assembler: &mut dyn JacobianAssembler,
    ) -> SolverResult<(DMatrix<Real>, DVector<Real>)> {
        let flat = u.as_flat();
        let n = flat.len();
        let residual = DVector::from_fn(n, |i, _| flat[i] * flat[i] - self.c);
        let jacobian = DMatrix::from_fn(n, n, |i, j| if i == j { 2.0 * flat[i] } else { 0.0 });
        Ok((jacobian, residual))
    }

    fn global_residual(&mut self, u: &SolutionVector) -> SolverResult<Real> {
        let flat = u.as_flat();
        Ok(flat.map(|x| x * x - self.c).norm())
    }
}

/// Constant residual with identity Jacobian: Newton wanders forever.
struct HopelessModel;

impl NonlinearModel for HopelessModel {
    fn assemble(
        &mut self,
        u: &SolutionVector,
        _assembler: &mut dyn JacobianAssembler,
    ) -> SolverResult<(DMatrix<Real>, DVector<Real>)> {
        let n = u.num_dofs() * pf_core::NUM_EQ;
        Ok((DMatrix::identity(n, n), DVector::from_element(n, 1.0)))
    }

    fn global_residual(&mut self, u: &SolutionVector) -> SolverResult<Real> {
        let n = u.num_dofs() * pf_core::NUM_EQ;
        Ok((n as Real).sqrt())
    }
}

struct CollectingSink {
    lines: Vec<String>,
}

impl ProgressSink for CollectingSink {
    fn iteration_done(&mut self, report: &IterationReport) {
        self.lines.push(report.to_string());
    }
}

fn drive<M: NonlinearModel, C: pf_core::Communicator>(
    controller: &NewtonController<C>,
    model: &mut M,
    u: &mut SolutionVector,
    sink: &mut dyn ProgressSink,
) -> Result<IterationState, SolverError> {
    let mut state = IterationState::new();
    let mut assembler = FullAssembly::new();
    let mut linear = DenseLu;

    controller.begin_solve(&mut state);
    while controller.should_proceed(&state) {
        controller.begin_iteration(&mut state);
        let (jacobian, residual) = model.assemble(u, &mut assembler)?;
        let delta = controller.solve_linear_system(&mut linear, &jacobian, &residual, &mut state)?;
        let u_last = u.clone();
        controller.update(model, &mut assembler, u, &u_last, &delta, &mut state)?;
        controller.end_iteration(&mut state, sink);
    }
    Ok(state)
}

#[test]
fn quadratic_system_converges_to_the_root() {
    let config = NewtonConfig {
        enable_residual_criterion: true,
        ..NewtonConfig::default()
    };
    let controller = NewtonController::new(config, SerialComm).unwrap();
    let mut model = QuadraticModel { c: 4.0 };
    let mut u = SolutionVector::constant(2, PrimaryVariables::new(3.0, 3.0, 3.0));
    let mut sink = CollectingSink { lines: Vec::new() };

    let state = drive(&controller, &mut model, &mut u, &mut sink).unwrap();

    assert!(controller.has_converged(&state));
    assert!(state.num_steps >= 2, "minimum two iterations");
    for block in u.iter() {
        for eq in 0..pf_core::NUM_EQ {
            assert!((block[eq] - 2.0).abs() < 1e-7);
        }
    }
    // one progress line per iteration, reporting both active metrics
    assert_eq!(sink.lines.len(), state.num_steps as usize);
    assert!(sink.lines[0].contains("relative shift"));
    assert!(sink.lines[0].contains("residual reduction"));
}

#[test]
fn hopeless_system_gives_up_at_the_iteration_cap() {
    let controller = NewtonController::new(NewtonConfig::default(), SerialComm).unwrap();
    let mut model = HopelessModel;
    let mut u = SolutionVector::constant(1, PrimaryVariables::zeros());

    let state = drive(&controller, &mut model, &mut u, &mut NullSink).unwrap();

    assert!(!controller.has_converged(&state));
    assert!(!controller.should_proceed(&state));
    assert_eq!(state.num_steps, controller.config().max_iterations);
}

#[test]
fn singular_jacobian_surfaces_as_linear_solve_failure() {
    let controller = NewtonController::new(NewtonConfig::default(), SerialComm).unwrap();
    let mut state = IterationState::new();
    let jacobian = DMatrix::zeros(3, 3);
    let residual = DVector::from_element(3, 1.0);

    let err = controller
        .solve_linear_system(&mut DenseLu, &jacobian, &residual, &mut state)
        .unwrap_err();
    assert!(matches!(err, SolverError::LinearSolveFailure { .. }));
    assert!(err.is_recoverable());
}

#[test]
fn remote_linear_failure_is_detected_locally() {
    // the cooperating rank reports a failed solve; this rank's solve is
    // fine but must fail identically
    let comm = ScriptedComm {
        peer_and: false,
        ..ScriptedComm::default()
    };
    let controller = NewtonController::new(NewtonConfig::default(), comm).unwrap();
    let mut state = IterationState::new();
    let jacobian = DMatrix::identity(3, 3);
    let residual = DVector::from_element(3, 1.0);

    let err = controller
        .solve_linear_system(&mut DenseLu, &jacobian, &residual, &mut state)
        .unwrap_err();
    match err {
        SolverError::LinearSolveFailure { what } => {
            assert!(what.contains("cooperating process"));
        }
        other => panic!("expected LinearSolveFailure, got {other:?}"),
    }
}

#[test]
fn remote_shift_keeps_the_solve_running() {
    // locally the update changed nothing, but another rank still moves
    let comm = ScriptedComm {
        peer_max: 1.0,
        ..ScriptedComm::default()
    };
    let controller = NewtonController::new(NewtonConfig::default(), comm).unwrap();
    let mut model = QuadraticModel { c: 4.0 };
    let mut assembler = FullAssembly::new();
    let mut state = IterationState::new();
    state.num_steps = 5;
    state.initial_residual = 1.0;

    let u_last = SolutionVector::constant(1, PrimaryVariables::new(2.0, 2.0, 2.0));
    let delta = SolutionVector::constant(1, PrimaryVariables::zeros());
    let mut u = u_last.clone();

    controller
        .update(&mut model, &mut assembler, &mut u, &u_last, &delta, &mut state)
        .unwrap();

    assert_eq!(state.shift, 1.0);
    assert!(!controller.has_converged(&state));
    assert!(controller.should_proceed(&state));
}
