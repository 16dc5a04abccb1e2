//! Newton controller for implicit multiphase flow solves.
//!
//! This crate owns the iteration-control layer of a nonlinear solve: when
//! to keep iterating, how to update the solution between iterations, and
//! what to tell the Jacobian assembler afterwards. The discretization, the
//! linear solver, and the volume-variables evaluation are external
//! collaborators reached through the [`NonlinearModel`] and
//! [`LinearSolver`] traits.

pub mod config;
pub mod controller;
pub mod criterion;
pub mod error;
pub mod linear;
pub mod model;
pub mod progress;
pub mod state;

pub use config::NewtonConfig;
pub use controller::NewtonController;
pub use criterion::ConvergenceCriterion;
pub use error::{SolverError, SolverResult};
pub use linear::{DenseLu, LinearOutcome, LinearSolver};
pub use model::NonlinearModel;
pub use progress::{FailureReport, IterationReport, NullSink, ProgressSink};
pub use state::IterationState;
