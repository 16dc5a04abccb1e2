//! Outer driver for implicit multiphase flow solves.
//!
//! Ties the Newton controller and the primary-variable switch together:
//! the [`NewtonDriver`] runs one nonlinear solve through the controller
//! protocol with the switch wired in after every update, and
//! [`run_time_loop`] wraps it in an adaptive time loop with cutback retry
//! on recoverable failures.

pub mod driver;
pub mod error;
pub mod timeloop;

pub use driver::{NewtonDriver, Problem, SolveReport};
pub use error::{SimError, SimResult};
pub use timeloop::{StepRecord, TimeLoopOptions, TimeLoopRecord, run_time_loop};
