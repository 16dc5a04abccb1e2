//! pf-core: stable foundation for phaseflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - dof (compact typed index into per-DOF storage)
//! - solution (per-DOF primary-variable blocks and the block solution vector)
//! - comm (collective reductions over cooperating processes)
//! - assembly (Jacobian assembler collaborator contract)
//! - error (shared error types)

pub mod assembly;
pub mod comm;
pub mod dof;
pub mod error;
pub mod numeric;
pub mod solution;

// Re-exports: nice ergonomics for downstream crates
pub use assembly::{FullAssembly, JacobianAssembler};
pub use comm::{Communicator, ScriptedComm, SerialComm};
pub use dof::DofIndex;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use solution::{
    NUM_EQ, PRESSURE_IDX, PrimaryVariables, SWITCH_1, SWITCH_2, SolutionVector, relative_shift,
};
