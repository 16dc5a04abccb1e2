//! Phase-presence primary-variable switch for multiphase flow.
//!
//! When a phase vanishes or appears at a degree of freedom, the primary
//! variables stored there change meaning: a saturation slot becomes a mole
//! fraction or vice versa. This crate owns that state machine: the per-DOF
//! presence tags with their timestep lifecycle, the data-driven transition
//! table, and the detect-and-apply pass the Newton driver runs after every
//! update. The physics behind the decisions (saturations, mole fractions)
//! is an external collaborator reached through the volume-variables
//! oracle traits.

pub mod error;
pub mod oracle;
pub mod phases;
pub mod presence;
pub mod switch;
pub mod table;

pub use error::{SwitchError, SwitchResult};
pub use oracle::{StateEvaluator, TabulatedVolumeVariables, VolumeVariables};
pub use phases::{Component, Phase, PhasePresence};
pub use presence::PresenceField;
pub use switch::{
    FRACTION_APPEAR_BOUND, FRACTION_APPEAR_RELAXED, PrimaryVariableSwitch, SAT_VANISH_RELAXED,
    SAT_VANISH_THRESHOLD, appearance_measure, evaluate_triggers,
};
pub use table::{Assignment, TRANSITIONS, TransitionRule, Trigger, TriggerSet};
