//! The primary-variable switch pass.
//!
//! After every Newton update the switch inspects the physical state implied
//! by the current solution at every DOF. Where the implied phase
//! configuration became inadmissible it swaps the presence tag, re-expresses
//! the stored primary-variable tuple in the new tag's convention, and marks
//! the Jacobian assembler dirty there. The per-DOF decisions are
//! independent; the global outcome is reduced collectively so every rank
//! agrees on whether another iteration is mandatory.

use tracing::{debug, warn};

use pf_core::{Communicator, DofIndex, JacobianAssembler, Real, SolutionVector, SWITCH_1, SWITCH_2};

use crate::error::{SwitchError, SwitchResult};
use crate::oracle::{StateEvaluator, VolumeVariables};
use crate::phases::{Component, Phase, PhasePresence};
use crate::presence::PresenceField;
use crate::table::{Assignment, Trigger, TriggerSet, candidate_triggers, lookup};

/// Saturation at or below which a present phase disappears.
pub const SAT_VANISH_THRESHOLD: Real = 0.0;
/// Relaxed disappearance threshold for DOFs that switched on the previous
/// pass; the hysteresis band against chattering between adjacent states.
pub const SAT_VANISH_RELAXED: Real = -0.01;
/// Mole-fraction measure above which an absent phase appears.
pub const FRACTION_APPEAR_BOUND: Real = 1.0;
/// Relaxed appearance bound for DOFs that switched on the previous pass.
pub const FRACTION_APPEAR_RELAXED: Real = 1.02;

/// The mole-fraction measure whose excess over one signals that `phase`
/// would form: the full composition sum for a hypothetical gas phase, the
/// dominant component's fraction for the liquid phases.
pub fn appearance_measure(vars: &impl VolumeVariables, phase: Phase) -> Real {
    match phase {
        Phase::Gas => {
            vars.mole_fraction(Phase::Gas, Component::Water)
                + vars.mole_fraction(Phase::Gas, Component::Air)
                + vars.mole_fraction(Phase::Gas, Component::Contaminant)
        }
        Phase::Napl => vars.mole_fraction(Phase::Napl, Component::Contaminant),
        Phase::Water => vars.mole_fraction(Phase::Water, Component::Water),
    }
}

/// Evaluate every trigger the tag watches, with thresholds relaxed for a
/// DOF that switched on the previous pass.
pub fn evaluate_triggers(
    tag: PhasePresence,
    vars: &impl VolumeVariables,
    relaxed: bool,
) -> TriggerSet {
    let sat_min = if relaxed {
        SAT_VANISH_RELAXED
    } else {
        SAT_VANISH_THRESHOLD
    };
    let frac_max = if relaxed {
        FRACTION_APPEAR_RELAXED
    } else {
        FRACTION_APPEAR_BOUND
    };

    let mut fired = TriggerSet::EMPTY;
    for &trigger in candidate_triggers(tag) {
        let hit = match trigger {
            Trigger::Vanishes(phase) => vars.saturation(phase) <= sat_min,
            Trigger::Appears(phase) => appearance_measure(vars, phase) > frac_max,
        };
        if hit {
            fired = fired.with(trigger);
        }
    }
    fired
}

fn apply_assignment(assignment: Assignment, stored: Real, vars: &impl VolumeVariables) -> Real {
    match assignment {
        Assignment::MoleFraction(phase, component) => vars.mole_fraction(phase, component),
        Assignment::Saturation(phase) => vars.saturation(phase),
        Assignment::Seed(value) => value,
        Assignment::Keep => stored,
    }
}

pub struct PrimaryVariableSwitch<C: Communicator> {
    comm: C,
}

impl<C: Communicator> PrimaryVariableSwitch<C> {
    pub fn new(comm: C) -> Self {
        Self { comm }
    }

    /// Detect and apply switches at every DOF.
    ///
    /// Returns whether any DOF switched, on any rank; a `true` obliges the
    /// Newton controller to iterate again because the unknowns changed
    /// meaning. Every DOF is visited even after an evaluation failure;
    /// failures are aggregated, agreed on collectively, and surfaced as one
    /// recoverable numerical problem at the end of the pass.
    pub fn update_static_data<E: StateEvaluator>(
        &self,
        solution: &mut SolutionVector,
        presence: &mut PresenceField,
        evaluator: &E,
        assembler: &mut dyn JacobianAssembler,
    ) -> SwitchResult<bool> {
        debug_assert_eq!(solution.num_dofs(), presence.num_dofs());

        let mut switched = false;
        let mut failures: Vec<(usize, String)> = Vec::new();

        for dof in 0..solution.num_dofs() {
            let tag = presence.current(dof);
            let vars = match evaluator.evaluate(DofIndex(dof), &solution[dof], tag) {
                Ok(vars) => vars,
                Err(e) => {
                    warn!(dof, error = %e, "volume-variables evaluation failed");
                    failures.push((dof, e.to_string()));
                    continue;
                }
            };
            if self.switch_dof(solution, presence, &vars, dof) {
                assembler.mark_dof_dirty(DofIndex(dof));
                switched = true;
            }
        }

        let all_succeeded = self.comm.and_bool(failures.is_empty());
        if !all_succeeded {
            let what = match failures.first() {
                Some((dof, msg)) => format!(
                    "{} DOF(s) failed the volume-variables update; first at dof {dof}: {msg}",
                    failures.len()
                ),
                None => "a cooperating process failed to update its static data".to_string(),
            };
            return Err(SwitchError::NumericalProblem { what });
        }

        Ok(self.comm.or_bool(switched))
    }

    /// Evaluate and, if a rule fires, apply the switch at one DOF. Returns
    /// whether the presence tag changed.
    fn switch_dof(
        &self,
        solution: &mut SolutionVector,
        presence: &mut PresenceField,
        vars: &impl VolumeVariables,
        dof: usize,
    ) -> bool {
        let tag = presence.current(dof);
        let fired = evaluate_triggers(tag, vars, presence.was_switched(dof));

        let Some(rule) = lookup(tag, fired) else {
            presence.record(dof, tag, !fired.is_empty());
            return false;
        };

        debug!(
            dof,
            from = tag.as_str(),
            to = rule.to.as_str(),
            "phase presence switch"
        );

        let block = &mut solution[dof];
        block[SWITCH_1] = apply_assignment(rule.switch1, block[SWITCH_1], vars);
        block[SWITCH_2] = apply_assignment(rule.switch2, block[SWITCH_2], vars);
        presence.record(dof, rule.to, true);
        true
    }
}
