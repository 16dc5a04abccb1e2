//! Per-DOF phase-presence records and their timestep lifecycle.

use serde::{Deserialize, Serialize};

use crate::phases::PhasePresence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DofPresence {
    current: PhasePresence,
    old: PhasePresence,
    was_switched: bool,
}

/// Phase presence of every DOF, with the previous-timestep value retained
/// for rollback.
///
/// The `current` tag is mutated only by the primary-variable switch; `old`
/// advances to `current` when the outer driver accepts a timestep and
/// `current` falls back to `old` when it rejects one. `was_switched`
/// remembers whether the last switch pass fired at a DOF, the one-step
/// hysteresis that relaxes the thresholds on the next pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceField {
    dofs: Vec<DofPresence>,
}

impl PresenceField {
    /// Initialize from the per-DOF initial condition; `old` starts equal to
    /// `current`.
    pub fn new(initial: &[PhasePresence]) -> Self {
        Self {
            dofs: initial
                .iter()
                .map(|&tag| DofPresence {
                    current: tag,
                    old: tag,
                    was_switched: false,
                })
                .collect(),
        }
    }

    /// A field with the same initial tag at every DOF.
    pub fn uniform(num_dofs: usize, tag: PhasePresence) -> Self {
        Self::new(&vec![tag; num_dofs])
    }

    pub fn num_dofs(&self) -> usize {
        self.dofs.len()
    }

    /// Presence of a DOF in the current or the old (previous timestep)
    /// solution.
    pub fn presence(&self, dof: usize, old_sol: bool) -> PhasePresence {
        if old_sol {
            self.dofs[dof].old
        } else {
            self.dofs[dof].current
        }
    }

    pub fn current(&self, dof: usize) -> PhasePresence {
        self.dofs[dof].current
    }

    pub fn old(&self, dof: usize) -> PhasePresence {
        self.dofs[dof].old
    }

    pub fn was_switched(&self, dof: usize) -> bool {
        self.dofs[dof].was_switched
    }

    /// Record the outcome of one switch evaluation at a DOF.
    pub(crate) fn record(&mut self, dof: usize, new: PhasePresence, fired: bool) {
        self.dofs[dof].current = new;
        self.dofs[dof].was_switched = fired;
    }

    /// Reset every DOF to its previous-timestep tag, discarding the
    /// switches of a rejected timestep.
    pub fn reset_to_old(&mut self) {
        for dof in &mut self.dofs {
            dof.current = dof.old;
            dof.was_switched = false;
        }
    }

    /// Accept the timestep: the current tags become the rollback point.
    pub fn advance(&mut self) {
        for dof in &mut self.dofs {
            dof.old = dof.current;
            dof.was_switched = false;
        }
    }

    /// Overwrite one DOF's full record, e.g. when restoring a saved run.
    pub fn restore(&mut self, dof: usize, current: PhasePresence, old: PhasePresence, was_switched: bool) {
        self.dofs[dof] = DofPresence {
            current,
            old,
            was_switched,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::PhasePresence::*;

    #[test]
    fn rollback_restores_old_tags() {
        let mut field = PresenceField::uniform(2, ThreePhases);
        field.record(0, WaterNapl, true);
        assert_eq!(field.current(0), WaterNapl);
        assert_eq!(field.old(0), ThreePhases);
        assert!(field.was_switched(0));

        field.reset_to_old();
        assert_eq!(field.current(0), ThreePhases);
        assert!(!field.was_switched(0));
        assert_eq!(field.current(1), ThreePhases);
    }

    #[test]
    fn advance_promotes_current_tags() {
        let mut field = PresenceField::uniform(1, ThreePhases);
        field.record(0, WaterGas, true);
        field.advance();
        assert_eq!(field.old(0), WaterGas);
        assert!(!field.was_switched(0));

        // a later rollback now lands on the accepted tag
        field.record(0, GasOnly, true);
        field.reset_to_old();
        assert_eq!(field.current(0), WaterGas);
    }

    #[test]
    fn presence_selects_current_or_old() {
        let mut field = PresenceField::uniform(1, WaterOnly);
        field.record(0, WaterGas, true);
        assert_eq!(field.presence(0, false), WaterGas);
        assert_eq!(field.presence(0, true), WaterOnly);
    }
}
