//! The phase-presence transition table.
//!
//! Each presence tag watches a small set of triggers: a present phase whose
//! saturation drops to the disappearance threshold vanishes, an absent
//! phase whose hypothetical mole-fraction measure exceeds the appearance
//! bound forms. The exact set of fired triggers selects a rule, which names
//! the new tag and how the two switchable primary-variable slots are
//! re-expressed in the new tag's convention.
//!
//! Keeping this as data makes the decision logic testable without any
//! physics behind it; the rule lookup is a pure function.

use pf_core::Real;

use crate::phases::{Component, Phase, PhasePresence};

/// One observable event at a DOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Saturation of a present phase at or below the disappearance
    /// threshold.
    Vanishes(Phase),
    /// Hypothetical mole-fraction measure of an absent phase above the
    /// appearance bound.
    Appears(Phase),
}

const fn trigger_bit(trigger: Trigger) -> u8 {
    match trigger {
        Trigger::Vanishes(Phase::Water) => 1 << 0,
        Trigger::Vanishes(Phase::Napl) => 1 << 1,
        Trigger::Vanishes(Phase::Gas) => 1 << 2,
        Trigger::Appears(Phase::Water) => 1 << 3,
        Trigger::Appears(Phase::Napl) => 1 << 4,
        Trigger::Appears(Phase::Gas) => 1 << 5,
    }
}

/// A set of fired triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerSet(u8);

impl TriggerSet {
    pub const EMPTY: TriggerSet = TriggerSet(0);

    pub const fn of(triggers: &[Trigger]) -> Self {
        let mut mask = 0u8;
        let mut i = 0;
        while i < triggers.len() {
            mask |= trigger_bit(triggers[i]);
            i += 1;
        }
        TriggerSet(mask)
    }

    pub const fn with(self, trigger: Trigger) -> Self {
        TriggerSet(self.0 | trigger_bit(trigger))
    }

    pub const fn contains(self, trigger: Trigger) -> bool {
        self.0 & trigger_bit(trigger) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// How a switchable slot is filled when a rule applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Assignment {
    /// Read a mole fraction off the volume variables.
    MoleFraction(Phase, Component),
    /// Read a saturation off the volume variables.
    Saturation(Phase),
    /// A literal seed value, for phases that just appeared or vanished.
    Seed(Real),
    /// Leave the stored value untouched.
    Keep,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionRule {
    pub from: PhasePresence,
    /// The exact fired set this rule responds to.
    pub when: TriggerSet,
    pub to: PhasePresence,
    pub switch1: Assignment,
    pub switch2: Assignment,
}

use self::Assignment::{Keep, MoleFraction, Saturation, Seed};
use self::Trigger::{Appears, Vanishes};
use crate::phases::Component as C;
use crate::phases::Phase as P;
use crate::phases::PhasePresence::*;

/// The complete transition table.
///
/// From `ThreePhases`, simultaneous disappearances resolve with gas taking
/// priority over water over NAPL, hence the explicit two-trigger rows. For
/// the other tags every reachable trigger combination is listed; fired sets
/// without a row (e.g. every condition at once from `WaterGas`) leave the
/// tag unchanged.
pub static TRANSITIONS: &[TransitionRule] = &[
    // three phases: one of them vanishes
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Gas)]),
        to: WaterNapl,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: Keep,
    },
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Gas), Vanishes(P::Water)]),
        to: WaterNapl,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: Keep,
    },
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Gas), Vanishes(P::Napl)]),
        to: WaterNapl,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: Keep,
    },
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Water)]),
        to: GasNapl,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: Keep,
    },
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Water), Vanishes(P::Napl)]),
        to: GasNapl,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: Keep,
    },
    TransitionRule {
        from: ThreePhases,
        when: TriggerSet::of(&[Vanishes(P::Napl)]),
        to: WaterGas,
        switch1: Keep,
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
    // water only: gas and/or NAPL appear
    TransitionRule {
        from: WaterOnly,
        when: TriggerSet::of(&[Appears(P::Gas)]),
        to: WaterGas,
        switch1: Seed(0.9999),
        switch2: Seed(0.0001),
    },
    TransitionRule {
        from: WaterOnly,
        when: TriggerSet::of(&[Appears(P::Gas), Appears(P::Napl)]),
        to: ThreePhases,
        switch1: Seed(0.9999),
        switch2: Seed(0.0001),
    },
    TransitionRule {
        from: WaterOnly,
        when: TriggerSet::of(&[Appears(P::Napl)]),
        to: WaterNapl,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: Seed(0.0001),
    },
    // gas+napl: water appears and/or NAPL vanishes
    TransitionRule {
        from: GasNapl,
        when: TriggerSet::of(&[Appears(P::Water)]),
        to: ThreePhases,
        switch1: Seed(0.0001),
        switch2: Saturation(P::Napl),
    },
    TransitionRule {
        from: GasNapl,
        when: TriggerSet::of(&[Appears(P::Water), Vanishes(P::Napl)]),
        to: WaterGas,
        switch1: Seed(0.0001),
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
    TransitionRule {
        from: GasNapl,
        when: TriggerSet::of(&[Vanishes(P::Napl)]),
        to: GasOnly,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
    // water+napl: gas appears and/or NAPL vanishes
    TransitionRule {
        from: WaterNapl,
        when: TriggerSet::of(&[Appears(P::Gas)]),
        to: ThreePhases,
        switch1: Saturation(P::Water),
        switch2: Saturation(P::Napl),
    },
    TransitionRule {
        from: WaterNapl,
        when: TriggerSet::of(&[Appears(P::Gas), Vanishes(P::Napl)]),
        to: WaterGas,
        switch1: Saturation(P::Water),
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
    TransitionRule {
        from: WaterNapl,
        when: TriggerSet::of(&[Vanishes(P::Napl)]),
        to: WaterOnly,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: MoleFraction(P::Water, C::Contaminant),
    },
    // gas only: water and/or NAPL appear
    TransitionRule {
        from: GasOnly,
        when: TriggerSet::of(&[Appears(P::Water)]),
        to: WaterGas,
        switch1: Seed(0.0001),
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
    TransitionRule {
        from: GasOnly,
        when: TriggerSet::of(&[Appears(P::Water), Appears(P::Napl)]),
        to: ThreePhases,
        switch1: Seed(0.0001),
        switch2: Seed(0.0001),
    },
    TransitionRule {
        from: GasOnly,
        when: TriggerSet::of(&[Appears(P::Napl)]),
        to: GasNapl,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: Seed(0.0001),
    },
    // water+gas: NAPL may appear while water or gas may vanish
    TransitionRule {
        from: WaterGas,
        when: TriggerSet::of(&[Appears(P::Napl), Vanishes(P::Water)]),
        to: GasNapl,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: Seed(0.0001),
    },
    TransitionRule {
        from: WaterGas,
        when: TriggerSet::of(&[Appears(P::Napl)]),
        to: ThreePhases,
        switch1: Saturation(P::Water),
        switch2: Seed(0.0),
    },
    TransitionRule {
        from: WaterGas,
        when: TriggerSet::of(&[Vanishes(P::Gas)]),
        to: WaterOnly,
        switch1: MoleFraction(P::Water, C::Air),
        switch2: MoleFraction(P::Water, C::Contaminant),
    },
    TransitionRule {
        from: WaterGas,
        when: TriggerSet::of(&[Vanishes(P::Water)]),
        to: GasOnly,
        switch1: MoleFraction(P::Gas, C::Water),
        switch2: MoleFraction(P::Gas, C::Contaminant),
    },
];

/// The distinct triggers a tag watches.
pub const fn candidate_triggers(tag: PhasePresence) -> &'static [Trigger] {
    match tag {
        ThreePhases => &[Vanishes(P::Gas), Vanishes(P::Water), Vanishes(P::Napl)],
        WaterOnly => &[Appears(P::Gas), Appears(P::Napl)],
        GasNapl => &[Appears(P::Water), Vanishes(P::Napl)],
        WaterNapl => &[Appears(P::Gas), Vanishes(P::Napl)],
        GasOnly => &[Appears(P::Water), Appears(P::Napl)],
        WaterGas => &[Appears(P::Napl), Vanishes(P::Gas), Vanishes(P::Water)],
    }
}

/// The rule responding to an exact fired set, if any.
pub fn lookup(from: PhasePresence, fired: TriggerSet) -> Option<&'static TransitionRule> {
    if fired.is_empty() {
        return None;
    }
    TRANSITIONS
        .iter()
        .find(|rule| rule.from == from && rule.when == fired)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const ALL_TRIGGERS: [Trigger; 6] = [
        Vanishes(P::Water),
        Vanishes(P::Napl),
        Vanishes(P::Gas),
        Appears(P::Water),
        Appears(P::Napl),
        Appears(P::Gas),
    ];

    proptest! {
        #[test]
        fn lookup_matches_exactly_or_not_at_all(tag_idx in 0usize..6, mask in 0u8..64) {
            let tag = PhasePresence::ALL[tag_idx];
            let mut fired = TriggerSet::EMPTY;
            for (i, &t) in ALL_TRIGGERS.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    fired = fired.with(t);
                }
            }
            if let Some(rule) = lookup(tag, fired) {
                prop_assert_eq!(rule.from, tag);
                prop_assert_eq!(rule.when, fired);
                prop_assert_ne!(rule.to, tag);
            }
        }
    }
}
