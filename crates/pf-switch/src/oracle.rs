//! Volume-variables oracle contracts.
//!
//! The switch never computes physics itself; it reads saturations and mole
//! fractions off quantities derived by an external evaluator from the
//! primary-variable tuple and the presence tag. For absent phases the
//! evaluator supplies the hypothetical values the appearance tests need
//! (e.g. the mole-fraction sum a gas phase would have if it formed).

use pf_core::{DofIndex, PrimaryVariables, Real};

use crate::error::SwitchResult;
use crate::phases::{Component, Phase, PhasePresence};

/// Derived physical quantities at one DOF.
pub trait VolumeVariables {
    fn saturation(&self, phase: Phase) -> Real;

    fn mole_fraction(&self, phase: Phase, component: Component) -> Real;
}

/// Evaluates volume variables for one DOF.
///
/// Evaluation may fail when a constitutive relation is out of its validity
/// range for a freshly guessed primary variable; the switch pass aggregates
/// such failures instead of aborting at the first one.
pub trait StateEvaluator {
    type Vars: VolumeVariables;

    fn evaluate(
        &self,
        dof: DofIndex,
        primary_vars: &PrimaryVariables,
        presence: PhasePresence,
    ) -> SwitchResult<Self::Vars>;
}

/// A dense table of precomputed quantities.
///
/// Useful for models that derive their secondary variables up front, and as
/// the stub oracle in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TabulatedVolumeVariables {
    saturations: [Real; 3],
    mole_fractions: [[Real; 3]; 3],
}

impl TabulatedVolumeVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_saturation(mut self, phase: Phase, value: Real) -> Self {
        self.saturations[phase.index()] = value;
        self
    }

    pub fn with_mole_fraction(mut self, phase: Phase, component: Component, value: Real) -> Self {
        self.mole_fractions[phase.index()][component.index()] = value;
        self
    }
}

impl VolumeVariables for TabulatedVolumeVariables {
    fn saturation(&self, phase: Phase) -> Real {
        self.saturations[phase.index()]
    }

    fn mole_fraction(&self, phase: Phase, component: Component) -> Real {
        self.mole_fractions[phase.index()][component.index()]
    }
}
