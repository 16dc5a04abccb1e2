//! Phases, components, and the phase-presence tags.
//!
//! Three fluid phases (water as the wetting phase, NAPL as a nonwetting
//! liquid contaminant, and gas), each composed of up to three components. The
//! presence tag at a DOF records which phases are assumed present there and
//! thereby fixes the meaning of the two switchable primary-variable slots:
//!
//! | tag           | slot 1                | slot 2                  |
//! |---------------|-----------------------|-------------------------|
//! | `ThreePhases` | S_water               | S_napl                  |
//! | `WaterOnly`   | x_water^air           | x_water^contaminant     |
//! | `GasNapl`     | x_gas^water           | S_napl                  |
//! | `WaterNapl`   | x_water^air           | S_napl                  |
//! | `GasOnly`     | x_gas^water           | x_gas^contaminant       |
//! | `WaterGas`    | S_water               | x_gas^contaminant       |
//!
//! Slot 0 is always the gas-phase pressure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Water,
    Napl,
    Gas,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Water, Phase::Napl, Phase::Gas];

    /// Stable storage index of this phase.
    pub const fn index(self) -> usize {
        match self {
            Phase::Water => 0,
            Phase::Napl => 1,
            Phase::Gas => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Water => "water",
            Phase::Napl => "napl",
            Phase::Gas => "gas",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Water,
    Contaminant,
    Air,
}

impl Component {
    pub const ALL: [Component; 3] = [Component::Water, Component::Contaminant, Component::Air];

    pub const fn index(self) -> usize {
        match self {
            Component::Water => 0,
            Component::Contaminant => 1,
            Component::Air => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Component::Water => "water",
            Component::Contaminant => "contaminant",
            Component::Air => "air",
        }
    }
}

/// Which phases are assumed present at a DOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhasePresence {
    ThreePhases,
    WaterOnly,
    GasNapl,
    WaterNapl,
    GasOnly,
    WaterGas,
}

impl PhasePresence {
    pub const ALL: [PhasePresence; 6] = [
        PhasePresence::ThreePhases,
        PhasePresence::WaterOnly,
        PhasePresence::GasNapl,
        PhasePresence::WaterNapl,
        PhasePresence::GasOnly,
        PhasePresence::WaterGas,
    ];

    pub fn phase_is_present(self, phase: Phase) -> bool {
        match self {
            PhasePresence::ThreePhases => true,
            PhasePresence::WaterOnly => phase == Phase::Water,
            PhasePresence::GasNapl => phase == Phase::Gas || phase == Phase::Napl,
            PhasePresence::WaterNapl => phase == Phase::Water || phase == Phase::Napl,
            PhasePresence::GasOnly => phase == Phase::Gas,
            PhasePresence::WaterGas => phase == Phase::Water || phase == Phase::Gas,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PhasePresence::ThreePhases => "three phases",
            PhasePresence::WaterOnly => "water only",
            PhasePresence::GasNapl => "gas+napl",
            PhasePresence::WaterNapl => "water+napl",
            PhasePresence::GasOnly => "gas only",
            PhasePresence::WaterGas => "water+gas",
        }
    }
}
