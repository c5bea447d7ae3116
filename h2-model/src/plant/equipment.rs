use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Process stages of the facility that carry a throughput and a nameplate capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./equipment.ts")]
pub enum Equipment {
    /// Splits water into hydrogen; first stage of the chain.
    #[schema(rename = "electrolyser")]
    #[serde(rename = "electrolyser")]
    Electrolyser,
    /// Compresses gaseous hydrogen before liquefaction or storage.
    #[schema(rename = "compressor")]
    #[serde(rename = "compressor")]
    Compressor,
    /// Liquefies hydrogen for sale.
    #[schema(rename = "liquefier")]
    #[serde(rename = "liquefier")]
    Liquefier,
    /// Converts stored gaseous hydrogen back into exported power.
    #[schema(rename = "fuel_cell")]
    #[serde(rename = "fuel_cell")]
    FuelCell,
}

impl Equipment {
    pub const ALL: [Equipment; 4] = [
        Equipment::Electrolyser,
        Equipment::Compressor,
        Equipment::Liquefier,
        Equipment::FuelCell,
    ];

    /// Stages that draw power in the main energy balance. The fuel cell is
    /// settled on its own export ledger.
    pub const CONSUMERS: [Equipment; 3] = [
        Equipment::Electrolyser,
        Equipment::Compressor,
        Equipment::Liquefier,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Equipment::Electrolyser => "electrolyser",
            Equipment::Compressor => "compressor",
            Equipment::Liquefier => "liquefier",
            Equipment::FuelCell => "fuel_cell",
        }
    }
}

/// On/off state of the liquefier in one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./equipment.ts")]
pub enum LiquefierState {
    #[default]
    Off,
    On,
}

impl LiquefierState {
    /// Reads a solved binary indicator. Solvers return binaries with a small
    /// tolerance, so anything at or above one half counts as on.
    pub fn from_indicator(value: f64) -> Self {
        if value >= 0.5 {
            LiquefierState::On
        } else {
            LiquefierState::Off
        }
    }

    pub fn flag(&self) -> f64 {
        match self {
            LiquefierState::Off => 0.0,
            LiquefierState::On => 1.0,
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, LiquefierState::On)
    }
}

/// Change of liquefier state between two consecutive steps.
///
/// The signed value is the first difference of the on/off flag:
/// `Start` (+1, OFF to ON), `Stop` (-1, ON to OFF) and `Hold` (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./equipment.ts")]
pub enum LiquefierTransition {
    Start,
    Stop,
    #[default]
    Hold,
}

impl LiquefierTransition {
    pub fn between(previous: LiquefierState, next: LiquefierState) -> Self {
        match (previous, next) {
            (LiquefierState::Off, LiquefierState::On) => LiquefierTransition::Start,
            (LiquefierState::On, LiquefierState::Off) => LiquefierTransition::Stop,
            _ => LiquefierTransition::Hold,
        }
    }

    pub fn signed(&self) -> i8 {
        match self {
            LiquefierTransition::Start => 1,
            LiquefierTransition::Stop => -1,
            LiquefierTransition::Hold => 0,
        }
    }

    /// Decodes a solved integer transition variable. Values outside {-1, 0, 1}
    /// (after rounding) are not a valid transition.
    pub fn from_signed(value: f64) -> Option<Self> {
        match value.round() as i64 {
            1 => Some(LiquefierTransition::Start),
            -1 => Some(LiquefierTransition::Stop),
            0 => Some(LiquefierTransition::Hold),
            _ => None,
        }
    }

    /// The (transition-up, transition-down) indicator pair for this transition.
    pub fn indicators(&self) -> (bool, bool) {
        match self {
            LiquefierTransition::Start => (true, false),
            LiquefierTransition::Stop => (false, true),
            LiquefierTransition::Hold => (false, false),
        }
    }
}
