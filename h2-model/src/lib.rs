pub mod market;
pub mod plant;

pub use market::series::MarketSeries;
pub use plant::equipment::{Equipment, LiquefierState, LiquefierTransition};
pub use plant::parameters::{
    CapitalCosts, FacilityParameters, GreenHydrogenRule, NameplateCapacities, OfftakeTarget,
    ProcessEfficiencies, RampLimits, SolarSupply,
};
pub use plant::record::{AnnualisedCapex, FacilitySummary, LiquefierOperation, OperationalRecord};
pub use plant::state::StateVector;
