use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::plant::equipment::{LiquefierState, LiquefierTransition};
use crate::plant::parameters::NameplateCapacities;

/// Liquefier operating state in one step. Only present where the on/off
/// logic is modelled (fixed-capacity dispatch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./record.ts")]
pub struct LiquefierOperation {
    pub state: LiquefierState,
    pub transition: LiquefierTransition,
    pub transition_up: bool,
    pub transition_down: bool,
    /// Throughput a start-up step has to reach (kg/h).
    pub minimum_startup_kg: f64,
}

/// Operation of the facility in a single time step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./record.ts")]
pub struct OperationalRecord {
    pub step: usize,
    pub price_per_kwh: f64,

    // Energy
    pub grid_draw_kwh: f64,
    pub grid_export_kwh: f64,
    pub solar_available_kwh: f64,
    pub solar_consumed_kwh: f64,
    pub electrolyser_consumption_kwh: f64,
    pub compressor_consumption_kwh: f64,
    pub liquefaction_consumption_kwh: f64,

    // Mass
    pub electrolyser_kg: f64,
    pub compressor_kg: f64,
    pub compressor_to_liquefier_kg: f64,
    pub liquefier_kg: f64,
    pub fuel_cell_kg: f64,

    // Storage
    /// Level at the start of the step.
    pub storage_level_kg: f64,
    /// Level at the end of the step, after inflow, outflow and fuel-cell draw.
    pub storage_level_end_kg: f64,
    pub storage_inflow_kg: f64,
    pub storage_outflow_kg: f64,
    pub storage_net_inflow_kg: f64,
    pub storage_active: bool,

    pub liquefier: Option<LiquefierOperation>,
    /// Green-constraint slack of the window this step was solved in (kWh).
    pub green_slack_kwh: Option<f64>,
}

impl OperationalRecord {
    pub fn total_consumption_kwh(&self) -> f64 {
        self.electrolyser_consumption_kwh
            + self.compressor_consumption_kwh
            + self.liquefaction_consumption_kwh
    }
}

/// Annualised capital cost per equipment type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./record.ts")]
pub struct AnnualisedCapex {
    pub electrolyser: f64,
    pub compressor: f64,
    pub liquefier: f64,
    pub fuel_cell: f64,
}

impl AnnualisedCapex {
    pub fn total(&self) -> f64 {
        self.electrolyser + self.compressor + self.liquefier + self.fuel_cell
    }
}

/// Facility and run totals of one solve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./record.ts")]
pub struct FacilitySummary {
    /// Capacities used: solved values in the sizing runs, parameters otherwise.
    pub capacities: NameplateCapacities,

    pub h2_sold_kg: f64,
    pub h2_revenue: f64,
    pub solar_consumed_kwh: f64,
    pub solar_cost: f64,
    pub wholesale_consumed_kwh: f64,
    pub wholesale_cost: f64,
    pub wholesale_supplied_kwh: f64,
    pub wholesale_revenue: f64,
    pub capex: AnnualisedCapex,
    pub green_slack_kwh: f64,

    /// Total cost for the cost-minimising run, total profit otherwise.
    pub objective_value: f64,
}

impl FacilitySummary {
    /// Revenue minus energy and capital costs, regardless of the run's sense.
    pub fn profit(&self) -> f64 {
        self.h2_revenue + self.wholesale_revenue
            - self.wholesale_cost
            - self.solar_cost
            - self.capex.total()
    }
}
