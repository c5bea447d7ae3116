use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::plant::equipment::Equipment;

/// Solar plant contracted to the facility through a PPA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct SolarSupply {
    /// Peak capacity in kW. Multiplied by the per-step availability fraction
    /// to give the energy the facility may take in that step.
    pub capacity_kw: f64,
    /// PPA price paid per kWh actually consumed.
    pub ppa_price_per_kwh: f64,
}

impl Default for SolarSupply {
    fn default() -> Self {
        Self {
            capacity_kw: 1_500.0,
            ppa_price_per_kwh: 0.03,
        }
    }
}

/// Specific energy of each stage in kWh per kg of hydrogen handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct ProcessEfficiencies {
    pub electrolysis_kwh_per_kg: f64,
    pub compression_kwh_per_kg: f64,
    pub liquefaction_kwh_per_kg: f64,
    /// Energy exported per kg of hydrogen converted by the fuel cell.
    pub fuel_cell_kwh_per_kg: f64,
}

impl ProcessEfficiencies {
    pub fn of(&self, equipment: Equipment) -> f64 {
        match equipment {
            Equipment::Electrolyser => self.electrolysis_kwh_per_kg,
            Equipment::Compressor => self.compression_kwh_per_kg,
            Equipment::Liquefier => self.liquefaction_kwh_per_kg,
            Equipment::FuelCell => self.fuel_cell_kwh_per_kg,
        }
    }
}

impl Default for ProcessEfficiencies {
    fn default() -> Self {
        Self {
            electrolysis_kwh_per_kg: 55.0,
            compression_kwh_per_kg: 2.0,
            liquefaction_kwh_per_kg: 11.0,
            fuel_cell_kwh_per_kg: 16.0,
        }
    }
}

/// Liquefier ramp limits as fractions of nameplate capacity per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct RampLimits {
    pub max_up_fraction: f64,
    pub max_down_fraction: f64,
}

impl Default for RampLimits {
    fn default() -> Self {
        Self {
            max_up_fraction: 0.5,
            max_down_fraction: 0.5,
        }
    }
}

/// Emissions rule the produced hydrogen has to meet to count as green.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct GreenHydrogenRule {
    /// Allowed kg CO2 per kg of hydrogen produced.
    pub threshold_kg_co2_per_kg_h2: f64,
    /// Emission factor of grid electricity in kg CO2 per kWh.
    pub grid_emission_factor_kg_co2_per_kwh: f64,
}

impl Default for GreenHydrogenRule {
    fn default() -> Self {
        Self {
            threshold_kg_co2_per_kg_h2: 4.0,
            grid_emission_factor_kg_co2_per_kwh: 0.4,
        }
    }
}

/// Capital cost per kg/day of nameplate capacity, already annualised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct CapitalCosts {
    pub electrolyser_per_kg_day: f64,
    pub compressor_per_kg_day: f64,
    pub liquefier_per_kg_day: f64,
    pub fuel_cell_per_kg_day: f64,
}

impl CapitalCosts {
    pub fn of(&self, equipment: Equipment) -> f64 {
        match equipment {
            Equipment::Electrolyser => self.electrolyser_per_kg_day,
            Equipment::Compressor => self.compressor_per_kg_day,
            Equipment::Liquefier => self.liquefier_per_kg_day,
            Equipment::FuelCell => self.fuel_cell_per_kg_day,
        }
    }

    /// Returns a copy with the rate of one equipment type replaced.
    pub fn with(mut self, equipment: Equipment, per_kg_day: f64) -> Self {
        match equipment {
            Equipment::Electrolyser => self.electrolyser_per_kg_day = per_kg_day,
            Equipment::Compressor => self.compressor_per_kg_day = per_kg_day,
            Equipment::Liquefier => self.liquefier_per_kg_day = per_kg_day,
            Equipment::FuelCell => self.fuel_cell_per_kg_day = per_kg_day,
        }
        self
    }
}

impl Default for CapitalCosts {
    fn default() -> Self {
        Self {
            electrolyser_per_kg_day: 1.2,
            compressor_per_kg_day: 0.15,
            liquefier_per_kg_day: 0.6,
            fuel_cell_per_kg_day: 0.4,
        }
    }
}

/// Hourly throughput capacities in kg/h.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct NameplateCapacities {
    pub electrolyser_kg_per_hour: f64,
    pub compressor_kg_per_hour: f64,
    pub liquefier_kg_per_hour: f64,
    pub fuel_cell_kg_per_hour: f64,
}

impl NameplateCapacities {
    pub fn new(electrolyser: f64, compressor: f64, liquefier: f64, fuel_cell: f64) -> Self {
        Self {
            electrolyser_kg_per_hour: electrolyser,
            compressor_kg_per_hour: compressor,
            liquefier_kg_per_hour: liquefier,
            fuel_cell_kg_per_hour: fuel_cell,
        }
    }

    pub fn of(&self, equipment: Equipment) -> f64 {
        match equipment {
            Equipment::Electrolyser => self.electrolyser_kg_per_hour,
            Equipment::Compressor => self.compressor_kg_per_hour,
            Equipment::Liquefier => self.liquefier_kg_per_hour,
            Equipment::FuelCell => self.fuel_cell_kg_per_hour,
        }
    }

    /// Largest capacity over all equipment.
    pub fn largest(&self) -> f64 {
        Equipment::ALL
            .iter()
            .map(|&equipment| self.of(equipment))
            .fold(0.0, f64::max)
    }
}

/// Contracted hydrogen off-take used by the cost-minimising sizing run.
///
/// The target covers the whole horizon of the run, so with hourly steps
/// `num_days` is the horizon divided by 24. The default, one day of 1000 kg,
/// fits a 24-step run under the default capacity limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct OfftakeTarget {
    pub kg_per_day: f64,
    pub num_days: f64,
    /// If true the total liquefied hydrogen must equal the target exactly.
    /// If false the target only enters the green-hydrogen allowance.
    pub enforced: bool,
}

impl OfftakeTarget {
    pub fn total_kg(&self) -> f64 {
        self.kg_per_day * self.num_days
    }

    /// Whether a liquefier of `liquefier_kg_per_hour` can deliver the total
    /// within `hours`.
    pub fn reachable_within(&self, liquefier_kg_per_hour: f64, hours: f64) -> bool {
        self.total_kg() <= liquefier_kg_per_hour * hours
    }
}

impl Default for OfftakeTarget {
    fn default() -> Self {
        Self {
            kg_per_day: 1_000.0,
            num_days: 1.0,
            enforced: true,
        }
    }
}

/// Every constant describing the facility. Supplied by the caller and only
/// read by the optimisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./parameters.ts")]
#[serde(default)]
pub struct FacilityParameters {
    pub solar: SolarSupply,
    pub efficiencies: ProcessEfficiencies,
    pub liquefaction_ramp: RampLimits,
    pub green: GreenHydrogenRule,
    /// Fixed sales price per kg of liquefied hydrogen.
    pub h2_sales_price_per_kg: f64,
    pub capex: CapitalCosts,
    pub offtake: OfftakeTarget,
    /// Upper bounds on the capacity variables of the sizing runs. Without them
    /// the profit-maximising run may be unbounded.
    pub capacity_limits: Option<NameplateCapacities>,
}

impl Default for FacilityParameters {
    fn default() -> Self {
        Self {
            solar: SolarSupply::default(),
            efficiencies: ProcessEfficiencies::default(),
            liquefaction_ramp: RampLimits::default(),
            green: GreenHydrogenRule::default(),
            h2_sales_price_per_kg: 6.0,
            capex: CapitalCosts::default(),
            offtake: OfftakeTarget::default(),
            capacity_limits: Some(NameplateCapacities::new(100.0, 100.0, 100.0, 20.0)),
        }
    }
}
