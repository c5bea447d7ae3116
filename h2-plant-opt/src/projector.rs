use h2_model::{
    AnnualisedCapex, Equipment, FacilitySummary, LiquefierOperation, LiquefierState,
    LiquefierTransition, NameplateCapacities, OperationalRecord,
};

use crate::formulation::{CapacityTerms, RampEnvelope, SolvedProblem, Variant};

/// Per-step view of a solved window.
pub fn operational_trace(solved: &SolvedProblem) -> Vec<OperationalRecord> {
    (0..solved.window().horizon)
        .map(|t| operational_record(solved, t))
        .collect()
}

pub fn operational_record(solved: &SolvedProblem, t: usize) -> OperationalRecord {
    let window = solved.window();
    let vars = solved.variables();
    let efficiencies = &window.parameters.efficiencies;
    let value = |variable| solved.value(variable);

    let electrolyser_kg = value(vars.electrolyser[t]);
    let compressor_kg = value(vars.compressor[t]);
    let liquefier_kg = value(vars.liquefier[t]);
    let storage_inflow_kg = value(vars.storage_inflow[t]);
    let storage_outflow_kg = value(vars.storage_outflow[t]);

    OperationalRecord {
        step: t,
        price_per_kwh: window.series.price_per_kwh[t],

        grid_draw_kwh: value(vars.grid_draw[t]),
        grid_export_kwh: value(vars.grid_export[t]),
        solar_available_kwh: window.parameters.solar.capacity_kw
            * window.series.solar_availability[t],
        solar_consumed_kwh: value(vars.solar_consumed[t]),
        electrolyser_consumption_kwh: efficiencies.electrolysis_kwh_per_kg * electrolyser_kg,
        compressor_consumption_kwh: efficiencies.compression_kwh_per_kg * compressor_kg,
        liquefaction_consumption_kwh: efficiencies.liquefaction_kwh_per_kg * liquefier_kg,

        electrolyser_kg,
        compressor_kg,
        compressor_to_liquefier_kg: value(vars.compressor_to_liquefier[t]),
        liquefier_kg,
        fuel_cell_kg: vars.fuel_cell.as_ref().map_or(0.0, |fuel_cell| value(fuel_cell[t])),

        storage_level_kg: value(vars.storage_level[t]),
        storage_level_end_kg: value(vars.storage_level[t + 1]),
        storage_inflow_kg,
        storage_outflow_kg,
        storage_net_inflow_kg: storage_inflow_kg - storage_outflow_kg,
        storage_active: value(vars.storage_active[t]) >= 0.5,

        liquefier: liquefier_operation(solved, t),
        green_slack_kwh: vars.green_slack.map(value),
    }
}

fn liquefier_operation(solved: &SolvedProblem, t: usize) -> Option<LiquefierOperation> {
    let window = solved.window();
    let vars = solved.variables();
    let state_vars = vars.liquefier_state.as_ref()?;
    let capacities = vars.capacities.fixed()?;

    let state = LiquefierState::from_indicator(solved.value(state_vars.on_off[t]));
    let transition = if t == 0 {
        LiquefierTransition::from_signed(solved.value(state_vars.transition[t])).unwrap_or_default()
    } else {
        let previous = LiquefierState::from_indicator(solved.value(state_vars.on_off[t - 1]));
        LiquefierTransition::between(previous, state)
    };
    let envelope = RampEnvelope::new(
        capacities.liquefier_kg_per_hour,
        &window.parameters.liquefaction_ramp,
        window.constants.min_operating_ramp_fraction,
    );

    Some(LiquefierOperation {
        state,
        transition,
        transition_up: solved.value(state_vars.transition_up[t]) >= 0.5,
        transition_down: solved.value(state_vars.transition_down[t]) >= 0.5,
        minimum_startup_kg: envelope.minimum_startup,
    })
}

/// Capacities a solve ran with: solved values when sized, parameters otherwise.
pub fn solved_capacities(solved: &SolvedProblem) -> NameplateCapacities {
    match &solved.variables().capacities {
        CapacityTerms::Fixed(capacities) => capacities.clone(),
        sized @ CapacityTerms::Sized { .. } => {
            let of = |equipment| sized.variable(equipment).map_or(0.0, |v| solved.value(v));
            NameplateCapacities::new(
                of(Equipment::Electrolyser),
                of(Equipment::Compressor),
                of(Equipment::Liquefier),
                of(Equipment::FuelCell),
            )
        }
    }
}

/// Run totals over every step of the window.
pub fn facility_summary(solved: &SolvedProblem, trace: &[OperationalRecord]) -> FacilitySummary {
    let window = solved.window();
    let parameters = &window.parameters;
    let capacities = solved_capacities(solved);

    let h2_sold_kg: f64 = trace.iter().map(|record| record.liquefier_kg).sum();
    let solar_consumed_kwh: f64 = trace.iter().map(|record| record.solar_consumed_kwh).sum();
    let wholesale_consumed_kwh: f64 = trace.iter().map(|record| record.grid_draw_kwh).sum();
    let wholesale_cost: f64 = trace
        .iter()
        .map(|record| record.price_per_kwh * record.grid_draw_kwh)
        .sum();
    let wholesale_supplied_kwh: f64 = trace.iter().map(|record| record.grid_export_kwh).sum();
    let wholesale_revenue: f64 = trace
        .iter()
        .map(|record| record.price_per_kwh * record.grid_export_kwh)
        .sum();

    let capex = match window.variant {
        Variant::RollingHorizon => AnnualisedCapex::default(),
        Variant::CostMinimisation | Variant::ProfitMaximisation => {
            let annualised = |equipment: Equipment| {
                capacities.of(equipment) * window.constants.hours_per_day * parameters.capex.of(equipment)
            };
            AnnualisedCapex {
                electrolyser: annualised(Equipment::Electrolyser),
                compressor: annualised(Equipment::Compressor),
                liquefier: annualised(Equipment::Liquefier),
                fuel_cell: annualised(Equipment::FuelCell),
            }
        }
    };

    FacilitySummary {
        capacities,
        h2_sold_kg,
        h2_revenue: h2_sold_kg * parameters.h2_sales_price_per_kg,
        solar_consumed_kwh,
        solar_cost: solar_consumed_kwh * parameters.solar.ppa_price_per_kwh,
        wholesale_consumed_kwh,
        wholesale_cost,
        wholesale_supplied_kwh,
        wholesale_revenue,
        capex,
        green_slack_kwh: solved.variables().green_slack.map_or(0.0, |slack| solved.value(slack)),
        objective_value: solved.objective_value(),
    }
}
