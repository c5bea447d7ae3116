use good_lp::{Expression, IntoAffineExpression};
use h2_model::Equipment;

use crate::formulation::liquefaction::RampEnvelope;
use crate::formulation::variables::VariableSet;
use crate::formulation::{ConstraintGroup, Row, Variant, Window};

/// Builds every row of the window in group order.
pub fn build_rows(window: &Window, vars: &VariableSet) -> Vec<Row> {
    let mut rows = Vec::new();
    solar_ceiling(window, vars, &mut rows);
    energy_balance(window, vars, &mut rows);
    fuel_cell_export(window, vars, &mut rows);
    green_hydrogen(window, vars, &mut rows);
    equipment_capacity(vars, &mut rows);
    liquefaction(window, vars, &mut rows);
    mass_balance(vars, &mut rows);
    storage(window, vars, &mut rows);
    initial_conditions(window, vars, &mut rows);
    offtake(window, vars, &mut rows);
    rows
}

fn solar_ceiling(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let capacity = window.parameters.solar.capacity_kw;
    for t in 0..window.horizon {
        let available = capacity * window.series.solar_availability[t];
        rows.push(Row::le(
            ConstraintGroup::SolarCeiling,
            Some(t),
            vars.solar_consumed[t],
            available,
        ));
    }
}

fn energy_balance(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let efficiencies = &window.parameters.efficiencies;
    for t in 0..window.horizon {
        let consumption = efficiencies.electrolysis_kwh_per_kg * vars.electrolyser[t]
            + efficiencies.compression_kwh_per_kg * vars.compressor[t]
            + efficiencies.liquefaction_kwh_per_kg * vars.liquefier[t];
        rows.push(Row::eq(
            ConstraintGroup::EnergyBalance,
            Some(t),
            vars.grid_draw[t] + vars.solar_consumed[t],
            consumption,
        ));
    }
}

/// Exported energy comes from the fuel cell only. Without one it is pinned to zero.
fn fuel_cell_export(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let efficiency = window.parameters.efficiencies.fuel_cell_kwh_per_kg;
    for t in 0..window.horizon {
        rows.push(Row::eq(
            ConstraintGroup::FuelCellExport,
            Some(t),
            vars.grid_export[t],
            efficiency * vars.fuel_cell_at(t),
        ));
    }
}

fn green_hydrogen(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let green = &window.parameters.green;
    let carried = window.carried.unwrap_or_default();

    let grid_total: Expression =
        vars.grid_draw.iter().copied().sum::<Expression>() + carried.cumulative_grid_kwh;
    let emissions = green.grid_emission_factor_kg_co2_per_kwh * grid_total;

    let hydrogen: Expression = match window.variant {
        Variant::CostMinimisation => window.parameters.offtake.total_kg().into_expression(),
        Variant::ProfitMaximisation | Variant::RollingHorizon => {
            (0..window.horizon)
                .map(|t| vars.liquefier[t] + vars.fuel_cell_at(t))
                .sum::<Expression>()
                + carried.cumulative_h2_kg
        }
    };
    let mut allowance = green.threshold_kg_co2_per_kg_h2 * hydrogen;
    if let Some(slack) = vars.green_slack {
        allowance += green.grid_emission_factor_kg_co2_per_kwh * slack;
    }

    rows.push(Row::le(
        ConstraintGroup::GreenHydrogen,
        None,
        emissions,
        allowance,
    ));
}

fn equipment_capacity(vars: &VariableSet, rows: &mut Vec<Row>) {
    for equipment in Equipment::ALL {
        let Some(throughput) = vars.throughput(equipment) else {
            continue;
        };
        let capacity = vars.capacities.expression(equipment);
        for (t, &flow) in throughput.iter().enumerate() {
            rows.push(Row::le(
                ConstraintGroup::EquipmentCapacity,
                Some(t),
                flow,
                capacity.clone(),
            ));
        }
    }
}

fn liquefaction(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    match (&vars.liquefier_state, vars.capacities.fixed()) {
        (Some(state), Some(capacities)) => {
            let envelope = RampEnvelope::new(
                capacities.liquefier_kg_per_hour,
                &window.parameters.liquefaction_ramp,
                window.constants.min_operating_ramp_fraction,
            );
            let big_m = window.constants.big_m;
            let liquefier = &vars.liquefier;

            for t in 1..window.horizon {
                let rise = liquefier[t] - liquefier[t - 1];
                let up = state.transition_up[t];
                rows.push(Row::le(
                    ConstraintGroup::LiquefactionRamp,
                    Some(t),
                    rise.clone(),
                    envelope.minimum_startup * up + envelope.max_rise * (state.on_off[t] - up),
                ));
                rows.push(Row::ge(
                    ConstraintGroup::LiquefactionRamp,
                    Some(t),
                    rise,
                    envelope.minimum_startup * up,
                ));
                rows.push(Row::le(
                    ConstraintGroup::LiquefactionRamp,
                    Some(t),
                    liquefier[t - 1] - liquefier[t],
                    envelope.max_fall,
                ));
            }

            for t in 0..window.horizon {
                let on = state.on_off[t];
                let delta = state.transition[t];
                let up = state.transition_up[t];
                let down = state.transition_down[t];
                let step = Some(t);
                let group = ConstraintGroup::LiquefactionState;

                rows.push(Row::le(group, step, liquefier[t], big_m * on));
                rows.push(Row::le(group, step, on, big_m * liquefier[t]));

                rows.push(Row::ge(group, step, delta, -1.0));
                rows.push(Row::le(group, step, delta, 1.0));
                if t > 0 {
                    rows.push(Row::eq(group, step, on - state.on_off[t - 1], delta));
                }

                rows.push(Row::le(group, step, delta, up));
                rows.push(Row::ge(group, step, delta, 2.0 * up - 1.0));
                rows.push(Row::le(group, step, -1.0 * delta, down));
                rows.push(Row::ge(group, step, -1.0 * delta, 2.0 * down - 1.0));
            }
        }
        _ => {
            let ramp = &window.parameters.liquefaction_ramp;
            let capacity = vars.capacities.expression(Equipment::Liquefier);
            let liquefier = &vars.liquefier;
            for t in 1..window.horizon {
                rows.push(Row::le(
                    ConstraintGroup::LiquefactionRamp,
                    Some(t),
                    liquefier[t] - liquefier[t - 1],
                    ramp.max_up_fraction * capacity.clone(),
                ));
                rows.push(Row::le(
                    ConstraintGroup::LiquefactionRamp,
                    Some(t),
                    liquefier[t - 1] - liquefier[t],
                    ramp.max_down_fraction * capacity.clone(),
                ));
            }
        }
    }
}

fn mass_balance(vars: &VariableSet, rows: &mut Vec<Row>) {
    for t in 0..vars.horizon {
        let group = ConstraintGroup::MassBalance;
        rows.push(Row::eq(group, Some(t), vars.electrolyser[t], vars.compressor[t]));
        rows.push(Row::eq(
            group,
            Some(t),
            vars.compressor[t],
            vars.compressor_to_liquefier[t] + vars.storage_inflow[t],
        ));
        rows.push(Row::eq(
            group,
            Some(t),
            vars.liquefier[t],
            vars.compressor_to_liquefier[t] + vars.storage_outflow[t],
        ));
    }
}

fn storage(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let big_m = window.constants.big_m;
    for t in 0..vars.horizon {
        rows.push(Row::eq(
            ConstraintGroup::StorageRecursion,
            Some(t),
            vars.storage_level[t + 1],
            vars.storage_level[t] + vars.storage_inflow[t]
                - vars.storage_outflow[t]
                - vars.fuel_cell_at(t),
        ));

        let active = vars.storage_active[t];
        let group = ConstraintGroup::StorageActivation;
        rows.push(Row::le(
            group,
            Some(t),
            vars.compressor[t] - vars.liquefier[t],
            big_m * active,
        ));
        rows.push(Row::le(group, Some(t), vars.storage_inflow[t], big_m * active));
        rows.push(Row::le(group, Some(t), vars.storage_outflow[t], big_m * active));
    }
}

/// Sizing runs start from empty storage. A rolling window pins the level at
/// the start of its committed step and the liquefier throughput of step 0 to
/// the carried-in state; the level before step 0 stays free.
fn initial_conditions(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let group = ConstraintGroup::InitialConditions;
    match window.carried {
        Some(carried) => {
            rows.push(Row::eq(
                group,
                Some(1),
                vars.storage_level[1],
                carried.storage_level_kg,
            ));
            rows.push(Row::eq(
                group,
                Some(0),
                vars.liquefier[0],
                carried.previous_liquefaction_kg,
            ));
        }
        None => rows.push(Row::eq(group, Some(0), vars.storage_level[0], 0.0)),
    }
}

fn offtake(window: &Window, vars: &VariableSet, rows: &mut Vec<Row>) {
    let offtake = &window.parameters.offtake;
    if window.variant != Variant::CostMinimisation || !offtake.enforced {
        return;
    }
    rows.push(Row::eq(
        ConstraintGroup::Offtake,
        None,
        vars.liquefier.iter().copied().sum::<Expression>(),
        offtake.total_kg(),
    ));
}
