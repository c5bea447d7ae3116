use good_lp::Expression;
use h2_model::Equipment;

use crate::formulation::variables::VariableSet;
use crate::formulation::{Variant, Window};

/// Objective of the window. Costs are minimised in the cost run; the other
/// two variants maximise profit.
pub fn build_objective(window: &Window, vars: &VariableSet) -> Expression {
    let mut objective = Expression::default();

    match window.variant {
        Variant::CostMinimisation => {
            objective += energy_cost(window, vars);
            objective += capital_cost(window, vars, &Equipment::CONSUMERS);
        }
        Variant::ProfitMaximisation => {
            objective += revenue(window, vars);
            objective -= energy_cost(window, vars);
            objective -= capital_cost(window, vars, &Equipment::ALL);
        }
        Variant::RollingHorizon => {
            objective += revenue(window, vars);
            objective -= energy_cost(window, vars);
            if let Some(slack) = vars.green_slack {
                objective -= window.constants.slack_penalty * slack;
            }
        }
    }

    objective
}

fn energy_cost(window: &Window, vars: &VariableSet) -> Expression {
    let ppa_price = window.parameters.solar.ppa_price_per_kwh;
    let mut cost = Expression::default();
    for t in 0..window.horizon {
        cost += window.series.price_per_kwh[t] * vars.grid_draw[t];
        cost += ppa_price * vars.solar_consumed[t];
    }
    cost
}

fn revenue(window: &Window, vars: &VariableSet) -> Expression {
    let h2_price = window.parameters.h2_sales_price_per_kg;
    let mut revenue = Expression::default();
    for t in 0..window.horizon {
        revenue += window.series.price_per_kwh[t] * vars.grid_export[t];
        revenue += h2_price * vars.liquefier[t];
    }
    revenue
}

/// Annualised capex on sized capacities; capacities are per hour, rates per day.
fn capital_cost(window: &Window, vars: &VariableSet, equipment: &[Equipment]) -> Expression {
    let hours = window.constants.hours_per_day;
    let mut cost = Expression::default();
    for &item in equipment {
        if let Some(capacity) = vars.capacities.variable(item) {
            cost += hours * window.parameters.capex.of(item) * capacity;
        }
    }
    cost
}
