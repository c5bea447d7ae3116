use approx::assert_abs_diff_eq;
use h2_model::{
    CapitalCosts, Equipment, FacilityParameters, LiquefierState, LiquefierTransition,
    MarketSeries, NameplateCapacities, OperationalRecord, StateVector,
};
use h2_plant_opt::{
    FormulationConstants, HighsBackend, Problem, SolveStatus, run_cost_minimisation,
    run_profit_maximisation, run_rolling_window,
};

const TOLERANCE: f64 = 1e-5;

fn capacities() -> NameplateCapacities {
    NameplateCapacities::new(10.0, 10.0, 10.0, 2.0)
}

fn with_threshold(threshold: f64) -> FacilityParameters {
    let mut parameters = FacilityParameters::default();
    parameters.green.threshold_kg_co2_per_kg_h2 = threshold;
    parameters
}

fn assert_balanced(record: &OperationalRecord) {
    assert_abs_diff_eq!(record.electrolyser_kg, record.compressor_kg, epsilon = TOLERANCE);
    assert_abs_diff_eq!(
        record.compressor_kg,
        record.compressor_to_liquefier_kg + record.storage_inflow_kg,
        epsilon = TOLERANCE
    );
    assert_abs_diff_eq!(
        record.liquefier_kg,
        record.compressor_to_liquefier_kg + record.storage_outflow_kg,
        epsilon = TOLERANCE
    );
    assert_abs_diff_eq!(
        record.storage_level_end_kg,
        record.storage_level_kg + record.storage_inflow_kg
            - record.storage_outflow_kg
            - record.fuel_cell_kg,
        epsilon = TOLERANCE
    );
    assert_abs_diff_eq!(
        record.grid_draw_kwh + record.solar_consumed_kwh,
        record.total_consumption_kwh(),
        epsilon = 1e-4
    );
    assert!(record.storage_level_kg >= -TOLERANCE);
    assert!(record.storage_level_end_kg >= -TOLERANCE);
    assert!(record.solar_consumed_kwh <= record.solar_available_kwh + TOLERANCE);
}

#[test]
fn test_profit_maximisation_conserves_mass_and_energy() {
    let mut parameters = FacilityParameters::default();
    parameters.capex = CapitalCosts {
        electrolyser_per_kg_day: 0.01,
        compressor_per_kg_day: 0.01,
        liquefier_per_kg_day: 0.01,
        fuel_cell_per_kg_day: 0.01,
    };
    let series = MarketSeries::new(
        vec![0.0, 0.2, 0.6, 0.8, 0.4, 0.1],
        vec![0.02, 0.02, 0.04, 0.04, 0.03, 0.02],
    );
    let constants = FormulationConstants::default();
    let backend = HighsBackend::default();

    let problem = Problem::profit_maximisation(&parameters, &constants, &series, 6).unwrap();
    let solved = problem.solve(&backend).unwrap();
    assert!(solved.violations(TOLERANCE).is_empty());

    let outcome = run_profit_maximisation(&parameters, &constants, &series, 6, &backend).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.trace.len(), 6);
    for record in &outcome.trace {
        assert_balanced(record);
        assert!(record.liquefier_kg <= outcome.capacities.liquefier_kg_per_hour + TOLERANCE);
        assert!(record.fuel_cell_kg <= outcome.capacities.fuel_cell_kg_per_hour + TOLERANCE);
    }
    // first storage level is pinned to empty
    assert_abs_diff_eq!(outcome.trace[0].storage_level_kg, 0.0, epsilon = TOLERANCE);

    let summary = &outcome.summary;
    assert!(summary.h2_sold_kg > 1.0);
    let fuel_cell_kg: f64 = outcome.trace.iter().map(|record| record.fuel_cell_kg).sum();
    let green = &parameters.green;
    assert!(
        summary.wholesale_consumed_kwh * green.grid_emission_factor_kg_co2_per_kwh
            <= green.threshold_kg_co2_per_kg_h2 * (summary.h2_sold_kg + fuel_cell_kg) + 1e-4
    );
    assert_abs_diff_eq!(summary.profit(), outcome.objective_value, epsilon = 1e-4);
}

#[test]
fn test_zero_solar_flat_price_window() {
    // 68 kWh per kg at $0.05/kWh leaves a margin at $6/kg once the green row is loose
    let parameters = with_threshold(1_000.0);
    let constants = FormulationConstants::default();
    let series = MarketSeries::from_mwh_prices(vec![0.0; 3], &[50.0; 3]);
    let backend = HighsBackend::default();

    let solve = || {
        run_rolling_window(
            &parameters,
            &constants,
            &capacities(),
            &series,
            3,
            StateVector::initial(),
            &backend,
        )
        .unwrap()
    };
    let first = solve();
    let second = solve();

    assert_eq!(first.status, SolveStatus::Optimal);
    for record in &first.trace {
        assert_abs_diff_eq!(record.solar_consumed_kwh, 0.0, epsilon = TOLERANCE);
        assert_abs_diff_eq!(
            record.grid_draw_kwh,
            record.total_consumption_kwh(),
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(record.price_per_kwh, 0.05, epsilon = 1e-12);
        assert_balanced(record);
    }
    let grid_kwh: f64 = first.trace.iter().map(|record| record.grid_draw_kwh).sum();
    assert!(grid_kwh > 1.0);

    // start-up at the minimum operating point, then the largest rise allowed
    let capacity = capacities().liquefier_kg_per_hour;
    let startup = constants.min_operating_ramp_fraction * capacity;
    let ramped = (startup + parameters.liquefaction_ramp.max_up_fraction * capacity).min(capacity);
    assert_abs_diff_eq!(first.trace[0].liquefier_kg, 0.0, epsilon = TOLERANCE);
    assert_abs_diff_eq!(first.trace[1].liquefier_kg, startup, epsilon = 1e-3);
    assert_abs_diff_eq!(first.trace[2].liquefier_kg, ramped, epsilon = 1e-2);
    let start = first.committed.liquefier.clone().unwrap();
    assert_eq!(start.state, LiquefierState::On);
    assert_eq!(start.transition, LiquefierTransition::Start);

    assert_abs_diff_eq!(first.objective_value, second.objective_value, epsilon = 1e-9);

    let problem = Problem::rolling_window(
        &parameters,
        &constants,
        &capacities(),
        &series,
        3,
        StateVector::initial(),
    )
    .unwrap();
    let solved = problem.solve(&backend).unwrap();
    assert!(solved.violations(TOLERANCE).is_empty());
}

#[test]
fn test_green_threshold_binds() {
    let constants = FormulationConstants::default();
    let series = MarketSeries::constant(4, 0.0, 0.05);
    let backend = HighsBackend::default();
    let solve = |threshold: f64| {
        run_rolling_window(
            &with_threshold(threshold),
            &constants,
            &capacities(),
            &series,
            4,
            StateVector::initial(),
            &backend,
        )
        .unwrap()
    };

    let loose = solve(1_000.0);
    let tight = solve(0.0);

    // a zero-slack plan exists under the loose threshold, so no slack is used
    assert_eq!(loose.status, SolveStatus::Optimal);
    assert_abs_diff_eq!(loose.summary.green_slack_kwh, 0.0, epsilon = TOLERANCE);
    assert!(loose.summary.h2_sold_kg > 1.0);

    assert!(
        tight.summary.h2_sold_kg < loose.summary.h2_sold_kg - TOLERANCE
            || tight.summary.green_slack_kwh > TOLERANCE
    );
    assert!(tight.objective_value <= loose.objective_value + TOLERANCE);
}

#[test]
fn test_rolling_windows_continue_from_carried_state() {
    let parameters = with_threshold(1_000.0);
    let constants = FormulationConstants::default();
    let backend = HighsBackend::default();
    let full = MarketSeries::new(vec![0.0, 0.01, 0.02, 0.01], vec![0.05, 0.04, 0.06, 0.05]);

    let first_series = full.window(0, 3).unwrap();
    let first = run_rolling_window(
        &parameters,
        &constants,
        &capacities(),
        &first_series,
        3,
        StateVector::initial(),
        &backend,
    )
    .unwrap();

    let carried = first.next_state;
    assert_abs_diff_eq!(
        carried.cumulative_grid_kwh,
        first.committed.grid_draw_kwh,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        carried.storage_level_kg,
        first.trace[1].storage_level_end_kg,
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        carried.previous_liquefaction_kg,
        first.trace[1].liquefier_kg,
        epsilon = 1e-9
    );

    let second_series = full.window(1, 3).unwrap();
    let second = run_rolling_window(
        &parameters,
        &constants,
        &capacities(),
        &second_series,
        3,
        carried,
        &backend,
    )
    .unwrap();

    assert_abs_diff_eq!(
        second.trace[1].storage_level_kg,
        carried.storage_level_kg,
        epsilon = TOLERANCE
    );
    assert_abs_diff_eq!(
        second.trace[0].liquefier_kg,
        carried.previous_liquefaction_kg,
        epsilon = TOLERANCE
    );
    assert_abs_diff_eq!(
        second.next_state.cumulative_h2_kg,
        carried.cumulative_h2_kg + second.committed.liquefier_kg,
        epsilon = 1e-9
    );
    for record in first.trace.iter().chain(&second.trace) {
        assert_balanced(record);
    }
}

#[test]
fn test_higher_electrolyser_capex_never_lowers_cost() {
    let mut parameters = with_threshold(1_000.0);
    parameters.offtake.kg_per_day = 20.0;
    parameters.offtake.num_days = 1.0;
    parameters.offtake.enforced = true;
    let constants = FormulationConstants::default();
    let series = MarketSeries::new(vec![0.2, 0.6, 0.6, 0.2], vec![0.05; 4]);
    let backend = HighsBackend::default();

    let base = run_cost_minimisation(&parameters, &constants, &series, 4, &backend).unwrap();

    let mut dearer = parameters.clone();
    dearer.capex = parameters.capex.clone().with(
        Equipment::Electrolyser,
        parameters.capex.electrolyser_per_kg_day * 2.0,
    );
    let doubled = run_cost_minimisation(&dearer, &constants, &series, 4, &backend).unwrap();

    assert_abs_diff_eq!(base.summary.h2_sold_kg, 20.0, epsilon = 1e-4);
    assert_abs_diff_eq!(doubled.summary.h2_sold_kg, 20.0, epsilon = 1e-4);
    // allow for the solver's relative MIP gap
    assert!(doubled.objective_value >= base.objective_value * (1.0 - 1e-4));
    assert!(
        doubled.capacities.electrolyser_kg_per_hour
            <= base.capacities.electrolyser_kg_per_hour + 1e-2
    );
    assert_eq!(base.capacities.fuel_cell_kg_per_hour, 0.0);
    for record in &base.trace {
        assert_balanced(record);
    }
}

#[test]
fn test_unenforced_offtake_gives_empty_plan() {
    let mut parameters = FacilityParameters::default();
    parameters.offtake.enforced = false;
    let series = MarketSeries::constant(3, 0.5, 0.05);

    let outcome = run_cost_minimisation(
        &parameters,
        &FormulationConstants::default(),
        &series,
        3,
        &HighsBackend::default(),
    )
    .unwrap();

    assert_abs_diff_eq!(outcome.objective_value, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(outcome.summary.h2_sold_kg, 0.0, epsilon = 1e-6);
}
