use h2_model::{FacilityParameters, FacilitySummary, MarketSeries, NameplateCapacities, OperationalRecord};
use tracing::{info, instrument};

use crate::config::FormulationConstants;
use crate::error::OptimisationError;
use crate::formulation::Problem;
use crate::projector::{facility_summary, operational_trace};
use crate::solver::{SolveStatus, SolverBackend};

/// Result of a capacity-sizing run.
#[derive(Debug, Clone)]
pub struct SizingOutcome {
    pub status: SolveStatus,
    /// Total cost for the cost run, total profit for the profit run.
    pub objective_value: f64,
    pub capacities: NameplateCapacities,
    pub trace: Vec<OperationalRecord>,
    pub summary: FacilitySummary,
    pub solve_duration_ms: u128,
}

/// Sizes electrolyser, compressor and liquefier to meet the off-take at the
/// least energy plus capital cost.
#[instrument(skip_all, name = "Sizing for least cost…", fields(horizon = horizon))]
pub fn run_cost_minimisation<B: SolverBackend + ?Sized>(
    parameters: &FacilityParameters,
    constants: &FormulationConstants,
    series: &MarketSeries,
    horizon: usize,
    backend: &B,
) -> Result<SizingOutcome, OptimisationError> {
    let problem = Problem::cost_minimisation(parameters, constants, series, horizon)?;
    solve_sizing(problem, backend)
}

/// Sizes every unit, fuel cell included, for the largest profit.
#[instrument(skip_all, name = "Sizing for most profit…", fields(horizon = horizon))]
pub fn run_profit_maximisation<B: SolverBackend + ?Sized>(
    parameters: &FacilityParameters,
    constants: &FormulationConstants,
    series: &MarketSeries,
    horizon: usize,
    backend: &B,
) -> Result<SizingOutcome, OptimisationError> {
    let problem = Problem::profit_maximisation(parameters, constants, series, horizon)?;
    solve_sizing(problem, backend)
}

fn solve_sizing<B: SolverBackend + ?Sized>(
    problem: Problem,
    backend: &B,
) -> Result<SizingOutcome, OptimisationError> {
    let solved = problem.solve(backend)?;
    let trace = operational_trace(&solved);
    let summary = facility_summary(&solved, &trace);

    info!(
        electrolyser = summary.capacities.electrolyser_kg_per_hour,
        compressor = summary.capacities.compressor_kg_per_hour,
        liquefier = summary.capacities.liquefier_kg_per_hour,
        fuel_cell = summary.capacities.fuel_cell_kg_per_hour,
        objective = solved.objective_value(),
        "capacities sized"
    );

    Ok(SizingOutcome {
        status: SolveStatus::Optimal,
        objective_value: solved.objective_value(),
        capacities: summary.capacities.clone(),
        solve_duration_ms: solved.assignment().solve_duration().as_millis(),
        trace,
        summary,
    })
}
