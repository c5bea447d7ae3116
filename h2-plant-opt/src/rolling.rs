use h2_model::{
    FacilityParameters, FacilitySummary, MarketSeries, NameplateCapacities, OperationalRecord,
    StateVector,
};
use tracing::{info, instrument, warn};

use crate::config::FormulationConstants;
use crate::error::OptimisationError;
use crate::formulation::{Problem, RampEnvelope, SolvedProblem};
use crate::projector::{facility_summary, operational_record, operational_trace};
use crate::solver::{SolveStatus, SolverBackend};

/// Step of a window whose decisions are committed and carried forward.
/// Step 0 is pinned to the incoming state.
pub const COMMITTED_STEP: usize = 1;

/// Slack below this is solver noise, not a relaxed green constraint.
const SLACK_TOLERANCE_KWH: f64 = 1e-6;

const RAMP_TOLERANCE_KG: f64 = 1e-6;

/// Result of one rolling-horizon window.
#[derive(Debug, Clone)]
pub struct RollingOutcome {
    pub status: SolveStatus,
    pub objective_value: f64,
    pub trace: Vec<OperationalRecord>,
    pub summary: FacilitySummary,
    /// Operation of the committed step.
    pub committed: OperationalRecord,
    /// State to start the next window from.
    pub next_state: StateVector,
    pub solve_duration_ms: u128,
}

/// Solves one dispatch window over fixed capacities starting from `state`.
///
/// `state` is taken by value and never modified; on failure the caller still
/// holds the state it passed in and can retry.
#[instrument(
    skip_all,
    name = "Solving rolling window…",
    fields(horizon = horizon, storage_kg = state.storage_level_kg)
)]
pub fn run_rolling_window<B: SolverBackend + ?Sized>(
    parameters: &FacilityParameters,
    constants: &FormulationConstants,
    capacities: &NameplateCapacities,
    series: &MarketSeries,
    horizon: usize,
    state: StateVector,
    backend: &B,
) -> Result<RollingOutcome, OptimisationError> {
    let problem = Problem::rolling_window(parameters, constants, capacities, series, horizon, state)?;
    let solved = problem.solve(backend)?;

    let trace = operational_trace(&solved);
    let summary = facility_summary(&solved, &trace);
    let (next_state, committed) = extract_carryover(&solved, state);

    let envelope = RampEnvelope::new(
        capacities.liquefier_kg_per_hour,
        &parameters.liquefaction_ramp,
        constants.min_operating_ramp_fraction,
    );
    for pair in trace.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let Some(operation) = &current.liquefier else {
            continue;
        };
        if !envelope.admits(
            previous.liquefier_kg,
            current.liquefier_kg,
            operation.state,
            operation.transition,
            RAMP_TOLERANCE_KG,
        ) {
            warn!(
                step = current.step,
                previous_kg = previous.liquefier_kg,
                current_kg = current.liquefier_kg,
                "liquefier step falls outside its ramp envelope"
            );
        }
    }

    let status = if summary.green_slack_kwh > SLACK_TOLERANCE_KWH {
        warn!(
            slack_kwh = summary.green_slack_kwh,
            "green constraint relaxed to keep the window feasible"
        );
        SolveStatus::OptimalWithGreenSlack
    } else {
        SolveStatus::Optimal
    };

    info!(
        objective = solved.objective_value(),
        committed_grid_kwh = committed.grid_draw_kwh,
        committed_liquefier_kg = committed.liquefier_kg,
        "window committed"
    );

    Ok(RollingOutcome {
        status,
        objective_value: solved.objective_value(),
        trace,
        summary,
        committed,
        next_state,
        solve_duration_ms: solved.assignment().solve_duration().as_millis(),
    })
}

/// Folds the committed step of a solved window into `carried`.
///
/// The storage level carried forward is the level at the end of the
/// committed step, which is where the next window's committed step starts.
pub fn extract_carryover(
    solved: &SolvedProblem,
    carried: StateVector,
) -> (StateVector, OperationalRecord) {
    let committed = operational_record(solved, COMMITTED_STEP);
    let next = carried.advance(
        committed.grid_draw_kwh,
        committed.liquefier_kg,
        committed.storage_level_end_kg,
        committed.liquefier_kg,
    );
    (next, committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::VariableSet;
    use crate::solver::{Assignment, Model};

    struct Replay(Assignment);

    impl SolverBackend for Replay {
        fn solve(&self, _model: Model) -> Result<Assignment, OptimisationError> {
            Ok(self.0.clone())
        }
    }

    fn problem() -> Problem {
        Problem::rolling_window(
            &FacilityParameters::default(),
            &FormulationConstants::default(),
            &NameplateCapacities::new(10.0, 10.0, 10.0, 2.0),
            &MarketSeries::constant(3, 0.0, 0.05),
            3,
            StateVector {
                cumulative_grid_kwh: 500.0,
                cumulative_h2_kg: 40.0,
                storage_level_kg: 6.0,
                previous_liquefaction_kg: 0.0,
            },
        )
        .unwrap()
    }

    fn committed_assignment(vars: &VariableSet) -> Assignment {
        let mut assignment = Assignment::zeros(vars.declared());
        assignment.set(vars.grid_draw[1], 204.0);
        assignment.set(vars.liquefier[1], 3.0);
        assignment.set(vars.storage_level[1], 6.0);
        assignment.set(vars.storage_level[2], 4.5);
        assignment.set(vars.storage_level[3], 4.5);
        assignment
    }

    #[test]
    fn test_carryover_reads_committed_step() {
        let problem = problem();
        let carried = problem.window().carried.unwrap();
        let assignment = committed_assignment(problem.variables());
        let solved = problem.solve(&Replay(assignment)).unwrap();

        let (next, committed) = extract_carryover(&solved, carried);

        assert_eq!(committed.step, COMMITTED_STEP);
        assert_eq!(next.cumulative_grid_kwh, 704.0);
        assert_eq!(next.cumulative_h2_kg, 43.0);
        assert_eq!(next.storage_level_kg, 4.5);
        assert_eq!(next.previous_liquefaction_kg, 3.0);
        // the carried-in state is a copy and stays as it was
        assert_eq!(carried.cumulative_grid_kwh, 500.0);
    }

    #[test]
    fn test_projected_trace_decodes_liquefier_start() {
        let problem = problem();
        let vars = problem.variables().clone();
        let state = vars.liquefier_state.clone().unwrap();
        let mut assignment = committed_assignment(&vars);
        assignment.set(state.on_off[1], 1.0);
        assignment.set(state.on_off[2], 1.0);
        assignment.set(state.transition[1], 1.0);
        assignment.set(state.transition_up[1], 1.0);

        let solved = problem.solve(&Replay(assignment)).unwrap();
        let trace = operational_trace(&solved);

        let start = trace[1].liquefier.clone().unwrap();
        assert_eq!(start.state, h2_model::LiquefierState::On);
        assert_eq!(start.transition, h2_model::LiquefierTransition::Start);
        assert!(start.transition_up);
        assert!((start.minimum_startup_kg - 3.0).abs() < 1e-12);

        let hold = trace[2].liquefier.clone().unwrap();
        assert_eq!(hold.transition, h2_model::LiquefierTransition::Hold);

        assert_eq!(trace[1].storage_level_kg, 6.0);
        assert_eq!(trace[1].storage_level_end_kg, 4.5);
        assert_eq!(trace[1].liquefaction_consumption_kwh, 33.0);
    }

    #[test]
    fn test_rolling_summary_has_no_capex() {
        let problem = problem();
        let assignment = committed_assignment(problem.variables());
        let solved = problem.solve(&Replay(assignment)).unwrap();
        let trace = operational_trace(&solved);
        let summary = facility_summary(&solved, &trace);

        assert_eq!(summary.capex.total(), 0.0);
        assert_eq!(summary.h2_sold_kg, 3.0);
        assert!((summary.wholesale_cost - 204.0 * 0.05).abs() < 1e-12);
        assert_eq!(summary.capacities, NameplateCapacities::new(10.0, 10.0, 10.0, 2.0));
    }

    #[test]
    fn test_window_failure_leaves_state_with_caller() {
        struct Failing;
        impl SolverBackend for Failing {
            fn solve(&self, _model: Model) -> Result<Assignment, OptimisationError> {
                Err(OptimisationError::InfeasibleModel)
            }
        }

        let state = StateVector {
            storage_level_kg: 2.0,
            ..StateVector::initial()
        };
        let result = run_rolling_window(
            &FacilityParameters::default(),
            &FormulationConstants::default(),
            &NameplateCapacities::new(10.0, 10.0, 10.0, 2.0),
            &MarketSeries::constant(3, 0.0, 0.05),
            3,
            state,
            &Failing,
        );

        assert!(matches!(result, Err(OptimisationError::InfeasibleModel)));
        assert_eq!(state.storage_level_kg, 2.0);
    }
}
