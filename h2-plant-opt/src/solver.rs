use std::collections::HashMap;
use std::time::{Duration, Instant};

use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolutionStatus, Solver,
    SolverModel, Variable, highs,
};
use tracing::{debug, info, warn};

use crate::config::SolverSettings;
use crate::error::OptimisationError;
use crate::formulation::Sense;

/// Outcome category of a successful window solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// Optimal, but only after relaxing the green constraint.
    OptimalWithGreenSlack,
}

/// Everything a backend needs to solve one problem.
pub struct Model {
    pub variables: ProblemVariables,
    pub declared: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: Expression,
    pub sense: Sense,
}

/// Solved values of every declared variable.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    values: HashMap<Variable, f64>,
    objective_value: f64,
    solve_duration: Duration,
}

impl Assignment {
    pub fn new(values: HashMap<Variable, f64>, objective_value: f64, solve_duration: Duration) -> Self {
        Self {
            values,
            objective_value,
            solve_duration,
        }
    }

    /// All variables at zero; a starting point for hand-built assignments.
    pub fn zeros(declared: &[Variable]) -> Self {
        Self {
            values: declared.iter().map(|&variable| (variable, 0.0)).collect(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, variable: Variable, value: f64) {
        self.values.insert(variable, value);
    }

    /// Value of `variable`, zero if it was never declared.
    pub fn value(&self, variable: Variable) -> f64 {
        self.values.get(&variable).copied().unwrap_or(0.0)
    }

    pub fn values(&self) -> &HashMap<Variable, f64> {
        &self.values
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    pub fn solve_duration(&self) -> Duration {
        self.solve_duration
    }
}

/// Seam between the formulation and a concrete MILP solver.
pub trait SolverBackend {
    fn solve(&self, model: Model) -> Result<Assignment, OptimisationError>;
}

/// Any good_lp solver function, used with its default settings.
#[derive(Debug, Clone)]
pub struct GoodLpBackend<S> {
    solver: S,
}

impl<S> GoodLpBackend<S> {
    pub fn new(solver: S) -> Self {
        Self { solver }
    }
}

impl<S> SolverBackend for GoodLpBackend<S>
where
    S: Solver + Clone,
    S::Model: SolverModel<Error = ResolutionError>,
{
    fn solve(&self, model: Model) -> Result<Assignment, OptimisationError> {
        let Model {
            variables,
            declared,
            constraints,
            objective,
            sense,
        } = model;

        let unsolved = match sense {
            Sense::Minimise => variables.minimise(objective.clone()),
            Sense::Maximise => variables.maximise(objective.clone()),
        };
        let mut solver_model = unsolved.using(self.solver.clone());
        for constraint in constraints {
            solver_model = solver_model.with(constraint);
        }

        let start = Instant::now();
        let solution = solver_model.solve()?;
        read_solution(&solution, &declared, &objective, start.elapsed(), None)
    }
}

/// HiGHS through good_lp, with the run's time limit and verbosity applied.
#[derive(Debug, Clone, Default)]
pub struct HighsBackend {
    settings: SolverSettings,
}

impl HighsBackend {
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }
}

impl SolverBackend for HighsBackend {
    fn solve(&self, model: Model) -> Result<Assignment, OptimisationError> {
        let Model {
            variables,
            declared,
            constraints,
            objective,
            sense,
        } = model;

        let unsolved = match sense {
            Sense::Minimise => variables.minimise(objective.clone()),
            Sense::Maximise => variables.maximise(objective.clone()),
        };
        let mut problem = unsolved.using(highs);
        problem.set_verbose(self.settings.verbose);
        if let Some(limit) = self.settings.time_limit_seconds {
            problem = problem.set_time_limit(limit);
        }
        let constraint_count = constraints.len();
        for constraint in constraints {
            problem = problem.with(constraint);
        }
        debug!(
            variables = declared.len(),
            constraints = constraint_count,
            "handing model to HiGHS"
        );

        let start = Instant::now();
        let solution = problem.solve()?;
        read_solution(
            &solution,
            &declared,
            &objective,
            start.elapsed(),
            self.settings.time_limit_seconds,
        )
    }
}

/// Rejects a solution that stopped short of optimality.
///
/// HiGHS reports every early stop (time, iteration, memory, interrupt) as
/// `TimeLimit`; it is only a timeout when a limit was actually set. A
/// `GapLimit` solution is within the solver's relative MIP gap and is kept.
fn check_status(
    status: SolutionStatus,
    time_limit: Option<f64>,
) -> Result<(), OptimisationError> {
    match status {
        SolutionStatus::Optimal => Ok(()),
        SolutionStatus::GapLimit => {
            debug!("solution accepted within the MIP gap");
            Ok(())
        }
        SolutionStatus::TimeLimit => {
            warn!(?time_limit, "solver stopped before proving optimality");
            Err(match time_limit {
                Some(limit_seconds) => OptimisationError::SolverTimeout { limit_seconds },
                None => OptimisationError::NumericFailure(
                    "solver stopped at an iteration, memory or interrupt limit".to_string(),
                ),
            })
        }
    }
}

fn read_solution<S: Solution>(
    solution: &S,
    declared: &[Variable],
    objective: &Expression,
    elapsed: Duration,
    time_limit: Option<f64>,
) -> Result<Assignment, OptimisationError> {
    check_status(solution.status(), time_limit)?;

    let mut values = HashMap::with_capacity(declared.len());
    for (index, &variable) in declared.iter().enumerate() {
        let value = solution.value(variable);
        if !value.is_finite() {
            return Err(OptimisationError::NumericFailure(format!(
                "variable {index} has value {value}"
            )));
        }
        values.insert(variable, value);
    }

    let objective_value = objective.eval_with(&values);
    if !objective_value.is_finite() {
        return Err(OptimisationError::NumericFailure(format!(
            "objective evaluated to {objective_value}"
        )));
    }

    info!(
        duration_ms = elapsed.as_millis() as u64,
        objective = objective_value,
        "solve finished"
    );
    Ok(Assignment::new(values, objective_value, elapsed))
}
