//! Mixed-integer sizing and dispatch of a grid- and solar-supplied green
//! hydrogen facility: electrolysis, compression, gaseous storage,
//! liquefaction and a fuel cell that exports stored hydrogen as power.

pub mod config;
pub mod error;
pub mod formulation;
pub mod projector;
pub mod rolling;
pub mod sizing;
pub mod solver;

// Re-export commonly used items for convenience
pub use config::{FormulationConstants, RunConfig, SolverSettings};
pub use error::OptimisationError;
pub use formulation::{ConstraintGroup, Problem, SolvedProblem, Variant, Violation};
pub use rolling::{RollingOutcome, extract_carryover, run_rolling_window};
pub use sizing::{SizingOutcome, run_cost_minimisation, run_profit_maximisation};
pub use solver::{Assignment, GoodLpBackend, HighsBackend, SolveStatus, SolverBackend};
