use good_lp::ResolutionError;
use thiserror::Error;

/// Failures surfaced by a window solve. None of them is retried here;
/// relaxing the green threshold or shrinking the horizon is up to the caller.
#[derive(Debug, Error)]
pub enum OptimisationError {
    #[error("model is infeasible: no dispatch satisfies every constraint")]
    InfeasibleModel,

    #[error("model is unbounded: bound the capacities of the sizing run")]
    Unbounded,

    #[error("solver reached its time limit of {limit_seconds} s")]
    SolverTimeout { limit_seconds: f64 },

    #[error("solver returned an unusable value: {0}")]
    NumericFailure(String),

    #[error("solver failed: {0}")]
    SolverFailure(String),

    #[error("{series} has {actual} steps but the horizon is {expected}")]
    InputShapeMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("horizon of {horizon} steps is shorter than the required {minimum}")]
    InvalidHorizon { horizon: usize, minimum: usize },

    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl From<ResolutionError> for OptimisationError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Infeasible => OptimisationError::InfeasibleModel,
            ResolutionError::Unbounded => OptimisationError::Unbounded,
            other => OptimisationError::SolverFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_mapping() {
        assert!(matches!(
            OptimisationError::from(ResolutionError::Infeasible),
            OptimisationError::InfeasibleModel
        ));
        assert!(matches!(
            OptimisationError::from(ResolutionError::Unbounded),
            OptimisationError::Unbounded
        ));
        assert!(matches!(
            OptimisationError::from(ResolutionError::Str("presolve error".to_string())),
            OptimisationError::SolverFailure(_)
        ));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let error = OptimisationError::InputShapeMismatch {
            series: "price_per_kwh",
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            error.to_string(),
            "price_per_kwh has 2 steps but the horizon is 3"
        );
    }
}
