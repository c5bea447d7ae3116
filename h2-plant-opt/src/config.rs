use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use h2_model::{FacilityParameters, NameplateCapacities};
use serde::{Deserialize, Serialize};

use crate::solver::HighsBackend;

pub const BIG_M: f64 = 1_000.0;
pub const GREEN_SLACK_PENALTY: f64 = 100.0;
pub const MIN_OPERATING_RAMP_FRACTION: f64 = 0.3;
pub const HOURS_PER_DAY: f64 = 24.0;

/// Constants of the formulation that are not facility parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulationConstants {
    pub big_m: f64,                       // Linking constant for indicator rows (kg/h)
    pub slack_penalty: f64,               // Objective penalty per kWh of green slack
    pub min_operating_ramp_fraction: f64, // Start-up throughput as a share of liquefier capacity
    pub hours_per_day: f64,               // Converts kg/h capacity into kg/day for capex
}

impl Default for FormulationConstants {
    fn default() -> Self {
        Self {
            big_m: BIG_M,
            slack_penalty: GREEN_SLACK_PENALTY,
            min_operating_ramp_fraction: MIN_OPERATING_RAMP_FRACTION,
            hours_per_day: HOURS_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub time_limit_seconds: Option<f64>, // Wall-clock limit handed to the solver
    pub verbose: bool,                    // Let the solver print its own log
}

/// Everything one run needs besides the market series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub facility: FacilityParameters,
    /// Fixed capacities for rolling-horizon dispatch.
    pub capacities: Option<NameplateCapacities>,
    pub constants: FormulationConstants,
    pub solver: SolverSettings,
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse run configuration")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read run configuration {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid run configuration in {}", path.display()))
    }

    pub fn backend(&self) -> HighsBackend {
        HighsBackend::new(self.solver.clone())
    }
}
