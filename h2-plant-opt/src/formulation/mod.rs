pub mod constraints;
pub mod liquefaction;
pub mod objective;
pub mod variables;

use std::collections::HashMap;
use std::fmt;

use good_lp::{Constraint, Expression, IntoAffineExpression, ProblemVariables, Variable, constraint};
use h2_model::{FacilityParameters, MarketSeries, NameplateCapacities, StateVector};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::FormulationConstants;
use crate::error::OptimisationError;
use crate::solver::{Assignment, Model, SolverBackend};

pub use liquefaction::RampEnvelope;
pub use variables::{CapacityTerms, LiquefierStateVars, VariableSet};

/// The three problems built from the shared formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Sizes electrolyser, compressor and liquefier for the least total cost.
    CostMinimisation,
    /// Sizes all equipment, fuel cell included, for the largest profit.
    ProfitMaximisation,
    /// Dispatches fixed capacities over one window with carried-in state.
    RollingHorizon,
}

impl Variant {
    pub fn sense(&self) -> Sense {
        match self {
            Variant::CostMinimisation => Sense::Minimise,
            Variant::ProfitMaximisation | Variant::RollingHorizon => Sense::Maximise,
        }
    }

    pub fn sizes_capacity(&self) -> bool {
        !matches!(self, Variant::RollingHorizon)
    }

    pub fn has_fuel_cell(&self) -> bool {
        !matches!(self, Variant::CostMinimisation)
    }

    pub fn models_liquefier_state(&self) -> bool {
        matches!(self, Variant::RollingHorizon)
    }

    pub fn has_green_slack(&self) -> bool {
        matches!(self, Variant::RollingHorizon)
    }

    /// Shortest horizon the variant can be solved for. A rolling window
    /// commits step 1, so it needs two steps.
    pub fn minimum_horizon(&self) -> usize {
        match self {
            Variant::RollingHorizon => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimise,
    Maximise,
}

/// Named families of rows. Every row belongs to exactly one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintGroup {
    SolarCeiling,
    EnergyBalance,
    FuelCellExport,
    GreenHydrogen,
    EquipmentCapacity,
    LiquefactionRamp,
    LiquefactionState,
    MassBalance,
    StorageRecursion,
    StorageActivation,
    InitialConditions,
    Offtake,
}

impl fmt::Display for ConstraintGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintGroup::SolarCeiling => "solar_ceiling",
            ConstraintGroup::EnergyBalance => "energy_balance",
            ConstraintGroup::FuelCellExport => "fuel_cell_export",
            ConstraintGroup::GreenHydrogen => "green_hydrogen",
            ConstraintGroup::EquipmentCapacity => "equipment_capacity",
            ConstraintGroup::LiquefactionRamp => "liquefaction_ramp",
            ConstraintGroup::LiquefactionState => "liquefaction_state",
            ConstraintGroup::MassBalance => "mass_balance",
            ConstraintGroup::StorageRecursion => "storage_recursion",
            ConstraintGroup::StorageActivation => "storage_activation",
            ConstraintGroup::InitialConditions => "initial_conditions",
            ConstraintGroup::Offtake => "offtake",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// `expression <= 0`
    AtMost,
    /// `expression == 0`
    Equal,
}

/// One linear row, kept in `expression <= 0` or `expression == 0` form so it
/// can be handed to the solver and re-evaluated against a solution.
#[derive(Debug, Clone)]
pub struct Row {
    pub group: ConstraintGroup,
    pub step: Option<usize>,
    pub expression: Expression,
    pub kind: RowKind,
}

impl Row {
    pub fn le(
        group: ConstraintGroup,
        step: Option<usize>,
        lhs: impl IntoAffineExpression,
        rhs: impl IntoAffineExpression,
    ) -> Self {
        Self {
            group,
            step,
            expression: lhs.into_expression() - rhs.into_expression(),
            kind: RowKind::AtMost,
        }
    }

    pub fn ge(
        group: ConstraintGroup,
        step: Option<usize>,
        lhs: impl IntoAffineExpression,
        rhs: impl IntoAffineExpression,
    ) -> Self {
        Self::le(group, step, rhs, lhs)
    }

    pub fn eq(
        group: ConstraintGroup,
        step: Option<usize>,
        lhs: impl IntoAffineExpression,
        rhs: impl IntoAffineExpression,
    ) -> Self {
        Self {
            group,
            step,
            expression: lhs.into_expression() - rhs.into_expression(),
            kind: RowKind::Equal,
        }
    }

    pub fn to_constraint(&self) -> Constraint {
        let expression = self.expression.clone();
        match self.kind {
            RowKind::AtMost => constraint!(expression <= 0.0),
            RowKind::Equal => constraint!(expression == 0.0),
        }
    }

    /// How far `values` is from satisfying the row; zero when it holds.
    pub fn residual(&self, values: &HashMap<Variable, f64>) -> f64 {
        let lhs = (&self.expression).eval_with(values);
        match self.kind {
            RowKind::AtMost => lhs.max(0.0),
            RowKind::Equal => lhs.abs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub group: ConstraintGroup,
    pub step: Option<usize>,
    pub residual: f64,
}

fn violations_of(rows: &[Row], values: &HashMap<Variable, f64>, tolerance: f64) -> Vec<Violation> {
    rows.iter()
        .filter_map(|row| {
            let residual = row.residual(values);
            (residual > tolerance).then_some(Violation {
                group: row.group,
                step: row.step,
                residual,
            })
        })
        .collect()
}

/// Read-only inputs of one window, shared by the row and objective builders.
#[derive(Debug, Clone)]
pub struct Window {
    pub variant: Variant,
    pub horizon: usize,
    pub parameters: FacilityParameters,
    pub constants: FormulationConstants,
    pub series: MarketSeries,
    /// Carried-in state; only the rolling variant has one.
    pub carried: Option<StateVector>,
}

impl Window {
    fn validate(&self) -> Result<(), OptimisationError> {
        let minimum = self.variant.minimum_horizon();
        if self.horizon < minimum {
            return Err(OptimisationError::InvalidHorizon {
                horizon: self.horizon,
                minimum,
            });
        }
        check_length("solar_availability", &self.series.solar_availability, self.horizon)?;
        check_length("price_per_kwh", &self.series.price_per_kwh, self.horizon)?;

        let efficiencies = &self.parameters.efficiencies;
        let capex = &self.parameters.capex;
        for (name, value) in [
            ("electrolysis_kwh_per_kg", efficiencies.electrolysis_kwh_per_kg),
            ("compression_kwh_per_kg", efficiencies.compression_kwh_per_kg),
            ("liquefaction_kwh_per_kg", efficiencies.liquefaction_kwh_per_kg),
            ("fuel_cell_kwh_per_kg", efficiencies.fuel_cell_kwh_per_kg),
            ("solar_capacity_kw", self.parameters.solar.capacity_kw),
            (
                "threshold_kg_co2_per_kg_h2",
                self.parameters.green.threshold_kg_co2_per_kg_h2,
            ),
            (
                "grid_emission_factor_kg_co2_per_kwh",
                self.parameters.green.grid_emission_factor_kg_co2_per_kwh,
            ),
            ("h2_sales_price_per_kg", self.parameters.h2_sales_price_per_kg),
            ("ppa_price_per_kwh", self.parameters.solar.ppa_price_per_kwh),
            ("electrolyser_per_kg_day", capex.electrolyser_per_kg_day),
            ("compressor_per_kg_day", capex.compressor_per_kg_day),
            ("liquefier_per_kg_day", capex.liquefier_per_kg_day),
            ("fuel_cell_per_kg_day", capex.fuel_cell_per_kg_day),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(OptimisationError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and non-negative",
                });
            }
        }

        let ramp = &self.parameters.liquefaction_ramp;
        for (name, value) in [
            ("max_up_fraction", ramp.max_up_fraction),
            ("max_down_fraction", ramp.max_down_fraction),
            (
                "min_operating_ramp_fraction",
                self.constants.min_operating_ramp_fraction,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OptimisationError::InvalidParameter {
                    name,
                    value,
                    reason: "must be a fraction between 0 and 1",
                });
            }
        }

        for (name, values) in [
            ("solar_availability", &self.series.solar_availability),
            ("price_per_kwh", &self.series.price_per_kwh),
        ] {
            if let Some(&value) = values.iter().find(|value| !value.is_finite()) {
                return Err(OptimisationError::InvalidParameter {
                    name,
                    value,
                    reason: "series values must be finite",
                });
            }
        }
        Ok(())
    }

    fn warn_on_big_m_ceiling(&self, capacities: Option<&NameplateCapacities>) {
        let largest = capacities.map(NameplateCapacities::largest);
        match largest {
            Some(largest) if largest >= self.constants.big_m => warn!(
                largest,
                big_m = self.constants.big_m,
                "capacity reaches the big-M constant; indicator rows cap throughput at big-M"
            ),
            None if self.variant == Variant::ProfitMaximisation => warn!(
                "profit maximisation without capacity limits may be unbounded"
            ),
            _ => {}
        }
    }

    /// Steps are hours; an enforced off-take the liquefier limit cannot reach
    /// within the horizon leaves the cost run infeasible.
    fn warn_on_unreachable_offtake(&self, limits: Option<&NameplateCapacities>) {
        let offtake = &self.parameters.offtake;
        if self.variant != Variant::CostMinimisation || !offtake.enforced {
            return;
        }
        if let Some(limits) = limits {
            if !offtake.reachable_within(limits.liquefier_kg_per_hour, self.horizon as f64) {
                warn!(
                    offtake_kg = offtake.total_kg(),
                    liquefier_kg_per_hour = limits.liquefier_kg_per_hour,
                    horizon = self.horizon,
                    "off-take exceeds what the liquefier limit can deliver over the horizon"
                );
            }
        }
    }
}

fn check_length(series: &'static str, values: &[f64], horizon: usize) -> Result<(), OptimisationError> {
    if values.len() != horizon {
        return Err(OptimisationError::InputShapeMismatch {
            series,
            expected: horizon,
            actual: values.len(),
        });
    }
    Ok(())
}

/// A built but unsolved optimisation problem. Owned by exactly one solve.
pub struct Problem {
    window: Window,
    variables: ProblemVariables,
    handles: VariableSet,
    rows: Vec<Row>,
    objective: Expression,
}

impl Problem {
    /// Sizing run that meets the off-take at least total cost.
    pub fn cost_minimisation(
        parameters: &FacilityParameters,
        constants: &FormulationConstants,
        series: &MarketSeries,
        horizon: usize,
    ) -> Result<Self, OptimisationError> {
        Self::assemble(
            Window {
                variant: Variant::CostMinimisation,
                horizon,
                parameters: parameters.clone(),
                constants: constants.clone(),
                series: series.clone(),
                carried: None,
            },
            None,
        )
    }

    /// Sizing run that maximises profit, fuel cell included.
    pub fn profit_maximisation(
        parameters: &FacilityParameters,
        constants: &FormulationConstants,
        series: &MarketSeries,
        horizon: usize,
    ) -> Result<Self, OptimisationError> {
        Self::assemble(
            Window {
                variant: Variant::ProfitMaximisation,
                horizon,
                parameters: parameters.clone(),
                constants: constants.clone(),
                series: series.clone(),
                carried: None,
            },
            None,
        )
    }

    /// Dispatch window over fixed capacities starting from `carried`.
    pub fn rolling_window(
        parameters: &FacilityParameters,
        constants: &FormulationConstants,
        capacities: &NameplateCapacities,
        series: &MarketSeries,
        horizon: usize,
        carried: StateVector,
    ) -> Result<Self, OptimisationError> {
        Self::assemble(
            Window {
                variant: Variant::RollingHorizon,
                horizon,
                parameters: parameters.clone(),
                constants: constants.clone(),
                series: series.clone(),
                carried: Some(carried),
            },
            Some(capacities),
        )
    }

    fn assemble(window: Window, fixed: Option<&NameplateCapacities>) -> Result<Self, OptimisationError> {
        window.validate()?;
        if let Some(capacities) = fixed {
            for (name, value) in [
                ("electrolyser_kg_per_hour", capacities.electrolyser_kg_per_hour),
                ("compressor_kg_per_hour", capacities.compressor_kg_per_hour),
                ("liquefier_kg_per_hour", capacities.liquefier_kg_per_hour),
                ("fuel_cell_kg_per_hour", capacities.fuel_cell_kg_per_hour),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(OptimisationError::InvalidParameter {
                        name,
                        value,
                        reason: "capacities must be finite and non-negative",
                    });
                }
            }
        }

        let limits = if window.variant.sizes_capacity() {
            window.parameters.capacity_limits.as_ref()
        } else {
            None
        };
        window.warn_on_big_m_ceiling(fixed.or(limits));
        window.warn_on_unreachable_offtake(limits);

        let (variables, handles) = variables::declare(window.variant, window.horizon, fixed, limits);
        let rows = constraints::build_rows(&window, &handles);
        let objective = objective::build_objective(&window, &handles);

        let problem = Self {
            window,
            variables,
            handles,
            rows,
            objective,
        };
        debug!(
            variant = ?problem.window.variant,
            horizon = problem.window.horizon,
            variables = problem.handles.declared().len(),
            rows = ?problem.row_counts(),
            "formulation built"
        );
        Ok(problem)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn variables(&self) -> &VariableSet {
        &self.handles
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    pub fn row_counts(&self) -> IndexMap<ConstraintGroup, usize> {
        let mut counts = IndexMap::new();
        for row in &self.rows {
            *counts.entry(row.group).or_insert(0) += 1;
        }
        counts
    }

    /// Rows `assignment` violates by more than `tolerance`.
    pub fn violations(&self, assignment: &Assignment, tolerance: f64) -> Vec<Violation> {
        violations_of(&self.rows, assignment.values(), tolerance)
    }

    pub fn solve<B: SolverBackend + ?Sized>(self, backend: &B) -> Result<SolvedProblem, OptimisationError> {
        let Problem {
            window,
            variables,
            handles,
            rows,
            objective,
        } = self;

        let model = Model {
            variables,
            declared: handles.declared().to_vec(),
            constraints: rows.iter().map(Row::to_constraint).collect(),
            objective,
            sense: window.variant.sense(),
        };
        let assignment = backend.solve(model)?;

        Ok(SolvedProblem {
            window,
            handles,
            rows,
            assignment,
        })
    }
}

/// A problem together with the assignment the solver returned for it.
pub struct SolvedProblem {
    window: Window,
    handles: VariableSet,
    rows: Vec<Row>,
    assignment: Assignment,
}

impl SolvedProblem {
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn variables(&self) -> &VariableSet {
        &self.handles
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn value(&self, variable: Variable) -> f64 {
        self.assignment.value(variable)
    }

    pub fn objective_value(&self) -> f64 {
        self.assignment.objective_value()
    }

    /// Rows of the solved problem violated by more than `tolerance`.
    pub fn violations(&self, tolerance: f64) -> Vec<Violation> {
        violations_of(&self.rows, self.assignment.values(), tolerance)
    }
}
