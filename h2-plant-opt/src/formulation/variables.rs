use good_lp::{
    Expression, IntoAffineExpression, ProblemVariables, Variable, VariableDefinition, variable,
};
use h2_model::{Equipment, NameplateCapacities};

use crate::formulation::Variant;

/// Capacities as they enter the rows: parameters for dispatch, decision
/// variables for the sizing runs.
#[derive(Debug, Clone)]
pub enum CapacityTerms {
    Fixed(NameplateCapacities),
    Sized {
        electrolyser: Variable,
        compressor: Variable,
        liquefier: Variable,
        fuel_cell: Option<Variable>,
    },
}

impl CapacityTerms {
    pub fn expression(&self, equipment: Equipment) -> Expression {
        match self {
            CapacityTerms::Fixed(capacities) => capacities.of(equipment).into_expression(),
            CapacityTerms::Sized { .. } => self
                .variable(equipment)
                .map(IntoAffineExpression::into_expression)
                .unwrap_or_default(),
        }
    }

    pub fn variable(&self, equipment: Equipment) -> Option<Variable> {
        match self {
            CapacityTerms::Fixed(_) => None,
            CapacityTerms::Sized {
                electrolyser,
                compressor,
                liquefier,
                fuel_cell,
            } => match equipment {
                Equipment::Electrolyser => Some(*electrolyser),
                Equipment::Compressor => Some(*compressor),
                Equipment::Liquefier => Some(*liquefier),
                Equipment::FuelCell => *fuel_cell,
            },
        }
    }

    pub fn fixed(&self) -> Option<&NameplateCapacities> {
        match self {
            CapacityTerms::Fixed(capacities) => Some(capacities),
            CapacityTerms::Sized { .. } => None,
        }
    }
}

/// On/off logic of the liquefier, one entry per step.
#[derive(Debug, Clone)]
pub struct LiquefierStateVars {
    pub on_off: Vec<Variable>,
    pub transition: Vec<Variable>,
    pub transition_up: Vec<Variable>,
    pub transition_down: Vec<Variable>,
}

/// Handles to every decision variable of one window.
#[derive(Debug, Clone)]
pub struct VariableSet {
    pub horizon: usize,

    pub grid_draw: Vec<Variable>,
    pub grid_export: Vec<Variable>,
    pub solar_consumed: Vec<Variable>,

    pub electrolyser: Vec<Variable>,
    pub compressor: Vec<Variable>,
    pub compressor_to_liquefier: Vec<Variable>,
    pub liquefier: Vec<Variable>,
    pub fuel_cell: Option<Vec<Variable>>,

    pub storage_inflow: Vec<Variable>,
    pub storage_outflow: Vec<Variable>,
    /// Horizon + 1 entries; `storage_level[t]` is the level at the start of step t.
    pub storage_level: Vec<Variable>,
    pub storage_active: Vec<Variable>,

    pub capacities: CapacityTerms,
    pub liquefier_state: Option<LiquefierStateVars>,
    pub green_slack: Option<Variable>,

    declared: Vec<Variable>,
}

impl VariableSet {
    /// Every variable in declaration order.
    pub fn declared(&self) -> &[Variable] {
        &self.declared
    }

    /// Throughput series of one equipment type, if it exists in this window.
    pub fn throughput(&self, equipment: Equipment) -> Option<&[Variable]> {
        match equipment {
            Equipment::Electrolyser => Some(&self.electrolyser),
            Equipment::Compressor => Some(&self.compressor),
            Equipment::Liquefier => Some(&self.liquefier),
            Equipment::FuelCell => self.fuel_cell.as_deref(),
        }
    }

    pub fn fuel_cell_at(&self, t: usize) -> Expression {
        self.fuel_cell
            .as_ref()
            .map(|fuel_cell| fuel_cell[t].into_expression())
            .unwrap_or_default()
    }
}

struct Declarations {
    vars: ProblemVariables,
    declared: Vec<Variable>,
}

impl Declarations {
    fn add(&mut self, definition: VariableDefinition) -> Variable {
        let handle = self.vars.add(definition);
        self.declared.push(handle);
        handle
    }

    fn series(&mut self, len: usize, definition: VariableDefinition) -> Vec<Variable> {
        (0..len).map(|_| self.add(definition.clone())).collect()
    }
}

fn non_negative() -> VariableDefinition {
    variable().min(0.0)
}

/// Declares the variables of one window. `fixed` carries the capacities of a
/// dispatch run and `limits` the optional upper bounds of a sizing run.
pub fn declare(
    variant: Variant,
    horizon: usize,
    fixed: Option<&NameplateCapacities>,
    limits: Option<&NameplateCapacities>,
) -> (ProblemVariables, VariableSet) {
    let mut decl = Declarations {
        vars: ProblemVariables::new(),
        declared: Vec::new(),
    };

    let grid_draw = decl.series(horizon, non_negative());
    let grid_export = decl.series(horizon, non_negative());
    let solar_consumed = decl.series(horizon, non_negative());

    let electrolyser = decl.series(horizon, non_negative());
    let compressor = decl.series(horizon, non_negative());
    let compressor_to_liquefier = decl.series(horizon, non_negative());
    let liquefier = decl.series(horizon, non_negative());
    let fuel_cell = variant
        .has_fuel_cell()
        .then(|| decl.series(horizon, non_negative()));

    let storage_inflow = decl.series(horizon, non_negative());
    let storage_outflow = decl.series(horizon, non_negative());
    let storage_level = decl.series(horizon + 1, non_negative());
    let storage_active = decl.series(horizon, variable().binary());

    let capacities = match fixed {
        Some(capacities) => CapacityTerms::Fixed(capacities.clone()),
        None => {
            let mut sized = |equipment: Equipment| {
                let definition = match limits {
                    Some(limits) => non_negative().max(limits.of(equipment)),
                    None => non_negative(),
                };
                decl.add(definition)
            };
            let electrolyser = sized(Equipment::Electrolyser);
            let compressor = sized(Equipment::Compressor);
            let liquefier = sized(Equipment::Liquefier);
            let fuel_cell = variant
                .has_fuel_cell()
                .then(|| sized(Equipment::FuelCell));
            CapacityTerms::Sized {
                electrolyser,
                compressor,
                liquefier,
                fuel_cell,
            }
        }
    };

    let liquefier_state = variant
        .models_liquefier_state()
        .then(|| LiquefierStateVars {
            on_off: decl.series(horizon, variable().binary()),
            transition: decl.series(horizon, variable().integer().min(-1).max(1)),
            transition_up: decl.series(horizon, variable().binary()),
            transition_down: decl.series(horizon, variable().binary()),
        });

    let green_slack = variant.has_green_slack().then(|| decl.add(non_negative()));

    let Declarations { vars, declared } = decl;
    (
        vars,
        VariableSet {
            horizon,
            grid_draw,
            grid_export,
            solar_consumed,
            electrolyser,
            compressor,
            compressor_to_liquefier,
            liquefier,
            fuel_cell,
            storage_inflow,
            storage_outflow,
            storage_level,
            storage_active,
            capacities,
            liquefier_state,
            green_slack,
            declared,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_minimisation_has_no_fuel_cell() {
        let (_, set) = declare(Variant::CostMinimisation, 4, None, None);

        assert!(set.fuel_cell.is_none());
        assert!(set.capacities.variable(Equipment::FuelCell).is_none());
        assert!(set.capacities.variable(Equipment::Liquefier).is_some());
        assert!(set.liquefier_state.is_none());
        assert!(set.green_slack.is_none());
        // 10 series of 4, the level series of 5, three capacities
        assert_eq!(set.declared().len(), 10 * 4 + 5 + 3);
    }

    #[test]
    fn test_rolling_window_declares_state_and_slack() {
        let capacities = NameplateCapacities::new(10.0, 10.0, 10.0, 2.0);
        let (_, set) = declare(Variant::RollingHorizon, 3, Some(&capacities), None);

        assert_eq!(set.storage_level.len(), 4);
        assert_eq!(set.fuel_cell.as_ref().map(Vec::len), Some(3));
        assert!(set.green_slack.is_some());
        assert_eq!(set.capacities.fixed(), Some(&capacities));

        let state = set.liquefier_state.as_ref().unwrap();
        assert_eq!(state.on_off.len(), 3);
        assert_eq!(state.transition.len(), 3);
        // 11 flow series, level, four state series, slack
        assert_eq!(set.declared().len(), 11 * 3 + 4 + 4 * 3 + 1);
    }

    #[test]
    fn test_fixed_capacity_expression_is_constant() {
        let capacities = NameplateCapacities::new(10.0, 11.0, 12.0, 2.0);
        let (_, set) = declare(Variant::RollingHorizon, 2, Some(&capacities), None);
        let values = std::collections::HashMap::<Variable, f64>::new();

        let liquefier = set.capacities.expression(Equipment::Liquefier);
        assert_eq!(liquefier.eval_with(&values), 12.0);
    }
}
