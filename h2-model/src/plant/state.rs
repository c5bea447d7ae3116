use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// State carried from one rolling-horizon window into the next.
///
/// This is the only information that survives a window solve. It is `Copy`
/// and always handed over by value, so a failed or repeated solve can never
/// observe a half-updated carry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./state.ts")]
pub struct StateVector {
    /// Grid energy drawn since the start of the run (kWh).
    pub cumulative_grid_kwh: f64,
    /// Liquefied hydrogen produced since the start of the run (kg).
    pub cumulative_h2_kg: f64,
    /// Gaseous storage level at the start of the next committed step (kg).
    pub storage_level_kg: f64,
    /// Liquefier throughput of the last committed step (kg/h).
    pub previous_liquefaction_kg: f64,
}

impl StateVector {
    /// Empty storage, idle liquefier, nothing accumulated yet.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Folds one committed step into the running totals and replaces the
    /// storage and liquefier positions.
    pub fn advance(
        self,
        grid_kwh: f64,
        liquefied_kg: f64,
        storage_level_kg: f64,
        liquefaction_kg: f64,
    ) -> Self {
        Self {
            cumulative_grid_kwh: self.cumulative_grid_kwh + grid_kwh,
            cumulative_h2_kg: self.cumulative_h2_kg + liquefied_kg,
            storage_level_kg,
            previous_liquefaction_kg: liquefaction_kg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates_and_replaces() {
        let start = StateVector {
            cumulative_grid_kwh: 100.0,
            cumulative_h2_kg: 20.0,
            storage_level_kg: 5.0,
            previous_liquefaction_kg: 3.0,
        };
        let next = start.advance(40.0, 4.0, 7.5, 4.0);

        assert_eq!(next.cumulative_grid_kwh, 140.0);
        assert_eq!(next.cumulative_h2_kg, 24.0);
        assert_eq!(next.storage_level_kg, 7.5);
        assert_eq!(next.previous_liquefaction_kg, 4.0);
        // the receiver is left as it was
        assert_eq!(start.cumulative_grid_kwh, 100.0);
    }

    #[test]
    fn test_initial_is_zero() {
        let state = StateVector::initial();
        assert_eq!(state.cumulative_grid_kwh, 0.0);
        assert_eq!(state.storage_level_kg, 0.0);
    }
}
