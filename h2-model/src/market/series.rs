use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Exogenous per-step inputs of one solve: solar availability and the
/// wholesale price. Both are opaque ordered sequences indexed by time step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./market.ts")]
pub struct MarketSeries {
    /// Fraction of solar capacity available in each step (0.0-1.0).
    pub solar_availability: Vec<f64>,
    /// Wholesale (day-ahead) price per kWh in each step.
    pub price_per_kwh: Vec<f64>,
}

impl MarketSeries {
    pub fn new(solar_availability: Vec<f64>, price_per_kwh: Vec<f64>) -> Self {
        Self {
            solar_availability,
            price_per_kwh,
        }
    }

    /// Flat series: the same availability and price in every step.
    pub fn constant(horizon: usize, solar_availability: f64, price_per_kwh: f64) -> Self {
        Self {
            solar_availability: vec![solar_availability; horizon],
            price_per_kwh: vec![price_per_kwh; horizon],
        }
    }

    /// Builds a series from prices quoted per MWh, as day-ahead markets publish them.
    pub fn from_mwh_prices(solar_availability: Vec<f64>, price_per_mwh: &[f64]) -> Self {
        Self {
            solar_availability,
            price_per_kwh: price_per_mwh.iter().map(|&price| price / 1000.0).collect(),
        }
    }

    /// Copies `len` steps starting at `start`, or `None` if the series is too short.
    pub fn window(&self, start: usize, len: usize) -> Option<Self> {
        let end = start.checked_add(len)?;
        if end > self.solar_availability.len() || end > self.price_per_kwh.len() {
            return None;
        }
        Some(Self {
            solar_availability: self.solar_availability[start..end].to_vec(),
            price_per_kwh: self.price_per_kwh[start..end].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mwh_prices() {
        let series = MarketSeries::from_mwh_prices(vec![0.0, 0.5], &[50.0, 120.0]);
        assert_eq!(series.price_per_kwh, vec![0.05, 0.12]);
    }

    #[test]
    fn test_window_within_bounds() {
        let series = MarketSeries::new(vec![0.0, 0.1, 0.2, 0.3], vec![1.0, 2.0, 3.0, 4.0]);
        let window = series.window(1, 2).unwrap();

        assert_eq!(window.solar_availability, vec![0.1, 0.2]);
        assert_eq!(window.price_per_kwh, vec![2.0, 3.0]);
    }

    #[test]
    fn test_window_past_end() {
        let series = MarketSeries::constant(3, 0.5, 0.05);
        assert!(series.window(2, 2).is_none());
        assert!(series.window(usize::MAX, 2).is_none());
    }
}
