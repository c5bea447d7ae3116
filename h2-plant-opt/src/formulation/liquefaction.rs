use h2_model::{LiquefierState, LiquefierTransition, RampLimits};

/// Step-to-step throughput envelope of a liquefier with fixed capacity.
///
/// The linear rows bound the rise `L[t] - L[t-1]` by
/// `minimum_startup * up + max_rise * (on - up)` from above and by
/// `minimum_startup * up` from below, and the fall by `max_fall`. Together
/// with `L[t] <= M * on[t]` this is the whole on/off state machine, and
/// [`RampEnvelope::rise_bounds`] evaluates it per (state, transition) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampEnvelope {
    /// Throughput a start-up step must reach exactly (kg/h).
    pub minimum_startup: f64,
    /// Largest rise while running (kg/h per step).
    pub max_rise: f64,
    /// Largest fall in any state (kg/h per step).
    pub max_fall: f64,
}

impl RampEnvelope {
    pub fn new(capacity: f64, ramp: &RampLimits, min_operating_fraction: f64) -> Self {
        Self {
            minimum_startup: min_operating_fraction * capacity,
            max_rise: ramp.max_up_fraction * capacity,
            max_fall: ramp.max_down_fraction * capacity,
        }
    }

    /// Allowed (lowest, highest) rise for a step that ends in `state` after
    /// `transition`. `None` when the pair cannot occur, i.e. a start that
    /// ends off or a stop that ends on.
    pub fn rise_bounds(
        &self,
        state: LiquefierState,
        transition: LiquefierTransition,
    ) -> Option<(f64, f64)> {
        let on = state.flag();
        let (up, _) = transition.indicators();
        let up = if up { 1.0 } else { 0.0 };

        match (state, transition) {
            (LiquefierState::Off, LiquefierTransition::Start)
            | (LiquefierState::On, LiquefierTransition::Stop) => None,
            _ => {
                let upper = self.minimum_startup * up + self.max_rise * (on - up);
                let lower = (self.minimum_startup * up).max(-self.max_fall);
                Some((lower, upper))
            }
        }
    }

    /// Whether moving from `previous` to `current` throughput is allowed for
    /// the given end state and transition, within `tolerance`.
    pub fn admits(
        &self,
        previous: f64,
        current: f64,
        state: LiquefierState,
        transition: LiquefierTransition,
        tolerance: f64,
    ) -> bool {
        if !state.is_on() && current > tolerance {
            return false;
        }
        match self.rise_bounds(state, transition) {
            Some((lower, upper)) => {
                let rise = current - previous;
                rise >= lower - tolerance && rise <= upper + tolerance
            }
            None => false,
        }
    }
}
