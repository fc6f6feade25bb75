//! Odds-style weight updates for goals.
//!
//! Treating `w` as odds, a penalty behaves like one more recorded failure and a
//! reward like one more recorded success. Weights stay inside (0, 1].

/// Upper bound on any goal weight.
pub const MAX_WEIGHT: f64 = 1.0;

/// Weight after one failure: `w / (w + 1)`. Strictly smaller, never zero.
pub fn penalized(weight: f64) -> f64 {
    weight / (weight + 1.0)
}

/// Weight after one success: `w / (1 - w)`, clamped to `MAX_WEIGHT`.
pub fn rewarded(weight: f64) -> f64 {
    if weight >= MAX_WEIGHT {
        return MAX_WEIGHT;
    }
    (weight / (1.0 - weight)).min(MAX_WEIGHT)
}
