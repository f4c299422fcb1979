//! Numeric sanitation for simulation inputs.
//!
//! Nothing in the simulation loop is allowed to fail on a bad number. Every
//! value that crosses a boundary (damage requests, configured cooldowns,
//! species attributes) goes through one of these helpers, which substitute a
//! safe default and emit a warning instead of propagating NaN.

use tracing::warn;

/// Safe default for health-like quantities.
pub const HEALTH_FALLBACK: f32 = 0.0;

/// Safe default for damage-like quantities.
pub const DAMAGE_FALLBACK: f32 = 1.0;

/// Returns `value` when it is finite and `>= 0`, else `fallback`.
///
/// `context` names the quantity in the log line.
#[must_use]
pub fn non_negative(value: f32, fallback: f32, context: &str) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("invalid {context} value {value}, substituting {fallback}");
        fallback
    }
}

/// Returns `value` when it is finite and strictly positive, else `fallback`.
#[must_use]
pub fn positive(value: f32, fallback: f32, context: &str) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!("invalid {context} value {value}, substituting {fallback}");
        fallback
    }
}

/// Returns `value` clamped to `[0, 1]`; non-finite input becomes `fallback`.
#[must_use]
pub fn probability(value: f32, fallback: f32, context: &str) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        warn!("invalid {context} probability {value}, substituting {fallback}");
        fallback
    }
}

/// Sanitizes a damage request: finite, at least 1, floored to an integer.
#[must_use]
pub fn damage_amount(value: f32, context: &str) -> u32 {
    let value = non_negative(value, DAMAGE_FALLBACK, context);
    (value.floor() as u32).max(1)
}
