//! Numeric conversion helpers centralizing the lossy casts of the engine.

use num_traits::cast::cast;

/// Ceil a non-negative distance weight into `u64`, returning 0 for negative or non-finite input.
#[must_use]
pub fn ceil_weight(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    cast::<f64, u64>(value.ceil().min(max)).unwrap_or(0)
}

/// Round a scaled count and clamp it into `min..=max`.
#[must_use]
pub fn round_count(value: f64, min: u8, max: u8) -> u8 {
    if value.is_nan() {
        return min;
    }
    let clamped = value.round().clamp(f64::from(min), f64::from(max));
    cast::<f64, u8>(clamped).unwrap_or(min)
}

/// Whole minutes from a non-negative minute count, 0 for anything else.
#[must_use]
pub fn round_minutes(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u32>(value.round()).unwrap_or(0)
}

/// Floor a non-negative value into `0..=max`, returning 0 for NaN or negative input.
#[must_use]
pub fn floor_index(value: f64, max: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let clamped = value.floor().min(f64::from(max));
    cast::<f64, u32>(clamped).unwrap_or(max)
}

/// Widen a configured count into `usize`, saturating on narrow targets.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Convert an index into `u64`, saturating on wide targets.
#[must_use]
pub fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Convert a polling budget in milliseconds into a poll count, never below one.
#[must_use]
pub fn poll_budget(timeout_ms: u64, interval_ms: u64) -> u64 {
    if interval_ms == 0 {
        return timeout_ms.max(1);
    }
    (timeout_ms / interval_ms).max(1)
}
