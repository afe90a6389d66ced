//! Numeric conversion helpers centralizing lossy casts.

use num_traits::cast::cast;

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(f64::MAX)
}

/// Ceil a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = f64::from(u32::MAX);
    let clamped = value.clamp(0.0, max).ceil();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u64 range, returning 0 for non-finite values.
#[must_use]
pub fn ceil_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u64, f64>(u64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).ceil();
    cast::<f64, u64>(clamped).unwrap_or(u64::MAX)
}

/// Widen a count to u64, saturating on targets where usize is wider.
#[must_use]
pub fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Ratio of two counts, 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    u64_to_f64(numerator) / u64_to_f64(denominator)
}
