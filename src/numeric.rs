//! Division guards shared by every analysis stage
//!
//! Every ratio in a report must be finite. A zero (or non-finite) denominator
//! yields exactly `0.0`.

/// `numerator / denominator`, or `0.0` when the quotient is undefined
#[inline]
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    finite_or_zero(numerator / denominator)
}

/// Replace NaN and infinities with `0.0`
#[inline]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
