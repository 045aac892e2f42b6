//! Monetary rounding and zero-safe division.
//!
//! Every stored or displayed amount is rounded to two decimal places. Callers
//! round at each derivation step rather than once at the end, so a value read
//! back from a record is always the value that the next step consumed.

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator`, or `0.0` when the denominator is zero or the
/// result would not be finite.
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

/// Whether two amounts round to the same cent.
#[must_use]
pub fn same_cents(a: f64, b: f64) -> bool {
    (round2(a) - round2(b)).abs() < 1e-6
}

/// `part / whole × 100`, or `0.0` unless `whole` is strictly positive.
#[must_use]
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        ratio(part * 100.0, whole)
    } else {
        0.0
    }
}

/// Multiplier for an overhead index expressed in percent (20 → 1.2).
#[must_use]
pub fn overhead_factor(overhead_index: f64) -> f64 {
    1.0 + overhead_index / 100.0
}
