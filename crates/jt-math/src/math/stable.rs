//! Numerically guarded primitives for potential-table arithmetic.

/// Division where any zero denominator yields 0.
///
/// A zero separator marginal marks an impossible configuration, so both
/// `0 / 0` and `x / 0` collapse to 0 instead of NaN or infinity.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `x * ln(y)` with the convention `0 * ln(0) = 0`.
///
/// Returns NEG_INFINITY when `x > 0` and `y == 0`.
#[inline]
pub fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    if y == 0.0 {
        return f64::NEG_INFINITY;
    }
    x * y.ln()
}

/// Relative change `|diff / previous|`, or infinity when undefined.
///
/// Equal values have no change, including `0` to `0`.
pub fn relative_change(current: f64, previous: f64) -> f64 {
    if current == previous {
        return 0.0;
    }
    let ratio = ((current - previous) / previous).abs();
    if ratio.is_finite() {
        ratio
    } else {
        f64::INFINITY
    }
}
