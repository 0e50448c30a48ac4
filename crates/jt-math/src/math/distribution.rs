//! Helpers for discrete distributions stored as plain slices.

use super::stable::xlogy;

/// Normalize `values` in place so they sum to 1.
///
/// Returns the original total, or `None` (leaving `values` untouched) when
/// the total is not finite or not positive.
pub fn normalize(values: &mut [f64]) -> Option<f64> {
    let total: f64 = values.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    for v in values.iter_mut() {
        *v /= total;
    }
    Some(total)
}

/// Round `value` to `digits` decimal places.
///
/// Beyond what an `f64` can scale to, `value` is returned unchanged.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(i32::try_from(digits).unwrap_or(i32::MAX));
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}

/// Shannon entropy `-Σ p ln p` in nats, with `0 ln 0 = 0`.
pub fn entropy(values: &[f64]) -> f64 {
    -values.iter().map(|&p| xlogy(p, p)).sum::<f64>()
}

/// Largest elementwise absolute difference of two equally sized slices.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Approximate equality with an absolute tolerance.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol
}
