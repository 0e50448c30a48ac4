//! Dirichlet-smoothed estimates for categorical CPT rows.
//!
//! With a symmetric prior `Dirichlet(α, ..., α)` and expected counts `n_i`,
//! the posterior mean is `(n_i + α) / Σ_j (n_j + α)`. `α = 0` reduces to the
//! maximum-likelihood estimate `n_i / Σ_j n_j`.

/// Posterior mean of a categorical distribution under a symmetric prior.
///
/// Returns `None` if any input is negative or non-finite, or if the smoothed
/// total is zero (an empty context without a prior).
pub fn posterior_mean(counts: &[f64], pseudo_count: f64) -> Option<Vec<f64>> {
    if counts.is_empty() || !pseudo_count.is_finite() || pseudo_count < 0.0 {
        return None;
    }
    if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return None;
    }
    let total: f64 = counts.iter().map(|c| c + pseudo_count).sum();
    if total <= 0.0 {
        return None;
    }
    Some(counts.iter().map(|c| (c + pseudo_count) / total).collect())
}
