//! Iterative proportional fitting of one potential to soft-evidence targets.
//!
//! Each sweep rescales the potential, one soft-evidence variable at a time,
//! so that its marginal equals the target distribution:
//!
//! ```text
//! ψ(x) ← ψ(x) · q(x_v) / ψ(x_v)
//! ```
//!
//! Sweeps repeat until no cell moves by more than `epsilon`, or the
//! iteration cap is hit. With a single target the first sweep is exact.

use jt_config::InferenceConfig;
use jt_math::max_abs_diff;
use serde::Serialize;
use tracing::{debug, warn};

use super::potential::Potential;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IpfpSettings {
    /// Largest cell change that counts as converged.
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for IpfpSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            max_iterations: 100,
        }
    }
}

impl IpfpSettings {
    /// Tight settings for comparing engines in tests.
    pub fn strict() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 10_000,
        }
    }
}

impl From<&InferenceConfig> for IpfpSettings {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            epsilon: config.ipfp_epsilon,
            max_iterations: config.ipfp_max_iterations,
        }
    }
}

/// Fitted potential and how the fit went.
#[derive(Debug, Clone)]
pub struct IpfpOutcome {
    pub potential: Potential,
    pub iterations: usize,
    pub converged: bool,
    pub max_delta: f64,
    /// A target put mass on a state the potential gives zero probability.
    pub degenerate: bool,
}

/// Serializable digest of an [`IpfpOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IpfpSummary {
    pub iterations: usize,
    pub converged: bool,
    pub max_delta: f64,
    pub degenerate: bool,
}

impl From<&IpfpOutcome> for IpfpSummary {
    fn from(outcome: &IpfpOutcome) -> Self {
        Self {
            iterations: outcome.iterations,
            converged: outcome.converged,
            max_delta: outcome.max_delta,
            degenerate: outcome.degenerate,
        }
    }
}

/// Fit `potential` so each `(var, target)` marginal matches.
///
/// The input is left untouched; the fitted copy is returned. Targets must be
/// normalized distributions over the variable's states.
pub fn fit(potential: &Potential, targets: &[(usize, Vec<f64>)], settings: &IpfpSettings) -> IpfpOutcome {
    let mut current = potential.clone();
    let mut outcome = IpfpOutcome {
        potential: current.clone(),
        iterations: 0,
        converged: targets.is_empty(),
        max_delta: 0.0,
        degenerate: false,
    };
    if targets.is_empty() {
        return outcome;
    }

    for iteration in 1..=settings.max_iterations {
        let before = current.values().to_vec();
        for (var, target) in targets {
            let marginal = current.marginalize(&[*var]);
            let factors: Vec<f64> = marginal
                .values()
                .iter()
                .zip(target)
                .map(|(&m, &q)| {
                    if m > 0.0 {
                        q / m
                    } else {
                        if q > 0.0 {
                            outcome.degenerate = true;
                        }
                        0.0
                    }
                })
                .collect();
            current.scale_variable(*var, &factors);
        }
        let delta = max_abs_diff(&before, current.values());
        outcome.iterations = iteration;
        outcome.max_delta = delta;
        if delta <= settings.epsilon {
            outcome.converged = true;
            break;
        }
    }

    if outcome.degenerate {
        warn!("soft evidence targets a state with zero probability; that mass is dropped");
    }
    if outcome.converged {
        debug!(
            iterations = outcome.iterations,
            max_delta = outcome.max_delta,
            "IPFP converged"
        );
    } else {
        warn!(
            iterations = outcome.iterations,
            max_delta = outcome.max_delta,
            epsilon = settings.epsilon,
            "IPFP hit the iteration cap before converging"
        );
    }
    outcome.potential = current;
    outcome
}
