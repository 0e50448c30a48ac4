//! Property-based tests for jt-math numerical functions.

use proptest::prelude::*;
use jt_math::{approx_eq, dirichlet::posterior_mean, normalize, round_to, safe_div};

const TOL: f64 = 1e-10;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Normalization yields a distribution and is scale invariant.
    #[test]
    fn normalize_is_scale_invariant(
        values in prop::collection::vec(0.001f64..100.0, 1..8),
        scale in 0.01f64..1000.0,
    ) {
        let mut a = values.clone();
        let mut b: Vec<f64> = values.iter().map(|v| v * scale).collect();
        prop_assert!(normalize(&mut a).is_some());
        prop_assert!(normalize(&mut b).is_some());
        prop_assert!(approx_eq(a.iter().sum::<f64>(), 1.0, TOL));
        for (x, y) in a.iter().zip(&b) {
            prop_assert!(approx_eq(*x, *y, TOL), "{} != {}", x, y);
        }
    }

    /// Safe division never produces NaN or infinity for finite inputs.
    #[test]
    fn safe_div_is_finite(n in -1e6f64..1e6, d in prop_oneof![Just(0.0), 1e-6f64..1e6]) {
        prop_assert!(safe_div(n, d).is_finite());
    }

    /// Rounding moves a value by at most half a unit in the last digit.
    #[test]
    fn round_to_is_close(v in 0.0f64..1.0, digits in 1u32..12) {
        let r = round_to(v, digits);
        prop_assert!((r - v).abs() <= 0.5 * 10f64.powi(-(digits as i32)) + 1e-15);
    }

    /// Smoothed estimates are valid distributions.
    #[test]
    fn posterior_mean_sums_to_one(
        counts in prop::collection::vec(0.0f64..50.0, 2..6),
        alpha in 0.01f64..5.0,
    ) {
        let p = posterior_mean(&counts, alpha).unwrap();
        prop_assert!(approx_eq(p.iter().sum::<f64>(), 1.0, TOL));
        prop_assert!(p.iter().all(|x| *x > 0.0));
    }
}
