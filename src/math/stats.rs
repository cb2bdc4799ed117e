//! Tail probabilities for goodness-of-fit and model-comparison significance.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// `P(X >= x)` for a chi-squared variable with `dof` degrees of freedom.
///
/// Returns NaN when `dof` is not positive or `x` is not finite.
pub fn chi_square_sf(x: f64, dof: f64) -> f64 {
    if !x.is_finite() {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 1.0;
    }
    match ChiSquared::new(dof) {
        Ok(dist) => dist.sf(x).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Two-sided Gaussian-equivalent significance of a p-value.
///
/// `p = 0.0455` maps to ~2σ. p-values that underflow are clamped to the smallest
/// positive normal, which caps the result at ~37.5σ.
pub fn p_value_to_sigma(p: f64) -> f64 {
    if p.is_nan() {
        return f64::NAN;
    }
    if p >= 1.0 {
        return 0.0;
    }
    let p = p.max(f64::MIN_POSITIVE);
    match Normal::new(0.0, 1.0) {
        Ok(normal) => -normal.inverse_cdf(0.5 * p),
        Err(_) => f64::NAN,
    }
}

/// Significance of a chi-squared improvement `delta` with `dof` extra
/// parameters (Wilks). Non-positive improvements are `0σ`.
pub fn improvement_sigma(delta: f64, dof: usize) -> f64 {
    if delta.is_nan() || delta <= 0.0 {
        return 0.0;
    }
    p_value_to_sigma(chi_square_sf(delta, dof.max(1) as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_square_sf_known_values() {
        // 95th percentile of chi²(1) is 3.841.
        assert!((chi_square_sf(3.841_458_8, 1.0) - 0.05).abs() < 1e-6);
        assert_eq!(chi_square_sf(0.0, 3.0), 1.0);
        assert!(chi_square_sf(1.0, 0.0).is_nan());
    }

    #[test]
    fn sigma_conversion_round_numbers() {
        assert!((p_value_to_sigma(0.045_500_26) - 2.0).abs() < 1e-5);
        assert!((p_value_to_sigma(0.002_699_796) - 3.0).abs() < 1e-5);
        assert_eq!(p_value_to_sigma(1.0), 0.0);
        assert!(p_value_to_sigma(0.0).is_finite());
    }

    #[test]
    fn improvement_sigma_for_one_dof_is_sqrt_delta() {
        // For 1 dof, Δχ² = z².
        assert!((improvement_sigma(9.0, 1) - 3.0).abs() < 1e-6);
        assert_eq!(improvement_sigma(-1.0, 1), 0.0);
        assert_eq!(improvement_sigma(0.0, 2), 0.0);
    }
}
