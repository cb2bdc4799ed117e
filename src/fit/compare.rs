//! Model comparison: candidates against a shared baseline fit.
//!
//! The baseline is fitted once per dataset and every candidate is measured
//! against that same fit. For each pair we report:
//! - the fractional chi-squared improvement
//! - ΔBIC (`candidate - baseline`)
//! - a likelihood-ratio significance (Wilks, `max(1, k_c - k_b)` dof)
//!
//! The candidate is preferred only with a strictly lower chi-squared; equality
//! resolves to the baseline.

use tracing::info;

use crate::domain::{ComparisonResult, Dataset, FitResult, Preference};
use crate::error::Result;
use crate::fit::Fitter;
use crate::math::improvement_sigma;
use crate::models::Model;

/// Fit the baseline once, then each candidate, and compare every candidate to it.
pub fn compare(
    fitter: &Fitter,
    dataset: &Dataset,
    baseline: &dyn Model,
    candidates: &[&dyn Model],
) -> Result<Vec<ComparisonResult>> {
    let baseline_fit = fitter.fit(dataset, baseline)?;

    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let candidate_fit = fitter.fit(dataset, *candidate)?;
        let comparison = compare_fits(&baseline_fit, &candidate_fit);
        info!(
            dataset = dataset.label().unwrap_or("-"),
            baseline = %comparison.baseline.model,
            candidate = %comparison.candidate.model,
            improvement = comparison.improvement_fraction,
            preferred = comparison.preferred.display_name(),
            "comparison complete"
        );
        out.push(comparison);
    }
    Ok(out)
}

/// Compare two finished fits of the same dataset.
pub fn compare_fits(baseline: &FitResult, candidate: &FitResult) -> ComparisonResult {
    let delta_chi_square = baseline.chi_square - candidate.chi_square;
    let improvement_fraction = if baseline.chi_square > 0.0 {
        delta_chi_square / baseline.chi_square
    } else {
        0.0
    };
    let preferred = if candidate.chi_square < baseline.chi_square {
        Preference::Candidate
    } else {
        Preference::Baseline
    };
    let extra_params = candidate
        .parameter_count()
        .saturating_sub(baseline.parameter_count());

    ComparisonResult {
        baseline: baseline.clone(),
        candidate: candidate.clone(),
        improvement_fraction,
        preferred,
        delta_chi_square,
        delta_bic: candidate.bic - baseline.bic,
        significance_sigma: improvement_sigma(delta_chi_square, extra_params),
    }
}

/// Pick the preferred fit by BIC.
///
/// Fits are considered in order of increasing parameter count; the first one
/// within 2 BIC points of the minimum wins, so extra parameters must buy a
/// clear improvement. Returns `None` for an empty slice.
pub fn select_by_bic(fits: &[FitResult]) -> Option<&FitResult> {
    let best_bic = fits.iter().map(|f| f.bic).fold(f64::INFINITY, f64::min);

    let mut order: Vec<&FitResult> = fits.iter().collect();
    order.sort_by_key(|f| f.parameter_count());
    order.into_iter().find(|f| f.bic <= best_bic + 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(model: &str, k: usize, chi_square: f64, bic: f64) -> FitResult {
        FitResult {
            model: model.to_string(),
            parameter_names: (0..k).map(|i| format!("p{i}")).collect(),
            parameters: vec![1.0; k],
            parameter_errors: vec![0.1; k],
            chi_square,
            degrees_of_freedom: 10 - k,
            n_points: 10,
            converged: true,
            reduced_chi_square: chi_square / (10 - k) as f64,
            p_value: 0.5,
            bic,
            aic: chi_square + 2.0 * k as f64,
            evaluations: 0,
            starts: 3,
        }
    }

    #[test]
    fn equal_chi_square_prefers_baseline() {
        let c = compare_fits(&fit("a", 1, 12.5, 14.8), &fit("b", 2, 12.5, 17.1));
        assert_eq!(c.preferred, Preference::Baseline);
        assert_eq!(c.improvement_fraction, 0.0);
        assert_eq!(c.significance_sigma, 0.0);
    }

    #[test]
    fn strictly_lower_chi_square_prefers_candidate() {
        let c = compare_fits(&fit("a", 1, 20.0, 22.3), &fit("b", 2, 11.0, 15.6));
        assert_eq!(c.preferred, Preference::Candidate);
        assert!((c.improvement_fraction - 0.45).abs() < 1e-12);
        assert!((c.significance_sigma - 3.0).abs() < 1e-6);
        assert!((c.delta_bic - (15.6 - 22.3)).abs() < 1e-12);
    }

    #[test]
    fn zero_baseline_chi_square_has_zero_improvement() {
        let c = compare_fits(&fit("a", 1, 0.0, 2.3), &fit("b", 1, 0.0, 2.3));
        assert_eq!(c.improvement_fraction, 0.0);
        assert_eq!(c.preferred, Preference::Baseline);
    }

    #[test]
    fn bic_selection_prefers_simpler_when_close() {
        let fits = vec![fit("complex", 3, 9.0, 10.5), fit("simple", 1, 10.0, 11.5)];
        assert_eq!(select_by_bic(&fits).unwrap().model, "simple");

        let fits = vec![fit("complex", 3, 1.0, 5.0), fit("simple", 1, 10.0, 11.5)];
        assert_eq!(select_by_bic(&fits).unwrap().model, "complex");
        assert!(select_by_bic(&[]).is_none());
    }
}
