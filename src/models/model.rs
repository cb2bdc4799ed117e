//! The model interface used by the fitter.
//!
//! The fitter relies on three primitive capabilities:
//! - `parameter_bounds` (the box the optimizer may search)
//! - `parameter_count` (for degrees of freedom and information criteria)
//! - `evaluate` (predicted observable at one independent value)
//!
//! `evaluate` must be total on the declared bounds. A model that has a
//! singularity somewhere in its domain clamps its inputs itself.

use std::fmt;

use crate::error::{HarnessError, Result};

pub trait Model: Send + Sync {
    fn name(&self) -> &str;

    /// One `(lower, upper)` pair per parameter, in parameter order.
    fn parameter_bounds(&self) -> &[(f64, f64)];

    fn evaluate(&self, x: f64, params: &[f64]) -> f64;

    fn parameter_count(&self) -> usize {
        self.parameter_bounds().len()
    }

    /// Labels used in reports. Defaults to `p0, p1, ...`.
    fn parameter_names(&self) -> Vec<String> {
        (0..self.parameter_count()).map(|i| format!("p{i}")).collect()
    }
}

impl fmt::Debug for dyn Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("bounds", &self.parameter_bounds())
            .finish()
    }
}

/// Check that bounds are usable: one finite `lo <= hi` pair per parameter.
pub fn validate_bounds(model: &dyn Model) -> Result<()> {
    let bounds = model.parameter_bounds();
    if bounds.is_empty() {
        return Err(HarnessError::validation(format!(
            "model '{}' declares no parameters",
            model.name()
        )));
    }
    for (i, &(lo, hi)) in bounds.iter().enumerate() {
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(HarnessError::validation(format!(
                "model '{}' has invalid bounds for parameter {i}: [{lo}, {hi}]",
                model.name()
            )));
        }
    }
    Ok(())
}

/// `true` when every parameter lies inside its bound.
pub fn within_bounds(params: &[f64], bounds: &[(f64, f64)]) -> bool {
    params.len() == bounds.len()
        && params
            .iter()
            .zip(bounds)
            .all(|(&p, &(lo, hi))| p >= lo && p <= hi)
}

/// Project a parameter vector onto the bound box.
pub fn clamp_to_bounds(params: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    params
        .iter()
        .zip(bounds)
        .map(|(&v, &(lo, hi))| if v.is_nan() { 0.5 * (lo + hi) } else { v.clamp(lo, hi) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FnModel;

    #[test]
    fn clamp_projects_into_box() {
        let bounds = [(0.0, 1.0), (-2.0, 2.0)];
        assert_eq!(clamp_to_bounds(&[1.5, -3.0], &bounds), vec![1.0, -2.0]);
        assert_eq!(clamp_to_bounds(&[f64::NAN, 0.5], &bounds), vec![0.5, 0.5]);
        assert!(within_bounds(&[1.0, -2.0], &bounds));
        assert!(!within_bounds(&[1.0 + 1e-12, 0.0], &bounds));
    }

    #[test]
    fn validate_bounds_rejects_inverted_ranges() {
        let bad = FnModel::new("bad", vec![(1.0, 0.0)], |x, p| p[0] * x);
        assert!(matches!(validate_bounds(&bad), Err(HarnessError::Validation(_))));
        let none = FnModel::new("none", vec![], |_, _| 0.0);
        assert!(validate_bounds(&none).is_err());
    }
}
