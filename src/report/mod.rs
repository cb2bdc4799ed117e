//! Reporting: structured records, per-point residuals, and text rendering.
//!
//! Nothing in this module touches the filesystem; `io::export` persists what
//! is built here.

pub mod format;
pub mod record;

pub use format::*;
pub use record::*;

use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, FitResult};
use crate::error::{HarnessError, Result};
use crate::models::Model;

/// Observed vs predicted value at one point of a fitted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Residual {
    pub x: f64,
    pub observed: f64,
    pub uncertainty: f64,
    pub predicted: f64,
    /// `observed - predicted`.
    pub residual: f64,
    /// `residual / uncertainty`.
    pub pull: f64,
}

/// Predicted values and residuals for each point, at the fitted parameters.
pub fn compute_residuals(dataset: &Dataset, model: &dyn Model, fit: &FitResult) -> Result<Vec<Residual>> {
    if model.name() != fit.model {
        return Err(HarnessError::validation(format!(
            "fit is for model `{}`, not `{}`",
            fit.model,
            model.name()
        )));
    }

    let mut out = Vec::with_capacity(dataset.len());
    for (x, y, sigma) in dataset.points() {
        let predicted = model.evaluate(x, &fit.parameters);
        if !predicted.is_finite() {
            return Err(HarnessError::Domain {
                model: fit.model.clone(),
                message: format!("non-finite prediction at x = {x}"),
            });
        }
        let residual = y - predicted;
        out.push(Residual {
            x,
            observed: y,
            uncertainty: sigma,
            predicted,
            residual,
            pull: residual / sigma,
        });
    }
    Ok(out)
}

/// The `top_n` points with the largest `|pull|`, largest first.
pub fn largest_pulls(residuals: &[Residual], top_n: usize) -> Vec<Residual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| b.pull.abs().total_cmp(&a.pull.abs()));
    sorted.truncate(top_n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Proportional;

    fn fit_for(model: &str, a: f64) -> FitResult {
        FitResult {
            model: model.to_string(),
            parameter_names: vec!["a".into()],
            parameters: vec![a],
            parameter_errors: vec![0.1],
            chi_square: 0.0,
            degrees_of_freedom: 2,
            n_points: 3,
            converged: true,
            reduced_chi_square: 0.0,
            p_value: 1.0,
            bic: 0.0,
            aic: 0.0,
            evaluations: 0,
            starts: 3,
        }
    }

    #[test]
    fn residuals_and_pulls() {
        let ds = Dataset::build(vec![1.0, 2.0, 3.0], vec![2.5, 4.0, 5.0], vec![0.5, 1.0, 2.0], Default::default())
            .unwrap();
        let res = compute_residuals(&ds, &Proportional::default(), &fit_for("proportional", 2.0)).unwrap();
        assert_eq!(res.len(), 3);
        assert!((res[0].residual - 0.5).abs() < 1e-12);
        assert!((res[0].pull - 1.0).abs() < 1e-12);
        assert!((res[2].predicted - 6.0).abs() < 1e-12);
        assert!((res[2].pull + 0.5).abs() < 1e-12);

        let top = largest_pulls(&res, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].x, 1.0);
        assert_eq!(top[1].x, 3.0);
    }

    #[test]
    fn mismatched_model_is_rejected() {
        let ds = Dataset::build(vec![1.0], vec![1.0], vec![1.0], Default::default()).unwrap();
        let err = compute_residuals(&ds, &Proportional::default(), &fit_for("power_law", 1.0)).unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }
}
