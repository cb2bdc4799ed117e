//! Shared result types.
//!
//! Result types are plain serializable data. They are:
//!
//! - produced once by the fitter / comparator and never mutated afterwards
//! - flattened into report records
//! - exported to JSON

use serde::{Deserialize, Serialize};

/// Summary stats about the points of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Best fit of one model against one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: String,
    pub parameter_names: Vec<String>,
    pub parameters: Vec<f64>,
    /// 1-sigma errors from the local curvature of chi-squared; NaN when a
    /// direction is flat or concave.
    pub parameter_errors: Vec<f64>,
    pub chi_square: f64,
    /// `n_points - parameters.len()`, always >= 1.
    pub degrees_of_freedom: usize,
    pub n_points: usize,
    pub converged: bool,

    pub reduced_chi_square: f64,
    /// Probability of a chi-squared at least this large under the model.
    pub p_value: f64,
    pub bic: f64,
    pub aic: f64,

    /// Objective evaluations across all optimizer starts.
    pub evaluations: u64,
    pub starts: usize,
}

impl FitResult {
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

/// Which side of a comparison is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Baseline,
    Candidate,
    /// Reserved for consumers that apply their own tolerance; the comparator
    /// itself resolves equal chi-squared to `Baseline`.
    Tie,
}

impl Preference {
    pub fn display_name(self) -> &'static str {
        match self {
            Preference::Baseline => "baseline",
            Preference::Candidate => "candidate",
            Preference::Tie => "tie",
        }
    }
}

/// A candidate model measured against the shared baseline fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub baseline: FitResult,
    pub candidate: FitResult,
    /// `(baseline.chi² - candidate.chi²) / baseline.chi²`, `0.0` for a zero baseline.
    pub improvement_fraction: f64,
    pub preferred: Preference,

    pub delta_chi_square: f64,
    /// `candidate.bic - baseline.bic` (negative favours the candidate).
    pub delta_bic: f64,
    /// Gaussian-equivalent significance of the chi-squared improvement.
    pub significance_sigma: f64,
}
