//! Seeded synthetic datasets drawn from a model at known parameters.
//!
//! Used to check that a fit recovers what was put in, and to produce demo
//! inputs without a catalog at hand.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::domain::{Dataset, Metadata};
use crate::error::{HarnessError, Result};
use crate::models::{Model, within_bounds};

/// Uncertainty reported for noiseless points (unit weights).
const NOISELESS_SIGMA: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub x_min: f64,
    pub x_max: f64,
    pub n: usize,
    /// Absolute Gaussian noise added to every point.
    pub noise_sigma: f64,
    /// Extra noise proportional to `|y_true|`.
    #[serde(default)]
    pub relative_noise: f64,
    pub seed: u64,
}

impl SyntheticSpec {
    fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(HarnessError::validation("synthetic point count must be > 0"));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite() && self.x_max >= self.x_min) {
            return Err(HarnessError::validation(format!(
                "invalid synthetic x range [{}, {}]",
                self.x_min, self.x_max
            )));
        }
        if self.n > 1 && self.x_max == self.x_min {
            return Err(HarnessError::validation("synthetic x range is empty"));
        }
        for (name, v) in [("noise_sigma", self.noise_sigma), ("relative_noise", self.relative_noise)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(HarnessError::validation(format!("{name} must be finite and >= 0, got {v}")));
            }
        }
        Ok(())
    }

    /// Evenly spaced abscissae on `[x_min, x_max]`.
    fn grid(&self) -> Vec<f64> {
        if self.n == 1 {
            return vec![self.x_min];
        }
        let step = (self.x_max - self.x_min) / (self.n - 1) as f64;
        (0..self.n).map(|i| self.x_min + step * i as f64).collect()
    }
}

/// Draw a dataset from `model` at `params`.
///
/// Each point gets `σ_i = noise_sigma + relative_noise·|y_true|` and
/// `y_i = y_true + N(0, σ_i)`; the reported uncertainty is `σ_i`. Points with
/// `σ_i = 0` are exact and carry unit uncertainty.
pub fn synthesize(model: &dyn Model, params: &[f64], spec: &SyntheticSpec) -> Result<Dataset> {
    spec.validate()?;
    let bounds = model.parameter_bounds();
    if params.len() != bounds.len() {
        return Err(HarnessError::validation(format!(
            "model '{}' takes {} parameter(s), got {}",
            model.name(),
            bounds.len(),
            params.len()
        )));
    }
    if !within_bounds(params, bounds) {
        return Err(HarnessError::validation(format!(
            "parameters {params:?} are outside the bounds of '{}'",
            model.name()
        )));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let x = spec.grid();
    let mut y = Vec::with_capacity(x.len());
    let mut sigma = Vec::with_capacity(x.len());

    for &xi in &x {
        let truth = model.evaluate(xi, params);
        if !truth.is_finite() {
            return Err(HarnessError::Domain {
                model: model.name().to_string(),
                message: format!("non-finite value at x = {xi}"),
            });
        }
        let s = spec.noise_sigma + spec.relative_noise * truth.abs();
        if s > 0.0 {
            let noise = Normal::new(0.0, s).map_err(|e| HarnessError::validation(format!("noise distribution: {e}")))?;
            y.push(truth + noise.sample(&mut rng));
            sigma.push(s);
        } else {
            y.push(truth);
            sigma.push(NOISELESS_SIGMA);
        }
    }

    let mut metadata = Metadata::new();
    metadata.insert("name".into(), format!("synthetic:{}", model.name()).into());
    metadata.insert("model".into(), model.name().into());
    metadata.insert("seed".into(), (spec.seed as f64).into());
    metadata.insert("noise_sigma".into(), spec.noise_sigma.into());

    Dataset::build(x, y, sigma, metadata)
}
