//! Formula-agnostic models: closures, proportional and power-law relations.

use crate::models::Model;

/// Smallest `x` handed to `x^b`, so negative exponents stay finite.
const POWER_LAW_X_FLOOR: f64 = 1e-9;

type EvalFn = dyn Fn(f64, &[f64]) -> f64 + Send + Sync;

/// A model backed by a closure.
///
/// Handy for ad-hoc formulas from analysis scripts: the closure must honour the
/// same contract as any other model (total on the declared bounds).
pub struct FnModel {
    name: String,
    bounds: Vec<(f64, f64)>,
    names: Option<Vec<String>>,
    f: Box<EvalFn>,
}

impl FnModel {
    pub fn new<F>(name: impl Into<String>, bounds: Vec<(f64, f64)>, f: F) -> Self
    where
        F: Fn(f64, &[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            bounds,
            names: None,
            f: Box::new(f),
        }
    }

    pub fn with_parameter_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

impl Model for FnModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        (self.f)(x, params)
    }

    fn parameter_names(&self) -> Vec<String> {
        match &self.names {
            Some(names) if names.len() == self.bounds.len() => names.clone(),
            _ => (0..self.bounds.len()).map(|i| format!("p{i}")).collect(),
        }
    }
}

/// `y = a·x`.
#[derive(Debug, Clone)]
pub struct Proportional {
    bounds: [(f64, f64); 1],
}

impl Proportional {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            bounds: [(lower, upper)],
        }
    }
}

impl Default for Proportional {
    fn default() -> Self {
        Self::new(0.0, 10.0)
    }
}

impl Model for Proportional {
    fn name(&self) -> &str {
        "proportional"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        params[0] * x
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["a".into()]
    }
}

/// `y = a·x^b`, with `x` floored at a tiny positive value.
#[derive(Debug, Clone)]
pub struct PowerLaw {
    bounds: [(f64, f64); 2],
}

impl PowerLaw {
    pub fn new(amplitude: (f64, f64), exponent: (f64, f64)) -> Self {
        Self {
            bounds: [amplitude, exponent],
        }
    }
}

impl Default for PowerLaw {
    fn default() -> Self {
        Self::new((0.0, 1e3), (-3.0, 3.0))
    }
}

impl Model for PowerLaw {
    fn name(&self) -> &str {
        "power_law"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, x: f64, params: &[f64]) -> f64 {
        params[0] * x.max(POWER_LAW_X_FLOOR).powf(params[1])
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["amplitude".into(), "exponent".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fn_model_uses_custom_names_only_when_complete() {
        let m = FnModel::new("line", vec![(0.0, 1.0), (0.0, 1.0)], |x, p| p[0] + p[1] * x);
        assert_eq!(m.parameter_names(), vec!["p0", "p1"]);
        let m = m.with_parameter_names(["b", "m"]);
        assert_eq!(m.parameter_names(), vec!["b", "m"]);
        assert_eq!(m.evaluate(2.0, &[1.0, 0.5]), 2.0);
    }

    #[test]
    fn power_law_is_finite_at_zero() {
        let m = PowerLaw::default();
        let v = m.evaluate(0.0, &[2.0, -1.5]);
        assert!(v.is_finite() && v > 0.0);
        assert!((m.evaluate(4.0, &[2.0, 0.5]) - 4.0).abs() < 1e-12);
    }
}
