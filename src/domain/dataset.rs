//! A single observational series: `(x_i, y_i, σ_i)` plus free-form metadata.
//!
//! A `Dataset` can only be obtained through [`Dataset::build`] (or derived from an
//! existing one), so every instance satisfies:
//!
//! - the three columns have the same, non-zero length
//! - every value is finite
//! - every uncertainty is strictly positive (chi-squared is undefined otherwise)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::DatasetStats;
use crate::error::{HarnessError, Result};

/// A metadata value attached to a dataset (units, source identifier, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Flag(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    independent: Vec<f64>,
    observed: Vec<f64>,
    uncertainty: Vec<f64>,
    metadata: Metadata,
}

impl Dataset {
    /// Validate three parallel columns and wrap them into a dataset.
    pub fn build(
        independent: Vec<f64>,
        observed: Vec<f64>,
        uncertainty: Vec<f64>,
        metadata: Metadata,
    ) -> Result<Self> {
        let n = independent.len();
        if observed.len() != n || uncertainty.len() != n {
            return Err(HarnessError::validation(format!(
                "column lengths differ: independent={n}, observed={}, uncertainty={}",
                observed.len(),
                uncertainty.len()
            )));
        }
        if n == 0 {
            return Err(HarnessError::validation("dataset must contain at least one point"));
        }

        for i in 0..n {
            if !independent[i].is_finite() || !observed[i].is_finite() {
                return Err(HarnessError::validation(format!(
                    "point {i} is not finite (x={}, y={})",
                    independent[i], observed[i]
                )));
            }
            let sigma = uncertainty[i];
            if !(sigma.is_finite() && sigma > 0.0) {
                return Err(HarnessError::validation(format!(
                    "uncertainty at point {i} must be finite and > 0, got {sigma}"
                )));
            }
        }

        Ok(Self {
            independent,
            observed,
            uncertainty,
            metadata,
        })
    }

    /// Keep only the points for which `predicate(x, y)` holds.
    ///
    /// Returns a new dataset (metadata is carried over); `self` is left untouched.
    pub fn filter_valid<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> bool,
    {
        let mut independent = Vec::with_capacity(self.len());
        let mut observed = Vec::with_capacity(self.len());
        let mut uncertainty = Vec::with_capacity(self.len());

        for (x, y, sigma) in self.points() {
            if predicate(x, y) {
                independent.push(x);
                observed.push(y);
                uncertainty.push(sigma);
            }
        }

        if independent.is_empty() {
            return Err(HarnessError::EmptyDataset(format!(
                "filter removed all {} point(s){}",
                self.len(),
                self.label().map(|l| format!(" of '{l}'")).unwrap_or_default()
            )));
        }

        Ok(Self {
            independent,
            observed,
            uncertainty,
            metadata: self.metadata.clone(),
        })
    }

    /// Return a copy with one extra metadata entry.
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        let mut out = self.clone();
        out.metadata.insert(key.into(), value.into());
        out
    }

    pub fn len(&self) -> usize {
        self.independent.len()
    }

    /// Always `false`: construction rejects empty columns.
    pub fn is_empty(&self) -> bool {
        self.independent.is_empty()
    }

    pub fn independent(&self) -> &[f64] {
        &self.independent
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    pub fn uncertainty(&self) -> &[f64] {
        &self.uncertainty
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// `(x, y, σ)` triples in input order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.independent
            .iter()
            .zip(&self.observed)
            .zip(&self.uncertainty)
            .map(|((&x, &y), &s)| (x, y, s))
    }

    /// The `name` (or `source`) metadata entry, if it is text.
    pub fn label(&self) -> Option<&str> {
        ["name", "source"].iter().find_map(|key| match self.metadata.get(*key) {
            Some(MetadataValue::Text(s)) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn stats(&self) -> DatasetStats {
        let mut stats = DatasetStats {
            n_points: self.len(),
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
        };
        for (x, y, _) in self.points() {
            stats.x_min = stats.x_min.min(x);
            stats.x_max = stats.x_max.max(x);
            stats.y_min = stats.y_min.min(y);
            stats.y_max = stats.y_max.max(y);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::build(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![10.0, -5.0, 30.0, 40.0],
            vec![1.0, 1.0, 2.0, 2.0],
            Metadata::from([("name".to_string(), "NGC0000".into())]),
        )
        .unwrap()
    }

    #[test]
    fn with_metadata_leaves_the_original_untouched() {
        let ds = sample();
        let renamed = ds.with_metadata("name", "NGC3198").with_metadata("distance_mpc", 13.8);
        assert_eq!(ds.label(), Some("NGC0000"));
        assert_eq!(renamed.label(), Some("NGC3198"));
        assert_eq!(renamed.metadata().get("distance_mpc"), Some(&MetadataValue::Number(13.8)));
        assert_eq!(renamed.observed(), ds.observed());
    }

    #[test]
    fn build_rejects_length_mismatch() {
        let err = Dataset::build(vec![1.0, 2.0], vec![1.0], vec![1.0, 1.0], Metadata::new()).unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }

    #[test]
    fn build_rejects_empty_columns() {
        let err = Dataset::build(vec![], vec![], vec![], Metadata::new()).unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }

    #[test]
    fn build_rejects_non_positive_uncertainty() {
        for bad in [0.0, -0.1, f64::NAN] {
            let err = Dataset::build(vec![1.0, 2.0], vec![1.0, 2.0], vec![0.5, bad], Metadata::new())
                .unwrap_err();
            assert!(matches!(err, HarnessError::Validation(_)), "sigma={bad}");
        }
    }

    #[test]
    fn build_rejects_non_finite_values() {
        let err = Dataset::build(vec![1.0, f64::INFINITY], vec![1.0, 2.0], vec![1.0, 1.0], Metadata::new())
            .unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }

    #[test]
    fn filter_keeps_matching_points_and_leaves_original() {
        let ds = sample();
        let filtered = ds.filter_valid(|_, y| y > 0.0).unwrap();
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered.independent(), &[1.0, 3.0, 4.0]);
        assert_eq!(filtered.uncertainty(), &[1.0, 2.0, 2.0]);
        assert_eq!(filtered.label(), Some("NGC0000"));
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn filter_that_removes_everything_is_an_error() {
        let err = sample().filter_valid(|x, _| x > 100.0).unwrap_err();
        assert!(matches!(err, HarnessError::EmptyDataset(_)));
    }

    #[test]
    fn stats_cover_ranges() {
        let s = sample().stats();
        assert_eq!(s.n_points, 4);
        assert_eq!((s.x_min, s.x_max), (1.0, 4.0));
        assert_eq!((s.y_min, s.y_max), (-5.0, 40.0));
    }
}
