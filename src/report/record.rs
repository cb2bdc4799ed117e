//! Structured report records.
//!
//! Records are plain data: serializable as-is, or flattened into a
//! `key -> value` map for consumers that want a single row per fit. Nothing
//! here performs I/O.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{ComparisonResult, FitResult, Preference};
use crate::error::{ErrorKind, HarnessError};

/// A single report cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for ReportValue {
    fn from(value: f64) -> Self {
        ReportValue::Number(value)
    }
}

impl From<usize> for ReportValue {
    fn from(value: usize) -> Self {
        ReportValue::Number(value as f64)
    }
}

impl From<bool> for ReportValue {
    fn from(value: bool) -> Self {
        ReportValue::Flag(value)
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(value: String) -> Self {
        ReportValue::Text(value)
    }
}

pub type ReportMap = BTreeMap<String, ReportValue>;

/// serde_json writes non-finite floats as `null`; read them back as NaN.
fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub name: String,
    pub value: f64,
    /// 1-sigma error; serialized as `null` when not estimable.
    #[serde(deserialize_with = "nan_if_null")]
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub model: String,
    pub parameters: Vec<ParameterRecord>,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    pub reduced_chi_square: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub p_value: f64,
    pub bic: f64,
    pub aic: f64,
    pub n_points: usize,
    pub converged: bool,
}

impl From<&FitResult> for FitRecord {
    fn from(fit: &FitResult) -> Self {
        let parameters = fit
            .parameter_names
            .iter()
            .zip(&fit.parameters)
            .zip(&fit.parameter_errors)
            .map(|((name, &value), &error)| ParameterRecord {
                name: name.clone(),
                value,
                error,
            })
            .collect();
        Self {
            model: fit.model.clone(),
            parameters,
            chi_square: fit.chi_square,
            degrees_of_freedom: fit.degrees_of_freedom,
            reduced_chi_square: fit.reduced_chi_square,
            p_value: fit.p_value,
            bic: fit.bic,
            aic: fit.aic,
            n_points: fit.n_points,
            converged: fit.converged,
        }
    }
}

impl FitRecord {
    /// Flatten into `key -> value`, every key prefixed with `prefix`.
    pub fn to_map_with_prefix(&self, prefix: &str) -> ReportMap {
        let mut map = ReportMap::new();
        let mut put = |key: &str, value: ReportValue| {
            map.insert(format!("{prefix}{key}"), value);
        };
        put("model", self.model.as_str().into());
        for p in &self.parameters {
            put(&format!("param.{}", p.name), p.value.into());
            put(&format!("error.{}", p.name), p.error.into());
        }
        put("chi_square", self.chi_square.into());
        put("degrees_of_freedom", self.degrees_of_freedom.into());
        put("reduced_chi_square", self.reduced_chi_square.into());
        put("p_value", self.p_value.into());
        put("bic", self.bic.into());
        put("aic", self.aic.into());
        put("n_points", self.n_points.into());
        put("converged", self.converged.into());
        map
    }

    pub fn to_map(&self) -> ReportMap {
        self.to_map_with_prefix("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub baseline: FitRecord,
    pub candidate: FitRecord,
    pub improvement_fraction: f64,
    pub delta_chi_square: f64,
    pub delta_bic: f64,
    #[serde(deserialize_with = "nan_if_null")]
    pub significance_sigma: f64,
    pub preferred: Preference,
}

impl From<&ComparisonResult> for ComparisonRecord {
    fn from(c: &ComparisonResult) -> Self {
        Self {
            baseline: FitRecord::from(&c.baseline),
            candidate: FitRecord::from(&c.candidate),
            improvement_fraction: c.improvement_fraction,
            delta_chi_square: c.delta_chi_square,
            delta_bic: c.delta_bic,
            significance_sigma: c.significance_sigma,
            preferred: c.preferred,
        }
    }
}

impl ComparisonRecord {
    pub fn to_map(&self) -> ReportMap {
        let mut map = self.baseline.to_map_with_prefix("baseline.");
        map.extend(self.candidate.to_map_with_prefix("candidate."));
        map.insert("improvement_fraction".into(), self.improvement_fraction.into());
        map.insert("delta_chi_square".into(), self.delta_chi_square.into());
        map.insert("delta_bic".into(), self.delta_bic.into());
        map.insert("significance_sigma".into(), self.significance_sigma.into());
        map.insert("preferred".into(), self.preferred.display_name().into());
        map
    }
}

/// Result of one dataset in a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Fitted { fit: FitRecord },
    Compared { comparisons: Vec<ComparisonRecord> },
    Failed { kind: ErrorKind, message: String },
}

impl From<&HarnessError> for BatchOutcome {
    fn from(err: &HarnessError) -> Self {
        BatchOutcome::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub dataset: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Failed { .. })
    }

    /// One map per row: a fit gives one row, a comparison one row per candidate,
    /// a failure one row carrying the error.
    pub fn to_maps(&self) -> Vec<ReportMap> {
        let with_dataset = |mut map: ReportMap| {
            map.insert("dataset".into(), self.dataset.as_str().into());
            map
        };
        match &self.outcome {
            BatchOutcome::Fitted { fit } => vec![with_dataset(fit.to_map())],
            BatchOutcome::Compared { comparisons } => {
                comparisons.iter().map(|c| with_dataset(c.to_map())).collect()
            }
            BatchOutcome::Failed { kind, message } => {
                let mut map = ReportMap::new();
                map.insert("status".into(), "failed".into());
                map.insert(
                    "error.kind".into(),
                    serde_json::to_value(kind)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default()
                        .into(),
                );
                map.insert("error.message".into(), message.as_str().into());
                vec![with_dataset(map)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> FitRecord {
        FitRecord {
            model: "isothermal_halo".into(),
            parameters: vec![
                ParameterRecord {
                    name: "mass".into(),
                    value: 2.0,
                    error: 0.3,
                },
                ParameterRecord {
                    name: "r_core".into(),
                    value: 0.01,
                    error: f64::NAN,
                },
            ],
            chi_square: 14.0,
            degrees_of_freedom: 12,
            reduced_chi_square: 14.0 / 12.0,
            p_value: 0.3,
            bic: 21.7,
            aic: 20.0,
            n_points: 15,
            converged: true,
        }
    }

    #[test]
    fn fit_map_has_one_key_per_parameter_and_error() {
        let map = record().to_map();
        assert_eq!(map.get("model"), Some(&ReportValue::Text("isothermal_halo".into())));
        assert_eq!(map.get("param.mass"), Some(&ReportValue::Number(2.0)));
        assert!(matches!(map.get("error.r_core"), Some(ReportValue::Number(v)) if v.is_nan()));
        assert_eq!(map.get("converged"), Some(&ReportValue::Flag(true)));
    }

    #[test]
    fn null_errors_read_back_as_nan() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains(r#""error":null"#));
        let back: FitRecord = serde_json::from_str(&json).unwrap();
        assert!(back.parameters[1].error.is_nan());
        assert_eq!(back.parameters[0].error, 0.3);
    }

    #[test]
    fn failed_entry_serializes_with_status_tag() {
        let entry = BatchEntry {
            dataset: "ddo154".into(),
            outcome: BatchOutcome::from(&HarnessError::EmptyDataset("no rows".into())),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "empty_dataset");
        assert_eq!(json["dataset"], "ddo154");

        let rows = entry.to_maps();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("error.kind"), Some(&ReportValue::Text("empty_dataset".into())));
    }
}
