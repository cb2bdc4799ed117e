//! Report and dataset exports.
//!
//! JSON reports wrap the records in a [`ReportEnvelope`] so a file on disk
//! says which tool and version produced it, and when.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Dataset;
use crate::error::{HarnessError, Result};
use crate::fit::FitterConfig;
use crate::report::{BatchEntry, ComparisonRecord, FitRecord, Residual};

pub const TOOL_NAME: &str = "astrofit";

/// What a report file carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportBody {
    Fit {
        dataset: String,
        fit: FitRecord,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        residuals: Vec<Residual>,
    },
    Comparison {
        dataset: String,
        comparisons: Vec<ComparisonRecord>,
    },
    Batch {
        entries: Vec<BatchEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub fitter: FitterConfig,
    pub report: ReportBody,
}

impl ReportEnvelope {
    pub fn new(fitter: &FitterConfig, report: ReportBody) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            fitter: fitter.clone(),
            report,
        }
    }
}

pub fn write_report_json(path: &Path, envelope: &ReportEnvelope) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| HarnessError::Io(format!("failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, envelope)
        .map_err(|e| HarnessError::Io(format!("failed to write report JSON: {e}")))
}

pub fn read_report_json(path: &Path) -> Result<ReportEnvelope> {
    let file = File::open(path)
        .map_err(|e| HarnessError::Io(format!("failed to open report JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| HarnessError::Parse(format!("invalid report JSON: {e}")))
}

/// Write `x,y,sigma` rows with a header; readable back with `ColumnSpec::new("x", "y", "sigma")`.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| HarnessError::Io(format!("failed to create CSV '{}': {e}", path.display())))?;
    let io_err = |e: csv::Error| HarnessError::Io(format!("failed to write CSV '{}': {e}", path.display()));

    writer.write_record(["x", "y", "sigma"]).map_err(io_err)?;
    for (x, y, sigma) in dataset.points() {
        writer
            .write_record([x.to_string(), y.to_string(), sigma.to_string()])
            .map_err(io_err)?;
    }
    writer
        .flush()
        .map_err(|e| HarnessError::Io(format!("failed to flush CSV '{}': {e}", path.display())))
}
