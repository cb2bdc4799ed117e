//! Command-line parsing for the `astrofit` binary.
//!
//! Parsing only; dispatch lives in `app`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::io::{ColumnSpec, TableFormat};
use crate::models::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "astrofit", version, about = "Chi-squared model fitting and comparison for 1-D astronomical data")]
pub struct Cli {
    /// JSON file with fitter settings and physical constants.
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Override the optimizer iteration budget per start.
    #[arg(long, global = true)]
    pub max_iters: Option<u64>,

    /// Wall-clock budget per fit, in milliseconds.
    #[arg(long, global = true)]
    pub time_budget_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the builtin models with their parameters and bounds.
    Models,
    /// Fit one model to one dataset.
    Fit(FitArgs),
    /// Compare candidate models against a baseline on one dataset.
    Compare(CompareArgs),
    /// Fit (or compare) across many datasets.
    Batch(BatchArgs),
    /// Write a synthetic dataset drawn from a model.
    Synth(SynthArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Whitespace,
}

/// How to read input tables.
#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    /// Table layout.
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// CSV field delimiter.
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Column holding x: header name or zero-based index.
    #[arg(long = "x-col", default_value = "x")]
    pub x_col: String,

    /// Column holding y: header name or zero-based index.
    #[arg(long = "y-col", default_value = "y")]
    pub y_col: String,

    /// Column holding the 1-sigma uncertainty of y: header name or zero-based index.
    #[arg(long = "sigma-col", default_value = "sigma")]
    pub sigma_col: String,

    /// Shorthand for SPARC rotmod tables (whitespace; columns 0, 1, 2).
    #[arg(long, conflicts_with_all = ["format", "x_col", "y_col", "sigma_col"])]
    pub rotmod: bool,
}

impl TableArgs {
    pub fn table_format(&self) -> TableFormat {
        if self.rotmod {
            return TableFormat::Whitespace;
        }
        match self.format {
            FormatArg::Csv => TableFormat::Csv {
                delimiter: u8::try_from(self.delimiter).unwrap_or(b','),
            },
            FormatArg::Whitespace => TableFormat::Whitespace,
        }
    }

    pub fn column_spec(&self) -> ColumnSpec {
        if self.rotmod {
            return ColumnSpec::rotmod();
        }
        ColumnSpec::new(self.x_col.as_str(), self.y_col.as_str(), self.sigma_col.as_str())
    }
}

#[derive(Debug, Clone, Args)]
pub struct FitArgs {
    /// Input table.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[arg(short, long, value_enum)]
    pub model: ModelKind,

    #[command(flatten)]
    pub table: TableArgs,

    /// Print every residual instead of only the largest pulls.
    #[arg(long)]
    pub residuals: bool,

    /// Write the report as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    #[arg(short, long, value_enum)]
    pub baseline: ModelKind,

    /// Candidate model (repeatable).
    #[arg(short, long = "candidate", value_enum, required = true)]
    pub candidates: Vec<ModelKind>,

    #[command(flatten)]
    pub table: TableArgs,

    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Input tables; each is reported under its file stem.
    #[arg(value_name = "FILE", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Model to fit, or the baseline when candidates are given.
    #[arg(short, long, value_enum)]
    pub model: ModelKind,

    /// Candidate model (repeatable); switches the batch to comparisons.
    #[arg(short, long = "candidate", value_enum)]
    pub candidates: Vec<ModelKind>,

    #[command(flatten)]
    pub table: TableArgs,

    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SynthArgs {
    #[arg(short, long, value_enum)]
    pub model: ModelKind,

    /// True parameter values, comma separated.
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub params: Vec<f64>,

    #[arg(long, default_value_t = 0.5)]
    pub x_min: f64,

    #[arg(long, default_value_t = 20.0)]
    pub x_max: f64,

    #[arg(short = 'n', long, default_value_t = 30)]
    pub points: usize,

    /// Absolute Gaussian noise per point.
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    /// Extra noise proportional to |y|.
    #[arg(long, default_value_t = 0.0)]
    pub relative_noise: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (`x,y,sigma`).
    #[arg(short, long, value_name = "CSV")]
    pub out: PathBuf,
}
