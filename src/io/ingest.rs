//! Table ingest.
//!
//! Turns a delimited text file into a validated [`Dataset`]. Two layouts are
//! understood:
//!
//! - **CSV** with a header row; columns are addressed by name or index
//! - **whitespace tables** as distributed with most astronomical catalogs
//!   (`#` comment lines, no header); columns are addressed by index only
//!
//! Bad rows are skipped and reported as [`RowError`]s instead of failing the
//! whole file. A file with no usable rows is an [`HarnessError::EmptyDataset`].

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Dataset, DatasetStats, Metadata};
use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    Csv { delimiter: u8 },
    Whitespace,
}

impl TableFormat {
    pub fn csv() -> Self {
        TableFormat::Csv { delimiter: b',' }
    }

    fn label(self) -> &'static str {
        match self {
            TableFormat::Csv { .. } => "csv",
            TableFormat::Whitespace => "whitespace",
        }
    }
}

/// A column reference: header name (case-insensitive) or zero-based index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Index(usize),
    Name(String),
}

impl From<usize> for Column {
    fn from(value: usize) -> Self {
        Column::Index(value)
    }
}

impl From<&str> for Column {
    fn from(value: &str) -> Self {
        // "2" on the command line means the third column, not a header named "2".
        match value.trim().parse::<usize>() {
            Ok(idx) => Column::Index(idx),
            Err(_) => Column::Name(value.to_string()),
        }
    }
}

/// Which columns hold `x`, `y` and `σ`, plus optional unit labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub x: Column,
    pub y: Column,
    pub sigma: Column,
    #[serde(default)]
    pub x_unit: Option<String>,
    #[serde(default)]
    pub y_unit: Option<String>,
}

impl ColumnSpec {
    pub fn new(x: impl Into<Column>, y: impl Into<Column>, sigma: impl Into<Column>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            sigma: sigma.into(),
            x_unit: None,
            y_unit: None,
        }
    }

    /// SPARC `*_rotmod.dat` layout: radius (kpc), observed velocity and its error (km/s).
    pub fn rotmod() -> Self {
        Self::new(0, 1, 2).with_units("kpc", "km/s")
    }

    pub fn with_units(mut self, x_unit: impl Into<String>, y_unit: impl Into<String>) -> Self {
        self.x_unit = Some(x_unit.into());
        self.y_unit = Some(y_unit.into());
        self
    }
}

/// A row skipped during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line number in the source file.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Load a dataset from `path`; the path is recorded as the `source` metadata.
pub fn load_dataset(path: &Path, format: TableFormat, columns: &ColumnSpec) -> Result<IngestedData> {
    let file =
        File::open(path).map_err(|e| HarnessError::Io(format!("failed to open '{}': {e}", path.display())))?;
    read_dataset(file, format, columns, &path.display().to_string())
}

/// Same as [`load_dataset`] for any reader; `source` names it in metadata and messages.
pub fn read_dataset<R: Read>(
    reader: R,
    format: TableFormat,
    columns: &ColumnSpec,
    source: &str,
) -> Result<IngestedData> {
    let mut rows = Rows::default();
    match format {
        TableFormat::Csv { delimiter } => read_csv(reader, delimiter, columns, &mut rows)?,
        TableFormat::Whitespace => read_whitespace(reader, columns, &mut rows)?,
    }

    for e in &rows.errors {
        warn!(source = source, line = e.line, "skipped row: {}", e.message);
    }

    let rows_used = rows.x.len();
    if rows_used == 0 {
        return Err(HarnessError::EmptyDataset(format!(
            "no usable rows in '{source}' ({} read, {} rejected)",
            rows.read,
            rows.errors.len()
        )));
    }

    let mut metadata = Metadata::new();
    metadata.insert("source".into(), source.into());
    metadata.insert("format".into(), format.label().into());
    if let Some(unit) = &columns.x_unit {
        metadata.insert("x_unit".into(), unit.as_str().into());
    }
    if let Some(unit) = &columns.y_unit {
        metadata.insert("y_unit".into(), unit.as_str().into());
    }

    let dataset = Dataset::build(rows.x, rows.y, rows.sigma, metadata)?;
    Ok(IngestedData {
        stats: dataset.stats(),
        dataset,
        row_errors: rows.errors,
        rows_read: rows.read,
        rows_used,
    })
}

#[derive(Default)]
struct Rows {
    x: Vec<f64>,
    y: Vec<f64>,
    sigma: Vec<f64>,
    errors: Vec<RowError>,
    read: usize,
}

impl Rows {
    fn push<'a>(&mut self, line: usize, field: impl Fn(usize) -> Option<&'a str>, idx: [usize; 3]) {
        self.read += 1;
        match parse_point(field, idx) {
            Ok([x, y, sigma]) => {
                self.x.push(x);
                self.y.push(y);
                self.sigma.push(sigma);
            }
            Err(message) => self.errors.push(RowError { line, message }),
        }
    }
}

fn read_csv<R: Read>(reader: R, delimiter: u8, columns: &ColumnSpec, rows: &mut Rows) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| HarnessError::Parse(format!("failed to read CSV header: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let idx = [
        resolve_column(&columns.x, &header_map)?,
        resolve_column(&columns.y, &header_map)?,
        resolve_column(&columns.sigma, &header_map)?,
    ];

    // Record positions count comment lines too; the enumerate fallback does not.
    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let line = source_line(record.position(), i);
                rows.push(line, |c| record.get(c), idx);
            }
            Err(e) => {
                rows.read += 1;
                rows.errors.push(RowError {
                    line: source_line(e.position(), i),
                    message: format!("CSV parse error: {e}"),
                });
            }
        }
    }
    Ok(())
}

fn source_line(position: Option<&csv::Position>, record_index: usize) -> usize {
    position
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(record_index + 2)
}

fn read_whitespace<R: Read>(reader: R, columns: &ColumnSpec, rows: &mut Rows) -> Result<()> {
    let idx = [
        index_only(&columns.x)?,
        index_only(&columns.y)?,
        index_only(&columns.sigma)?,
    ];

    for (i, line) in BufReader::new(reader).lines().enumerate() {
        let text = line.map_err(|e| HarnessError::Io(format!("read failed at line {}: {e}", i + 1)))?;
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = text.split_whitespace().collect();
        rows.push(i + 1, |c| fields.get(c).copied(), idx);
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn resolve_column(column: &Column, header_map: &HashMap<String, usize>) -> Result<usize> {
    match column {
        Column::Index(idx) => Ok(*idx),
        Column::Name(name) => header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| HarnessError::validation(format!("missing required column: `{name}`"))),
    }
}

fn index_only(column: &Column) -> Result<usize> {
    match column {
        Column::Index(idx) => Ok(*idx),
        Column::Name(name) => Err(HarnessError::validation(format!(
            "whitespace tables have no header; use a column index instead of `{name}`"
        ))),
    }
}

fn parse_point<'a>(field: impl Fn(usize) -> Option<&'a str>, idx: [usize; 3]) -> std::result::Result<[f64; 3], String> {
    const NAMES: [&str; 3] = ["x", "y", "sigma"];
    let mut out = [0.0; 3];
    for (slot, (&col, name)) in out.iter_mut().zip(idx.iter().zip(NAMES)) {
        let raw = field(col)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| format!("missing `{name}` value (column {col})"))?;
        let v: f64 = raw
            .parse()
            .map_err(|_| format!("invalid `{name}` value '{raw}'"))?;
        if !v.is_finite() {
            return Err(format!("non-finite `{name}` value"));
        }
        *slot = v;
    }
    if out[2] <= 0.0 {
        return Err(format!("uncertainty must be > 0, got {}", out[2]));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MetadataValue;

    #[test]
    fn csv_by_header_name_skips_bad_rows() {
        let text = "\u{feff}Radius,Vobs,errV\n1.0,100,5\n2.0,abc,5\n3.0,120,0\n4.0,130,4\n";
        let data = read_dataset(
            text.as_bytes(),
            TableFormat::csv(),
            &ColumnSpec::new("radius", "vobs", "errv"),
            "mem",
        )
        .unwrap();

        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.dataset.independent(), &[1.0, 4.0]);
        let lines: Vec<usize> = data.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, [3, 4]);
        assert_eq!(
            data.dataset.metadata().get("format"),
            Some(&MetadataValue::Text("csv".into()))
        );
    }

    #[test]
    fn csv_row_errors_count_comment_lines() {
        let text = "x,y,sigma\n# comment\n1,2,1\n2,bad,1\n3,4,1\n";
        let data = read_dataset(text.as_bytes(), TableFormat::csv(), &ColumnSpec::new("x", "y", "sigma"), "mem")
            .unwrap();
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.row_errors.len(), 1);
        assert_eq!(data.row_errors[0].line, 4);
    }

    #[test]
    fn missing_csv_column_is_a_validation_error() {
        let err = read_dataset("a,b\n1,2\n".as_bytes(), TableFormat::csv(), &ColumnSpec::new("a", "b", "c"), "mem")
            .unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }

    #[test]
    fn whitespace_rotmod_table() {
        let text = "# Distance = 13.8 Mpc\n# Rad Vobs errV Vgas\n\n0.42  24.0  4.0  8.1\n1.26 60.5 3.1 19.0\n2.10 81.2 2.2\n";
        let data = read_dataset(text.as_bytes(), TableFormat::Whitespace, &ColumnSpec::rotmod(), "ngc.dat").unwrap();

        assert_eq!(data.rows_used, 3);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.dataset.observed(), &[24.0, 60.5, 81.2]);
        assert_eq!(data.dataset.label(), Some("ngc.dat"));
        assert_eq!(
            data.dataset.metadata().get("y_unit"),
            Some(&MetadataValue::Text("km/s".into()))
        );
    }

    #[test]
    fn whitespace_rejects_named_columns() {
        let err = read_dataset("1 2 3\n".as_bytes(), TableFormat::Whitespace, &ColumnSpec::new("r", 1, 2), "mem")
            .unwrap_err();
        assert!(matches!(err, HarnessError::Validation(_)));
    }

    #[test]
    fn no_usable_rows_is_empty_dataset() {
        let err = read_dataset("1 2 -1\n3 4\n".as_bytes(), TableFormat::Whitespace, &ColumnSpec::new(0, 1, 2), "mem")
            .unwrap_err();
        assert!(matches!(err, HarnessError::EmptyDataset(_)));
    }

    #[test]
    fn numeric_strings_become_indices() {
        assert_eq!(Column::from("2"), Column::Index(2));
        assert_eq!(Column::from("vobs"), Column::Name("vobs".into()));
    }
}
