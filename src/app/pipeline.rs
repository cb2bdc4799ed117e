//! Shared workflows behind the CLI subcommands.
//!
//! load -> fit / compare -> residuals -> records
//!
//! Each function returns plain data; printing and exports stay in `app`.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::HarnessConfig;
use crate::domain::{ComparisonResult, FitResult};
use crate::error::Result;
use crate::fit::{Fitter, NamedDataset, compare, compare_batch, fit_batch};
use crate::io::{ColumnSpec, IngestedData, TableFormat, load_dataset};
use crate::models::{Model, ModelKind};
use crate::report::{BatchEntry, BatchOutcome, Residual, compute_residuals};

/// Where and how to read one input table.
#[derive(Debug, Clone)]
pub struct InputSource {
    pub path: PathBuf,
    pub format: TableFormat,
    pub columns: ColumnSpec,
}

impl InputSource {
    /// Load the table and tag the dataset with [`name`](Self::name).
    pub fn load(&self) -> Result<IngestedData> {
        let mut ingest = load_dataset(&self.path, self.format, &self.columns)?;
        ingest.dataset = ingest.dataset.with_metadata("name", self.name());
        Ok(ingest)
    }

    /// Name a dataset is reported under: the file stem.
    pub fn name(&self) -> String {
        dataset_name(&self.path)
    }
}

fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[derive(Debug, Clone)]
pub struct FitRun {
    pub ingest: IngestedData,
    pub fit: FitResult,
    pub residuals: Vec<Residual>,
}

#[derive(Debug, Clone)]
pub struct CompareRun {
    pub ingest: IngestedData,
    pub comparisons: Vec<ComparisonResult>,
}

pub fn run_fit(config: &HarnessConfig, source: &InputSource, kind: ModelKind) -> Result<FitRun> {
    let ingest = source.load()?;
    let model = kind.build(&config.constants);
    let fit = Fitter::new(config.fitter.clone()).fit(&ingest.dataset, model.as_ref())?;
    let residuals = compute_residuals(&ingest.dataset, model.as_ref(), &fit)?;
    Ok(FitRun { ingest, fit, residuals })
}

pub fn run_compare(
    config: &HarnessConfig,
    source: &InputSource,
    baseline: ModelKind,
    candidates: &[ModelKind],
) -> Result<CompareRun> {
    let ingest = source.load()?;
    let baseline = baseline.build(&config.constants);
    let built: Vec<_> = candidates.iter().map(|k| k.build(&config.constants)).collect();
    let refs: Vec<&dyn Model> = built.iter().map(|m| m.as_ref()).collect();

    let comparisons = compare(&Fitter::new(config.fitter.clone()), &ingest.dataset, baseline.as_ref(), &refs)?;
    Ok(CompareRun { ingest, comparisons })
}

/// Fit `model` (or compare `candidates` against it) across every source.
///
/// Files that fail to load are reported as failed entries alongside fit
/// failures; entries come back in the order of `sources`.
pub fn run_batch(
    config: &HarnessConfig,
    sources: &[InputSource],
    model: ModelKind,
    candidates: &[ModelKind],
) -> Vec<BatchEntry> {
    let mut slots: Vec<Option<BatchEntry>> = vec![None; sources.len()];
    let mut loaded = Vec::with_capacity(sources.len());
    let mut positions = Vec::with_capacity(sources.len());

    for (i, source) in sources.iter().enumerate() {
        match source.load() {
            Ok(ingest) => {
                loaded.push(NamedDataset::new(source.name(), ingest.dataset));
                positions.push(i);
            }
            Err(err) => {
                warn!(path = %source.path.display(), error = %err, "failed to load dataset");
                slots[i] = Some(BatchEntry {
                    dataset: source.name(),
                    outcome: BatchOutcome::from(&err),
                });
            }
        }
    }

    let fitter = Fitter::new(config.fitter.clone());
    let baseline = model.build(&config.constants);
    let entries = if candidates.is_empty() {
        fit_batch(&fitter, &loaded, baseline.as_ref())
    } else {
        let built: Vec<_> = candidates.iter().map(|k| k.build(&config.constants)).collect();
        let refs: Vec<&dyn Model> = built.iter().map(|m| m.as_ref()).collect();
        compare_batch(&fitter, &loaded, baseline.as_ref(), &refs)
    };

    for (pos, entry) in positions.into_iter().zip(entries) {
        slots[pos] = Some(entry);
    }
    slots.into_iter().flatten().collect()
}
