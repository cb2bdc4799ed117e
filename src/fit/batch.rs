//! Batch driver: one model (or one comparison) across many named datasets.
//!
//! Datasets are processed in parallel. A failing dataset never aborts the
//! batch; it becomes a `Failed` entry in the report. Output order always
//! matches input order.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::Dataset;
use crate::error::HarnessError;
use crate::fit::{Fitter, compare};
use crate::models::Model;
use crate::report::{BatchEntry, BatchOutcome, ComparisonRecord, FitRecord};

/// A dataset with the name it is reported under.
#[derive(Debug, Clone)]
pub struct NamedDataset {
    pub name: String,
    pub dataset: Dataset,
}

impl NamedDataset {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            name: name.into(),
            dataset,
        }
    }
}

/// Fit `model` to every dataset.
pub fn fit_batch(fitter: &Fitter, datasets: &[NamedDataset], model: &dyn Model) -> Vec<BatchEntry> {
    run(datasets, |ds| {
        fitter.fit(&ds.dataset, model).map(|fit| BatchOutcome::Fitted {
            fit: FitRecord::from(&fit),
        })
    })
}

/// Compare every candidate to the baseline, per dataset.
pub fn compare_batch(
    fitter: &Fitter,
    datasets: &[NamedDataset],
    baseline: &dyn Model,
    candidates: &[&dyn Model],
) -> Vec<BatchEntry> {
    run(datasets, |ds| {
        compare(fitter, &ds.dataset, baseline, candidates).map(|results| BatchOutcome::Compared {
            comparisons: results.iter().map(ComparisonRecord::from).collect(),
        })
    })
}

fn run<F>(datasets: &[NamedDataset], job: F) -> Vec<BatchEntry>
where
    F: Fn(&NamedDataset) -> Result<BatchOutcome, HarnessError> + Sync,
{
    let entries: Vec<BatchEntry> = datasets
        .par_iter()
        .map(|ds| {
            let outcome = job(ds).unwrap_or_else(|err| {
                warn!(dataset = %ds.name, error = %err, "dataset failed");
                BatchOutcome::from(&err)
            });
            BatchEntry {
                dataset: ds.name.clone(),
                outcome,
            }
        })
        .collect();

    let failed = entries.iter().filter(|e| e.is_failure()).count();
    info!(datasets = entries.len(), failed, "batch complete");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{PowerLaw, Proportional};

    fn linear(name: &str, slope: f64) -> NamedDataset {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = x.iter().map(|v| slope * v).collect();
        NamedDataset::new(name, Dataset::build(x, y, vec![0.5; 5], Default::default()).unwrap())
    }

    #[test]
    fn failures_are_isolated_and_order_is_kept() {
        let tiny = NamedDataset::new(
            "tiny",
            Dataset::build(vec![1.0], vec![2.0], vec![1.0], Default::default()).unwrap(),
        );
        let datasets = vec![linear("a", 2.0), tiny, linear("c", 3.0)];

        let entries = fit_batch(&Fitter::default(), &datasets, &Proportional::default());
        let names: Vec<&str> = entries.iter().map(|e| e.dataset.as_str()).collect();
        assert_eq!(names, ["a", "tiny", "c"]);

        assert!(matches!(
            entries[1].outcome,
            BatchOutcome::Failed {
                kind: ErrorKind::Underdetermined,
                ..
            }
        ));
        match &entries[2].outcome {
            BatchOutcome::Fitted { fit } => assert!((fit.parameters[0].value - 3.0).abs() < 1e-4),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn compare_batch_yields_one_record_per_candidate() {
        let power = PowerLaw::default();
        let candidates: Vec<&dyn Model> = vec![&power];
        let entries = compare_batch(&Fitter::default(), &[linear("a", 2.0)], &Proportional::default(), &candidates);

        assert_eq!(entries.len(), 1);
        match &entries[0].outcome {
            BatchOutcome::Compared { comparisons } => {
                assert_eq!(comparisons.len(), 1);
                assert_eq!(comparisons[0].baseline.model, "proportional");
                assert_eq!(comparisons[0].candidate.model, "power_law");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
