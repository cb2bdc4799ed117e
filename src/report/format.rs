//! Plain-text rendering of fits, comparisons, batches and residuals.
//!
//! Every function returns a `String`; printing is left to the caller. Tables
//! are right-trimmed so output diffs cleanly.

use crate::domain::{ComparisonResult, DatasetStats, FitResult};
use crate::fit::select_by_bic;
use crate::models::{ModelKind, ModelRegistry};
use crate::report::{BatchEntry, BatchOutcome, Residual};

/// Summary of one fit: dataset shape, parameters with errors, goodness of fit.
pub fn format_fit(fit: &FitResult, stats: Option<&DatasetStats>) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== astrofit - {} ===\n", fit.model));
    if let Some(s) = stats {
        out.push_str(&format!(
            "Points: n={} | x=[{:.4}, {:.4}] | y=[{:.4}, {:.4}]\n",
            s.n_points, s.x_min, s.x_max, s.y_min, s.y_max
        ));
    }

    out.push_str("\nParameters:\n");
    for ((name, value), err) in fit.parameter_names.iter().zip(&fit.parameters).zip(&fit.parameter_errors) {
        out.push_str(&format!("- {:<12} {:>14.6} +/- {}\n", truncate(name, 12), value, fmt_err(*err)));
    }

    out.push_str("\nGoodness of fit:\n");
    out.push_str(&format!(
        "- chi2={:.4} dof={} chi2/dof={:.4} p={:.4}\n",
        fit.chi_square, fit.degrees_of_freedom, fit.reduced_chi_square, fit.p_value
    ));
    out.push_str(&format!("- BIC={:.4} AIC={:.4}\n", fit.bic, fit.aic));
    out.push_str(&format!(
        "- converged={} starts={} evaluations={}\n",
        fit.converged, fit.starts, fit.evaluations
    ));

    out
}

/// Candidates against their shared baseline, one row per candidate.
pub fn format_comparisons(comparisons: &[ComparisonResult]) -> String {
    let mut out = String::new();
    let Some(first) = comparisons.first() else {
        out.push_str("(no candidates)\n");
        return out;
    };

    out.push_str(&format!(
        "Baseline: {} chi2={:.4} BIC={:.4} params={}\n\n",
        first.baseline.model,
        first.baseline.chi_square,
        first.baseline.bic,
        fmt_vec(&first.baseline.parameters)
    ));

    push_row(
        &mut out,
        format!(
            "{:<20} {:>12} {:>10} {:>10} {:>8} {:<10}",
            "candidate", "chi2", "improve", "dBIC", "sigma", "preferred"
        ),
    );
    push_row(
        &mut out,
        format!("{:-<20} {:-<12} {:-<10} {:-<10} {:-<8} {:-<10}", "", "", "", "", "", ""),
    );
    for c in comparisons {
        push_row(
            &mut out,
            format!(
                "{:<20} {:>12.4} {:>9.2}% {:>10.3} {:>8.2} {:<10}",
                truncate(&c.candidate.model, 20),
                c.candidate.chi_square,
                100.0 * c.improvement_fraction,
                c.delta_bic,
                c.significance_sigma,
                c.preferred.display_name(),
            ),
        );
    }

    let mut fits = vec![first.baseline.clone()];
    fits.extend(comparisons.iter().map(|c| c.candidate.clone()));
    if let Some(pick) = select_by_bic(&fits) {
        out.push_str(&format!("\nBIC choice: {} (simplest within 2 of the minimum)\n", pick.model));
    }

    out
}

/// One row per dataset; failures show the error kind and message.
pub fn format_batch(entries: &[BatchEntry]) -> String {
    let mut out = String::new();

    push_row(
        &mut out,
        format!("{:<24} {:<20} {:>12} {:>10} {:<10}", "dataset", "model", "chi2", "chi2/dof", "status"),
    );
    push_row(&mut out, format!("{:-<24} {:-<20} {:-<12} {:-<10} {:-<10}", "", "", "", "", ""));

    for entry in entries {
        let name = truncate(&entry.dataset, 24);
        match &entry.outcome {
            BatchOutcome::Fitted { fit } => push_row(
                &mut out,
                format!(
                    "{:<24} {:<20} {:>12.4} {:>10.4} {:<10}",
                    name,
                    truncate(&fit.model, 20),
                    fit.chi_square,
                    fit.reduced_chi_square,
                    if fit.converged { "ok" } else { "unconverged" }
                ),
            ),
            BatchOutcome::Compared { comparisons } => {
                for c in comparisons {
                    push_row(
                        &mut out,
                        format!(
                            "{:<24} {:<20} {:>12.4} {:>10.4} {:<10}",
                            name,
                            truncate(&c.candidate.model, 20),
                            c.candidate.chi_square,
                            c.candidate.reduced_chi_square,
                            c.preferred.display_name()
                        ),
                    );
                }
            }
            BatchOutcome::Failed { message, .. } => {
                push_row(&mut out, format!("{:<24} {:<20} {:>12} {:>10} failed: {}", name, "-", "-", "-", message));
            }
        }
    }

    let failed = entries.iter().filter(|e| e.is_failure()).count();
    out.push_str(&format!("\n{} dataset(s), {} failed\n", entries.len(), failed));
    out
}

/// Registered models with their parameter names and bounds.
pub fn format_models(registry: &ModelRegistry) -> String {
    let mut out = String::new();
    for (name, model) in registry.iter() {
        match ModelKind::from_name(name) {
            Some(kind) => out.push_str(&format!("{name} ({})\n", kind.display_name())),
            None => out.push_str(&format!("{name}\n")),
        }
        for (param, (lo, hi)) in model.parameter_names().iter().zip(model.parameter_bounds()) {
            out.push_str(&format!("  {:<12} [{lo}, {hi}]\n", truncate(param, 12)));
        }
    }
    out
}

pub fn format_residuals(rows: &[Residual]) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        format!(
            "{:>12} {:>12} {:>12} {:>12} {:>12} {:>8}",
            "x", "observed", "sigma", "predicted", "residual", "pull"
        ),
    );
    push_row(
        &mut out,
        format!("{:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<8}", "", "", "", "", "", ""),
    );
    for r in rows {
        push_row(
            &mut out,
            format!(
                "{:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>8.2}",
                r.x, r.observed, r.uncertainty, r.predicted, r.residual, r.pull
            ),
        );
    }
    out
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn fmt_err(e: f64) -> String {
    if e.is_finite() { format!("{e:.6}") } else { "n/a".to_string() }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Preference;
    use crate::error::HarnessError;
    use crate::models::PhysicalConstants;
    use crate::report::FitRecord;

    fn fit(model: &str, chi_square: f64) -> FitResult {
        FitResult {
            model: model.to_string(),
            parameter_names: vec!["a".into(), "b".into()],
            parameters: vec![1.5, -0.25],
            parameter_errors: vec![0.1, f64::NAN],
            chi_square,
            degrees_of_freedom: 8,
            n_points: 10,
            converged: true,
            reduced_chi_square: chi_square / 8.0,
            p_value: 0.4,
            bic: chi_square + 2.0 * 10f64.ln(),
            aic: chi_square + 4.0,
            evaluations: 120,
            starts: 3,
        }
    }

    #[test]
    fn fit_summary_marks_missing_errors() {
        let s = format_fit(&fit("power_law", 8.2), None);
        assert!(s.contains("=== astrofit - power_law ==="));
        assert!(s.contains("+/- 0.100000"));
        assert!(s.contains("+/- n/a"));
        assert!(s.contains("dof=8"));
    }

    #[test]
    fn comparison_table_lists_candidates() {
        let c = ComparisonResult {
            baseline: fit("newtonian", 40.0),
            candidate: fit("mond_simple", 10.0),
            improvement_fraction: 0.75,
            preferred: Preference::Candidate,
            delta_chi_square: 30.0,
            delta_bic: -27.7,
            significance_sigma: 5.1,
        };
        let s = format_comparisons(&[c]);
        assert!(s.starts_with("Baseline: newtonian"));
        assert!(s.contains("mond_simple"));
        assert!(s.contains("75.00%"));
        assert!(s.contains("BIC choice: mond_simple"));
        assert!(s.lines().all(|l| l == l.trim_end()));
        assert_eq!(format_comparisons(&[]), "(no candidates)\n");
    }

    #[test]
    fn batch_table_counts_failures() {
        let entries = vec![
            BatchEntry {
                dataset: "ngc3198".into(),
                outcome: BatchOutcome::Fitted {
                    fit: FitRecord::from(&fit("newtonian", 12.0)),
                },
            },
            BatchEntry {
                dataset: "tiny".into(),
                outcome: BatchOutcome::from(&HarnessError::Underdetermined {
                    points: 1,
                    parameters: 2,
                }),
            },
        ];
        let s = format_batch(&entries);
        assert!(s.contains("ngc3198"));
        assert!(s.contains("failed: underdetermined fit"));
        assert!(s.ends_with("2 dataset(s), 1 failed\n"));
    }

    #[test]
    fn model_listing_shows_bounds() {
        let s = format_models(&ModelRegistry::builtin(&PhysicalConstants::default()));
        assert!(s.contains("lcdm_modulus (flat ΛCDM distance modulus)\n"));
        assert!(s.contains("mond_simple (MOND (simple ν))\n"));
        assert!(s.contains("[50, 100]"));
    }

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 6), "abcde.");
    }
}
