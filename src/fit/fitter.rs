//! Chi-squared fitting of one model against one dataset.
//!
//! Given:
//! - observations `(x_i, y_i, σ_i)`
//! - a model with `k` bounded parameters
//!
//! we minimise `χ²(p) = Σ ((model(x_i, p) - y_i) / σ_i)²` with Nelder–Mead from
//! several start points (see [`start_points`](crate::fit::start_points)), keep the
//! lowest result, and estimate 1-sigma errors from the curvature at the optimum.
//!
//! Bounds are enforced by projection: every parameter vector handed to the model
//! is clamped into the box first, so a model is never evaluated outside the
//! domain it declared. Vertices outside the box also pay a quadratic penalty on
//! their distance to it, so the cost has no flat shelf past a bound for the
//! simplex to collapse on.
//!
//! A start is only reported as converged once the solver says so and no single
//! coordinate step inside the box lowers chi-squared further. Otherwise the
//! simplex is rebuilt around the current best point, up to [`MAX_ROUNDS`] times.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use argmin::core::{CostFunction, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Dataset, FitResult};
use crate::error::{HarnessError, Result};
use crate::fit::start_points;
use crate::math::{chi_square_sf, errors_from_hessian, hessian};
use crate::models::{Model, clamp_to_bounds, validate_bounds};

/// Nelder–Mead restarts per start point.
pub const MAX_ROUNDS: usize = 5;

/// Weight of the out-of-box penalty, per squared fraction of a parameter range.
const OUT_OF_BOUNDS_WEIGHT: f64 = 1.0;

/// Relative chi-squared change below which a restart counts as no progress.
const SETTLE_RTOL: f64 = 1e-9;

fn settle_tolerance(chi_square: f64) -> f64 {
    SETTLE_RTOL * chi_square.max(1.0)
}

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitterConfig {
    /// Iteration budget per start.
    pub max_iters: u64,
    /// Nelder–Mead stops when the standard deviation of the simplex costs drops
    /// below this. Costs are chi-squared relative to the start value.
    pub sd_tolerance: f64,
    /// Initial simplex edge as a fraction of each parameter range.
    pub simplex_scale: f64,
    /// Relative finite-difference step for the curvature estimate.
    pub curvature_step: f64,
    /// Optional wall-clock budget for a whole fit.
    pub time_budget_ms: Option<u64>,
}

impl Default for FitterConfig {
    fn default() -> Self {
        Self {
            max_iters: 5000,
            sd_tolerance: 1e-12,
            simplex_scale: 0.05,
            curvature_step: 1e-4,
            time_budget_ms: None,
        }
    }
}

impl FitterConfig {
    fn validate(&self) -> Result<()> {
        if self.max_iters == 0 {
            return Err(HarnessError::validation("max_iters must be > 0"));
        }
        if !(self.sd_tolerance.is_finite() && self.sd_tolerance > 0.0) {
            return Err(HarnessError::validation("sd_tolerance must be finite and > 0"));
        }
        if !(self.simplex_scale > 0.0 && self.simplex_scale <= 1.0) {
            return Err(HarnessError::validation("simplex_scale must be in (0, 1]"));
        }
        if !(self.curvature_step > 0.0 && self.curvature_step < 1.0) {
            return Err(HarnessError::validation("curvature_step must be in (0, 1)"));
        }
        Ok(())
    }
}

/// Chi-squared of one dataset under one model, with evaluation bookkeeping.
struct Objective<'a> {
    dataset: &'a Dataset,
    model: &'a dyn Model,
    evaluations: AtomicU64,
    deadline: Option<(Instant, Duration)>,
}

impl Objective<'_> {
    /// Chi-squared at `params`, which must already lie inside the bounds.
    fn chi_square(&self, params: &[f64]) -> Result<f64> {
        if let Some((started, budget)) = self.deadline {
            if started.elapsed() > budget {
                return Err(HarnessError::OptimizerDiverged(format!(
                    "time budget of {} ms exceeded",
                    budget.as_millis()
                )));
            }
        }
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let mut chi2 = 0.0;
        for (x, y, sigma) in self.dataset.points() {
            let predicted = self.model.evaluate(x, params);
            if !predicted.is_finite() {
                return Err(HarnessError::Domain {
                    model: self.model.name().to_string(),
                    message: format!("non-finite prediction {predicted} at x={x} with parameters {params:?}"),
                });
            }
            let r = (predicted - y) / sigma;
            chi2 += r * r;
        }
        Ok(chi2)
    }

}

/// Sum of squared distances outside the box, each as a fraction of its range.
fn out_of_bounds_penalty(params: &[f64], inside: &[f64], bounds: &[(f64, f64)]) -> f64 {
    params
        .iter()
        .zip(inside)
        .zip(bounds)
        .map(|((&p, &c), &(lo, hi))| {
            if p.is_nan() {
                return f64::INFINITY;
            }
            let width = if hi > lo { hi - lo } else { 1.0 };
            let d = (p - c) / width;
            d * d
        })
        .sum()
}

/// argmin adapter: clamped chi-squared divided by a per-start scale, plus the
/// out-of-box penalty.
struct ScaledProblem<'a, 'b> {
    objective: &'a Objective<'b>,
    scale: f64,
}

impl CostFunction for ScaledProblem<'_, '_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        let bounds = self.objective.model.parameter_bounds();
        let inside = clamp_to_bounds(params, bounds);
        let chi2 = self.objective.chi_square(&inside).map_err(argmin::core::Error::new)?;
        Ok(chi2 / self.scale + OUT_OF_BOUNDS_WEIGHT * out_of_bounds_penalty(params, &inside, bounds))
    }
}

#[derive(Debug, Clone)]
struct StartOutcome {
    idx: usize,
    params: Vec<f64>,
    chi_square: f64,
    converged: bool,
}

/// Fits models to datasets. Stateless apart from its configuration.
#[derive(Debug, Clone, Default)]
pub struct Fitter {
    config: FitterConfig,
}

impl Fitter {
    pub fn new(config: FitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitterConfig {
        &self.config
    }

    /// Fit `model` to `dataset`.
    pub fn fit(&self, dataset: &Dataset, model: &dyn Model) -> Result<FitResult> {
        self.config.validate()?;
        validate_bounds(model)?;

        let n = dataset.len();
        let k = model.parameter_count();
        if n <= k {
            return Err(HarnessError::Underdetermined {
                points: n,
                parameters: k,
            });
        }

        let objective = Objective {
            dataset,
            model,
            evaluations: AtomicU64::new(0),
            deadline: self
                .config
                .time_budget_ms
                .map(|ms| (Instant::now(), Duration::from_millis(ms))),
        };

        let bounds = model.parameter_bounds();
        let starts = start_points(bounds);

        // Each start is independent; run them in parallel and collect in start order.
        let outcomes: Vec<Result<StartOutcome>> = starts
            .par_iter()
            .enumerate()
            .map(|(idx, start)| self.run_start(&objective, idx, start))
            .collect();

        let mut finished = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            finished.push(outcome?);
        }

        if !finished.iter().any(|o| o.converged) {
            return Err(HarnessError::OptimizerDiverged(format!(
                "none of {} start(s) converged within {} iterations for model '{}'",
                finished.len(),
                self.config.max_iters,
                model.name()
            )));
        }

        // Deterministic selection: minimum chi-squared; ties go to the earlier start.
        let mut best = &finished[0];
        for o in &finished[1..] {
            if o.chi_square < best.chi_square || (o.chi_square == best.chi_square && o.idx < best.idx) {
                best = o;
            }
        }

        let h = hessian(
            |p| objective.chi_square(p),
            &best.params,
            bounds,
            self.config.curvature_step,
        )?;
        let parameter_errors = errors_from_hessian(&h);

        let chi_square = best.chi_square.max(0.0);
        let dof = n - k;
        let result = FitResult {
            model: model.name().to_string(),
            parameter_names: model.parameter_names(),
            parameters: best.params.clone(),
            parameter_errors,
            chi_square,
            degrees_of_freedom: dof,
            n_points: n,
            converged: best.converged,
            reduced_chi_square: chi_square / dof as f64,
            p_value: chi_square_sf(chi_square, dof as f64),
            bic: chi_square + k as f64 * (n as f64).ln(),
            aic: chi_square + 2.0 * k as f64,
            evaluations: objective.evaluations.load(Ordering::Relaxed),
            starts: finished.len(),
        };

        info!(
            model = %result.model,
            dataset = dataset.label().unwrap_or("-"),
            chi_square = result.chi_square,
            dof = result.degrees_of_freedom,
            converged = result.converged,
            "fit complete"
        );
        Ok(result)
    }

    fn run_start(&self, objective: &Objective<'_>, idx: usize, start: &[f64]) -> Result<StartOutcome> {
        let mut params = start.to_vec();
        let mut chi_square = objective.chi_square(&params)?;
        let mut converged = false;
        let mut iterations = 0;
        let mut rounds = 0;

        while rounds < MAX_ROUNDS {
            rounds += 1;
            let descent = self.descend(objective, &params, chi_square)?;
            iterations += descent.iterations;
            let gain = chi_square - descent.chi_square;
            if descent.chi_square < chi_square {
                params = descent.params;
                chi_square = descent.chi_square;
            }

            if let Some((better, better_chi2)) = self.downhill_neighbour(objective, &params, chi_square)? {
                params = better;
                chi_square = better_chi2;
                converged = false;
                continue;
            }

            converged = descent.converged;
            if !converged || gain <= settle_tolerance(chi_square) {
                break;
            }
        }

        debug!(
            model = objective.model.name(),
            start = idx,
            chi_square,
            iterations,
            rounds,
            converged,
            "optimizer start finished"
        );

        Ok(StartOutcome {
            idx,
            params,
            chi_square,
            converged,
        })
    }

    /// One Nelder–Mead run from `start`; the result is clamped into the box.
    fn descend(&self, objective: &Objective<'_>, start: &[f64], chi2_start: f64) -> Result<Descent> {
        let bounds = objective.model.parameter_bounds();
        let scale = chi2_start.max(1.0);

        let solver = NelderMead::new(initial_simplex(start, bounds, self.config.simplex_scale))
            .with_sd_tolerance(self.config.sd_tolerance)
            .map_err(|e| HarnessError::validation(format!("invalid optimizer configuration: {e}")))?;

        let problem = ScaledProblem { objective, scale };
        let res = Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.config.max_iters))
            .run()
            .map_err(|e| match e.downcast::<HarnessError>() {
                Ok(err) => err,
                Err(other) => HarnessError::OptimizerDiverged(format!("optimizer failed: {other}")),
            })?;

        let state = res.state();
        let best = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| HarnessError::OptimizerDiverged("optimizer returned no parameters".into()))?;
        let params = clamp_to_bounds(&best, bounds);
        let chi_square = objective.chi_square(&params)?;
        Ok(Descent {
            params,
            chi_square,
            converged: matches!(
                state.get_termination_status(),
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            ),
            iterations: state.get_iter(),
        })
    }

    /// Best single-coordinate step inside the box that lowers chi-squared by
    /// more than the settle tolerance, if any.
    fn downhill_neighbour(
        &self,
        objective: &Objective<'_>,
        params: &[f64],
        chi_square: f64,
    ) -> Result<Option<(Vec<f64>, f64)>> {
        let bounds = objective.model.parameter_bounds();
        let mut best: Option<(Vec<f64>, f64)> = None;
        let mut threshold = chi_square - settle_tolerance(chi_square);

        for (i, &(lo, hi)) in bounds.iter().enumerate() {
            let step = self.config.curvature_step * (hi - lo);
            if step <= 0.0 {
                continue;
            }
            for direction in [1.0, -1.0] {
                let moved = (params[i] + direction * step).clamp(lo, hi);
                if moved == params[i] {
                    continue;
                }
                let mut trial = params.to_vec();
                trial[i] = moved;
                let chi2 = objective.chi_square(&trial)?;
                if chi2 < threshold {
                    threshold = chi2;
                    best = Some((trial, chi2));
                }
            }
        }
        Ok(best)
    }
}

struct Descent {
    params: Vec<f64>,
    chi_square: f64,
    converged: bool,
    iterations: u64,
}

/// Simplex around `start`: one extra vertex per parameter, stepped toward the
/// side of the range with more room so every vertex stays inside the bounds.
fn initial_simplex(start: &[f64], bounds: &[(f64, f64)], scale: f64) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for (i, &(lo, hi)) in bounds.iter().enumerate() {
        let step = scale * (hi - lo);
        let mut vertex = start.to_vec();
        vertex[i] = if hi - start[i] >= start[i] - lo {
            (start[i] + step).min(hi)
        } else {
            (start[i] - step).max(lo)
        };
        simplex.push(vertex);
    }
    simplex
}
