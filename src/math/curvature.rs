//! Finite-difference curvature of an objective and the resulting 1-sigma errors.
//!
//! For a chi-squared objective, `Δχ² = 1` defines the 1-sigma contour, so the
//! parameter covariance is `2·H⁻¹` where `H` is the Hessian of chi-squared.
//!
//! The stencil never leaves the parameter box: parameters with room on both
//! sides use central differences; parameters sitting on (or near) a bound use a
//! one-sided stencil pointing inward.

use nalgebra::DMatrix;
use tracing::debug;

use crate::error::Result;

/// Per-parameter finite-difference step and direction.
#[derive(Debug, Clone, Copy)]
struct Stencil {
    h: f64,
    /// `None`: central; `Some(±1.0)`: one-sided in that direction.
    side: Option<f64>,
}

impl Stencil {
    fn for_param(x: f64, (lo, hi): (f64, f64), rel_step: f64) -> Option<Self> {
        let width = hi - lo;
        if width <= 0.0 {
            return None;
        }
        let h = (rel_step * x.abs().max(1e-2 * width)).min(0.25 * width);
        if x - h >= lo && x + h <= hi {
            return Some(Stencil { h, side: None });
        }
        let (dir, room) = if hi - x >= x - lo { (1.0, hi - x) } else { (-1.0, x - lo) };
        Some(Stencil {
            h: h.min(0.5 * room),
            side: Some(dir),
        })
    }

    /// Signed offset used by one-sided mixed differences.
    fn offset(self) -> f64 {
        self.side.unwrap_or(1.0) * self.h
    }
}

fn shifted(x: &[f64], moves: &[(usize, f64)]) -> Vec<f64> {
    let mut p = x.to_vec();
    for &(i, d) in moves {
        p[i] += d;
    }
    p
}

/// Hessian of `f` at `x`. Rows/columns of fixed parameters (`lo == hi`) are zero.
pub fn hessian<F>(f: F, x: &[f64], bounds: &[(f64, f64)], rel_step: f64) -> Result<DMatrix<f64>>
where
    F: Fn(&[f64]) -> Result<f64>,
{
    let k = x.len();
    let stencils: Vec<Option<Stencil>> = x
        .iter()
        .zip(bounds)
        .map(|(&xi, &b)| Stencil::for_param(xi, b, rel_step))
        .collect();

    let f0 = f(x)?;
    let mut h = DMatrix::<f64>::zeros(k, k);

    for i in 0..k {
        let Some(si) = stencils[i] else { continue };
        h[(i, i)] = match si.side {
            None => (f(&shifted(x, &[(i, si.h)]))? - 2.0 * f0 + f(&shifted(x, &[(i, -si.h)]))?) / (si.h * si.h),
            Some(dir) => {
                let d = dir * si.h;
                (f(&shifted(x, &[(i, 2.0 * d)]))? - 2.0 * f(&shifted(x, &[(i, d)]))? + f0) / (si.h * si.h)
            }
        };

        for j in (i + 1)..k {
            let Some(sj) = stencils[j] else { continue };
            let value = if si.side.is_none() && sj.side.is_none() {
                let (a, b) = (si.h, sj.h);
                (f(&shifted(x, &[(i, a), (j, b)]))? - f(&shifted(x, &[(i, a), (j, -b)]))?
                    - f(&shifted(x, &[(i, -a), (j, b)]))?
                    + f(&shifted(x, &[(i, -a), (j, -b)]))?)
                    / (4.0 * a * b)
            } else {
                let (a, b) = (si.offset(), sj.offset());
                (f(&shifted(x, &[(i, a), (j, b)]))? - f(&shifted(x, &[(i, a)]))? - f(&shifted(x, &[(j, b)]))? + f0)
                    / (a * b)
            };
            h[(i, j)] = value;
            h[(j, i)] = value;
        }
    }

    Ok(h)
}

/// 1-sigma errors from the Hessian of chi-squared.
///
/// Uses the full covariance `2·H⁻¹` when the free block of `H` is positive
/// definite. Otherwise each parameter falls back to `sqrt(2 / H_ii)`; a
/// non-positive `H_ii` (flat or concave direction) gives NaN.
pub fn errors_from_hessian(h: &DMatrix<f64>) -> Vec<f64> {
    let k = h.nrows();
    let mut errors = vec![f64::NAN; k];
    let free: Vec<usize> = (0..k)
        .filter(|&i| h[(i, i)].is_finite() && h[(i, i)] > 0.0)
        .collect();
    if free.is_empty() {
        return errors;
    }

    let sub = DMatrix::from_fn(free.len(), free.len(), |r, c| h[(free[r], free[c])]);
    if free.len() == k {
        if let Some(chol) = sub.cholesky() {
            let cov = chol.inverse() * 2.0;
            for (r, &i) in free.iter().enumerate() {
                let var = cov[(r, r)];
                errors[i] = if var.is_finite() && var > 0.0 { var.sqrt() } else { f64::NAN };
            }
            return errors;
        }
        debug!("hessian is not positive definite; using diagonal curvature");
    }

    for &i in &free {
        errors[i] = (2.0 / h[(i, i)]).sqrt();
    }
    errors
}
