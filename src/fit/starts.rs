//! Optimizer start points.
//!
//! Chi-squared surfaces of these models are frequently non-convex, so every fit
//! is started from several deterministic, bound-respecting points:
//!
//! - the same interior fraction (0.5, 0.1, 0.9) of every parameter range
//! - the geometric midpoint for strictly positive ranges spanning > 2 decades
//!   (mass-like parameters whose scale is unknown a priori)

/// Interior fractions of each parameter range, in start order.
const FRACTIONS: [f64; 3] = [0.5, 0.1, 0.9];

/// Ratio `hi / lo` above which a positive range also gets a geometric midpoint.
const LOG_SPAN: f64 = 100.0;

/// Deterministic, de-duplicated start points inside `bounds`.
pub fn start_points(bounds: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = Vec::with_capacity(FRACTIONS.len() + 1);

    for &f in &FRACTIONS {
        push_unique(&mut out, bounds.iter().map(|&(lo, hi)| lo + f * (hi - lo)).collect());
    }

    if bounds.iter().any(|&(lo, hi)| lo > 0.0 && hi / lo > LOG_SPAN) {
        let start = bounds
            .iter()
            .map(|&(lo, hi)| {
                if lo > 0.0 && hi / lo > LOG_SPAN {
                    (lo * hi).sqrt()
                } else {
                    0.5 * (lo + hi)
                }
            })
            .collect();
        push_unique(&mut out, start);
    }

    out
}

fn push_unique(out: &mut Vec<Vec<f64>>, start: Vec<f64>) {
    if !out.contains(&start) {
        out.push(start);
    }
}
