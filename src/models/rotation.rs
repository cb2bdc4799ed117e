//! Galaxy rotation-curve models: circular velocity (km/s) against radius (kpc).
//!
//! All of them clamp the radius to `R_MIN_KPC` so that `r = 0` rows (present in
//! some rotation-curve tables) do not produce infinities.

use crate::models::{Model, PhysicalConstants};

/// Smallest radius used in any rotation-curve formula.
pub const R_MIN_KPC: f64 = 1e-3;

/// Point-mass Keplerian curve: `v = sqrt(G·M / r)`.
#[derive(Debug, Clone)]
pub struct Newtonian {
    gm: f64,
    bounds: [(f64, f64); 1],
}

impl Newtonian {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            gm: constants.gm(),
            bounds: [(0.0, 1e3)],
        }
    }
}

impl Model for Newtonian {
    fn name(&self) -> &str {
        "newtonian"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, r: f64, params: &[f64]) -> f64 {
        let r = r.max(R_MIN_KPC);
        (self.gm * params[0] / r).max(0.0).sqrt()
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["mass".into()]
    }
}

/// Modified-Newtonian curve with the "simple" interpolating function.
///
/// With Newtonian acceleration `g_N = G·M / r²`, the effective acceleration is
/// `g = g_N/2 + sqrt(g_N²/4 + g_N·a0)` (i.e. `g_N·ν(g_N/a0)` with
/// `ν(y) = 1/2 + sqrt(1/4 + 1/y)`), and `v = sqrt(g·r)`. This form stays finite
/// for `M = 0`.
#[derive(Debug, Clone)]
pub struct MondSimple {
    gm: f64,
    bounds: [(f64, f64); 2],
}

impl MondSimple {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            gm: constants.gm(),
            // a0 in (km/s)²/kpc; 1.2e-10 m/s² is ~3700.
            bounds: [(0.0, 1e3), (100.0, 20_000.0)],
        }
    }
}

impl Model for MondSimple {
    fn name(&self) -> &str {
        "mond_simple"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, r: f64, params: &[f64]) -> f64 {
        let r = r.max(R_MIN_KPC);
        let g_n = (self.gm * params[0] / (r * r)).max(0.0);
        let a0 = params[1].max(0.0);
        let g = 0.5 * g_n + (0.25 * g_n * g_n + g_n * a0).sqrt();
        (g * r).sqrt()
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["mass".into(), "a0".into()]
    }
}

/// Point mass plus a pseudo-isothermal halo:
/// `v² = G·M/r + v_h²·(1 - (r_c/r)·atan(r/r_c))`.
#[derive(Debug, Clone)]
pub struct IsothermalHalo {
    gm: f64,
    bounds: [(f64, f64); 3],
}

impl IsothermalHalo {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            gm: constants.gm(),
            bounds: [(0.0, 1e3), (0.0, 500.0), (0.01, 100.0)],
        }
    }
}

impl Model for IsothermalHalo {
    fn name(&self) -> &str {
        "isothermal_halo"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, r: f64, params: &[f64]) -> f64 {
        let r = r.max(R_MIN_KPC);
        let (mass, v_h, r_c) = (params[0], params[1], params[2]);
        let baryons = self.gm * mass / r;
        let halo = v_h * v_h * (1.0 - (r_c / r) * (r / r_c).atan());
        (baryons + halo).max(0.0).sqrt()
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["mass".into(), "v_halo".into(), "r_core".into()]
    }
}
