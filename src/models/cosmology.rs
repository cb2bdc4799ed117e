//! Expansion-history models: distance modulus `μ(z)` (mag) and Hubble rate `H(z)`
//! (km/s/Mpc) against redshift.

use crate::math::simpson;
use crate::models::{Model, PhysicalConstants};

/// Redshifts below this are clamped (the modulus diverges at `z = 0`).
pub const Z_MIN: f64 = 1e-6;

/// Simpson panels per unit of `ln(1+z)` in the comoving-distance integral.
const PANELS_PER_UNIT_LN_Z: f64 = 128.0;

/// Panel count bounds for that integral.
const MIN_PANELS: usize = 16;
const MAX_PANELS: usize = 4096;

const H0_BOUNDS: (f64, f64) = (50.0, 100.0);
const OMEGA_M_BOUNDS: (f64, f64) = (0.0, 1.0);

/// `μ = 5·log10(d_L / Mpc) + 25`.
fn distance_modulus(d_l_mpc: f64) -> f64 {
    5.0 * d_l_mpc.log10() + 25.0
}

/// Dimensionless expansion rate of a flat ΛCDM universe.
fn e_of_z(z: f64, omega_m: f64) -> f64 {
    let a = 1.0 + z;
    (omega_m * a * a * a + (1.0 - omega_m)).sqrt()
}

/// Low-redshift Hubble law: `d_L = c·z·(1+z) / H0`.
#[derive(Debug, Clone)]
pub struct HubbleLawModulus {
    c: f64,
    bounds: [(f64, f64); 1],
}

impl HubbleLawModulus {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            c: constants.speed_of_light,
            bounds: [H0_BOUNDS],
        }
    }
}

impl Model for HubbleLawModulus {
    fn name(&self) -> &str {
        "hubble_law_modulus"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, z: f64, params: &[f64]) -> f64 {
        let z = z.max(Z_MIN);
        distance_modulus(self.c * z * (1.0 + z) / params[0])
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["h0".into()]
    }
}

/// Flat ΛCDM distance modulus:
/// `d_L = (1+z)·(c/H0)·∫₀ᶻ dz' / E(z')`.
#[derive(Debug, Clone)]
pub struct LcdmModulus {
    c: f64,
    bounds: [(f64, f64); 2],
}

impl LcdmModulus {
    pub fn new(constants: &PhysicalConstants) -> Self {
        Self {
            c: constants.speed_of_light,
            bounds: [H0_BOUNDS, OMEGA_M_BOUNDS],
        }
    }

    /// Luminosity distance in Mpc.
    ///
    /// The comoving integral runs over `u = ln(1+z)`, where `dz = e^u du`, so
    /// the work stays bounded at any redshift.
    pub fn luminosity_distance(&self, z: f64, h0: f64, omega_m: f64) -> f64 {
        let z = z.max(Z_MIN);
        let u_max = z.ln_1p();
        let panels = ((u_max * PANELS_PER_UNIT_LN_Z).ceil() as usize).clamp(MIN_PANELS, MAX_PANELS);
        let comoving = simpson(|u| u.exp() / e_of_z(u.exp_m1(), omega_m), 0.0, u_max, panels);
        (1.0 + z) * self.c / h0 * comoving
    }
}

impl Model for LcdmModulus {
    fn name(&self) -> &str {
        "lcdm_modulus"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, z: f64, params: &[f64]) -> f64 {
        distance_modulus(self.luminosity_distance(z, params[0], params[1]))
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["h0".into(), "omega_m".into()]
    }
}

/// Flat ΛCDM expansion rate `H(z) = H0·E(z)`.
#[derive(Debug, Clone)]
pub struct LcdmHubble {
    bounds: [(f64, f64); 2],
}

impl Default for LcdmHubble {
    fn default() -> Self {
        Self {
            bounds: [H0_BOUNDS, OMEGA_M_BOUNDS],
        }
    }
}

impl Model for LcdmHubble {
    fn name(&self) -> &str {
        "lcdm_hubble"
    }

    fn parameter_bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    fn evaluate(&self, z: f64, params: &[f64]) -> f64 {
        params[0] * e_of_z(z.max(0.0), params[1])
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["h0".into(), "omega_m".into()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcdm_reduces_to_hubble_law_at_low_z() {
        let c = PhysicalConstants::default();
        let lcdm = LcdmModulus::new(&c);
        let hubble = HubbleLawModulus::new(&c);
        let mu_l = lcdm.evaluate(0.001, &[70.0, 0.3]);
        let mu_h = hubble.evaluate(0.001, &[70.0]);
        assert!((mu_l - mu_h).abs() < 1e-3, "{mu_l} vs {mu_h}");
    }

    #[test]
    fn einstein_de_sitter_distance_is_analytic() {
        // Ωm = 1: d_C = 2c/H0 · (1 - 1/sqrt(1+z))
        let m = LcdmModulus::new(&PhysicalConstants::default());
        let z = 1.0;
        let expected = (1.0 + z) * 2.0 * 299_792.458 / 70.0 * (1.0 - 1.0 / (1.0_f64 + z).sqrt());
        let d = m.luminosity_distance(z, 70.0, 1.0);
        assert!((d - expected).abs() / expected < 1e-6, "{d} vs {expected}");
    }

    #[test]
    fn moduli_are_finite_and_positive_on_bounds() {
        let c = PhysicalConstants::default();
        let m = LcdmModulus::new(&c);
        for &h0 in &[50.0, 100.0] {
            for &om in &[0.0, 1.0] {
                for &z in &[-0.1, 0.0, 0.01, 2.3] {
                    let mu = m.evaluate(z, &[h0, om]);
                    assert!(mu.is_finite() && mu > 0.0, "z={z} h0={h0} om={om}: {mu}");
                }
            }
        }
        assert!((LcdmHubble::default().evaluate(0.0, &[70.0, 0.3]) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn absurd_redshift_stays_finite() {
        let m = LcdmModulus::new(&PhysicalConstants::default());
        let mu = m.evaluate(1e15, &[70.0, 0.3]);
        assert!(mu.is_finite(), "mu={mu}");
        assert!(mu > m.evaluate(1e3, &[70.0, 0.3]));
    }
}
