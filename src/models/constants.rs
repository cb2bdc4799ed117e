//! Physical constants injected into model constructors.
//!
//! Models never read process-wide state; whoever builds a model decides which
//! constants it uses (defaults below, or a `HarnessConfig` loaded from JSON).

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Newton's constant in kpc·(km/s)²/M☉.
    pub gravitational_constant: f64,
    /// Speed of light in km/s.
    pub speed_of_light: f64,
    /// Mass unit of rotation-curve mass parameters, in M☉.
    pub mass_unit: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gravitational_constant: 4.300_91e-6,
            speed_of_light: 299_792.458,
            mass_unit: 1e10,
        }
    }
}

impl PhysicalConstants {
    /// `G` scaled to the mass unit: `v² = gm() * M / r` with `M` in mass units.
    pub fn gm(&self) -> f64 {
        self.gravitational_constant * self.mass_unit
    }

    /// Every constant must be finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("gravitational_constant", self.gravitational_constant),
            ("speed_of_light", self.speed_of_light),
            ("mass_unit", self.mass_unit),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(HarnessError::validation(format!("{name} must be finite and > 0, got {v}")));
            }
        }
        Ok(())
    }
}
