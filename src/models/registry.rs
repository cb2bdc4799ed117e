//! Named catalog of models.
//!
//! Builtin formulas are addressed by [`ModelKind`]; the registry additionally
//! accepts user-supplied models (e.g. [`FnModel`](crate::models::FnModel)) under
//! any free-form name. Entries are never mutated after insertion.

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::models::{
    HubbleLawModulus, IsothermalHalo, LcdmHubble, LcdmModulus, Model, MondSimple, Newtonian,
    PhysicalConstants, PowerLaw, Proportional,
};

/// Builtin model formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ModelKind {
    Proportional,
    PowerLaw,
    Newtonian,
    MondSimple,
    IsothermalHalo,
    HubbleLawModulus,
    LcdmModulus,
    LcdmHubble,
}

impl ModelKind {
    pub const ALL: [ModelKind; 8] = [
        ModelKind::Proportional,
        ModelKind::PowerLaw,
        ModelKind::Newtonian,
        ModelKind::MondSimple,
        ModelKind::IsothermalHalo,
        ModelKind::HubbleLawModulus,
        ModelKind::LcdmModulus,
        ModelKind::LcdmHubble,
    ];

    /// Registry key (matches `Model::name`).
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Proportional => "proportional",
            ModelKind::PowerLaw => "power_law",
            ModelKind::Newtonian => "newtonian",
            ModelKind::MondSimple => "mond_simple",
            ModelKind::IsothermalHalo => "isothermal_halo",
            ModelKind::HubbleLawModulus => "hubble_law_modulus",
            ModelKind::LcdmModulus => "lcdm_modulus",
            ModelKind::LcdmHubble => "lcdm_hubble",
        }
    }

    /// Builtin kind registered under `name`, if any.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Proportional => "y = a·x",
            ModelKind::PowerLaw => "y = a·x^b",
            ModelKind::Newtonian => "Keplerian point mass",
            ModelKind::MondSimple => "MOND (simple ν)",
            ModelKind::IsothermalHalo => "point mass + isothermal halo",
            ModelKind::HubbleLawModulus => "Hubble-law distance modulus",
            ModelKind::LcdmModulus => "flat ΛCDM distance modulus",
            ModelKind::LcdmHubble => "flat ΛCDM H(z)",
        }
    }

    pub fn build(self, constants: &PhysicalConstants) -> Arc<dyn Model> {
        match self {
            ModelKind::Proportional => Arc::new(Proportional::default()),
            ModelKind::PowerLaw => Arc::new(PowerLaw::default()),
            ModelKind::Newtonian => Arc::new(Newtonian::new(constants)),
            ModelKind::MondSimple => Arc::new(MondSimple::new(constants)),
            ModelKind::IsothermalHalo => Arc::new(IsothermalHalo::new(constants)),
            ModelKind::HubbleLawModulus => Arc::new(HubbleLawModulus::new(constants)),
            ModelKind::LcdmModulus => Arc::new(LcdmModulus::new(constants)),
            ModelKind::LcdmHubble => Arc::new(LcdmHubble::default()),
        }
    }
}

#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<String, Arc<dyn Model>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every builtin, built with the given constants.
    pub fn builtin(constants: &PhysicalConstants) -> Self {
        let mut registry = Self::new();
        for kind in ModelKind::ALL {
            registry.models.insert(kind.name().to_string(), kind.build(constants));
        }
        registry
    }

    /// Add a model under its own name. Re-registering a name is an error.
    pub fn register(&mut self, model: Arc<dyn Model>) -> Result<()> {
        let name = model.name().to_string();
        if self.models.contains_key(&name) {
            return Err(HarnessError::validation(format!("model '{name}' is already registered")));
        }
        self.models.insert(name, model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Model>> {
        self.models.get(name).cloned().ok_or_else(|| {
            HarnessError::validation(format!(
                "unknown model '{name}' (known: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Model>)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FnModel, validate_bounds};

    #[test]
    fn builtin_names_match_model_names() {
        let registry = ModelRegistry::builtin(&PhysicalConstants::default());
        assert_eq!(registry.len(), ModelKind::ALL.len());
        for kind in ModelKind::ALL {
            let model = registry.get(kind.name()).unwrap();
            assert_eq!(model.name(), kind.name());
            assert_eq!(ModelKind::from_name(kind.name()), Some(kind));
            assert_eq!(model.parameter_names().len(), model.parameter_count());
            validate_bounds(model.as_ref()).unwrap();
        }
    }

    #[test]
    fn builtins_are_finite_and_non_negative_on_bound_corners() {
        let registry = ModelRegistry::builtin(&PhysicalConstants::default());
        for (name, model) in registry.iter() {
            let bounds = model.parameter_bounds();
            let k = bounds.len();
            for mask in 0..(1u32 << k) {
                let params: Vec<f64> = bounds
                    .iter()
                    .enumerate()
                    .map(|(i, &(lo, hi))| if mask & (1 << i) == 0 { lo } else { hi })
                    .collect();
                for &x in &[0.0, 0.01, 1.0, 30.0] {
                    let v = model.evaluate(x, &params);
                    assert!(v.is_finite() && v >= 0.0, "{name} at x={x}, p={params:?}: {v}");
                }
            }
        }
    }

    #[test]
    fn register_rejects_duplicates_and_unknown_lookups_fail() {
        let mut registry = ModelRegistry::builtin(&PhysicalConstants::default());
        let custom = Arc::new(FnModel::new("tmt_linear", vec![(0.0, 1.0)], |x, p| p[0] * x));
        registry.register(custom.clone()).unwrap();
        assert!(registry.register(custom).is_err());
        assert!(registry.get("tmt_linear").is_ok());
        assert!(matches!(registry.get("nope"), Err(HarnessError::Validation(_))));
    }
}
