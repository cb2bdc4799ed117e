//! Run configuration: optimizer settings and physical constants.
//!
//! Everything has a default, so an absent file, an empty object, or a file that
//! sets a single field are all valid.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};
use crate::fit::FitterConfig;
use crate::models::PhysicalConstants;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub fitter: FitterConfig,
    pub constants: PhysicalConstants,
}

impl HarnessConfig {
    /// Read a JSON config file, or return defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let file = File::open(path)
            .map_err(|e| HarnessError::Io(format!("failed to open config '{}': {e}", path.display())))?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| HarnessError::Parse(format!("invalid config '{}': {e}", path.display())))?;
        config.constants.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{ "fitter": { "max_iters": 200 }, "constants": { "speed_of_light": 3e5 } }"#)
                .unwrap();
        assert_eq!(config.fitter.max_iters, 200);
        assert_eq!(config.fitter.sd_tolerance, FitterConfig::default().sd_tolerance);
        assert_eq!(config.constants.speed_of_light, 3e5);
        assert_eq!(
            config.constants.gravitational_constant,
            PhysicalConstants::default().gravitational_constant
        );
    }

    #[test]
    fn missing_path_means_defaults() {
        assert_eq!(HarnessConfig::load(None).unwrap(), HarnessConfig::default());
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = HarnessConfig::load(Some(Path::new("/nonexistent/astrofit.json"))).unwrap_err();
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
