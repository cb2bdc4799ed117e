//! Domain types used throughout the harness.
//!
//! This module defines:
//!
//! - the validated, immutable observational series (`Dataset`)
//! - fit outputs (`FitResult`) and model comparisons (`ComparisonResult`)

pub mod dataset;
pub mod types;

pub use dataset::*;
pub use types::*;
