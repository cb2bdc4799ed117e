//! Input/output helpers.
//!
//! - table ingest + row validation (`ingest`)
//! - JSON report and CSV dataset exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
