//! Fitting orchestration.
//!
//! - multi-start bounded Nelder–Mead per (dataset, model)
//! - candidate-vs-baseline comparison
//! - parallel batch runs over many datasets

pub mod batch;
pub mod compare;
pub mod fitter;
pub mod starts;

pub use batch::*;
pub use compare::*;
pub use fitter::*;
pub use starts::*;
