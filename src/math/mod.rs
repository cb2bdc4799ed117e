//! Mathematical utilities: quadrature, curvature/covariance and tail probabilities.

pub mod curvature;
pub mod integrate;
pub mod stats;

pub use curvature::*;
pub use integrate::*;
pub use stats::*;
