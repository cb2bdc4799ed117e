//! Closed-form models and the registry that names them.
//!
//! Models are small, stateless values behind the [`Model`] trait so that the
//! fitting/comparison code can stay generic.

pub mod constants;
pub mod cosmology;
pub mod generic;
pub mod model;
pub mod registry;
pub mod rotation;

pub use constants::*;
pub use cosmology::*;
pub use generic::*;
pub use model::*;
pub use registry::*;
pub use rotation::*;
