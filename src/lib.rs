//! `astrofit` library crate.
//!
//! Fits parameterised models to 1-D observational series `(x, y, σ)` by
//! minimising chi-squared, and compares candidate models against a baseline.
//!
//! The binary (`astrofit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - models and the fitter are reusable from other tools

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
