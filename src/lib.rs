//! Platform Status Reconciler Library
//!
//! Core functionality for the platform status reconciler: the phase engine,
//! health probes, status writer, dependent-record classifier, metrics and the
//! scheduler that drives them.
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod runtime;

// Re-export CRD types for convenience
pub use crd::*;
