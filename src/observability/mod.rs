//! # Observability
//!
//! Prometheus metrics shared by the reconcile loop and the HTTP surface.

pub mod metrics;
