//! # Metrics
//!
//! Metric families, grouped by what they describe:
//!
//! - [`cluster_metrics`]: per-ManagedCluster phase and health gauges
//! - [`dependent_metrics`]: per-workload and per-addon phase gauges
//! - [`controller_metrics`]: reconcile durations, errors and cycle counters

pub mod cluster_metrics;
pub mod controller_metrics;
pub mod dependent_metrics;
pub mod registry;

pub use registry::{gather_text, REGISTRY};

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};

static REGISTERED: AtomicBool = AtomicBool::new(false);

/// Gauge value of a boolean signal
pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Register all metric families with [`REGISTRY`].
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() -> Result<()> {
    if REGISTERED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    cluster_metrics::register_cluster_metrics()?;
    dependent_metrics::register_dependent_metrics()?;
    controller_metrics::register_controller_metrics()?;
    Ok(())
}
