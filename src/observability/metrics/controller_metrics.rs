//! # Controller Metrics
//!
//! Reconcile durations, error counters and cycle counters.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};
use std::sync::LazyLock;

static RECONCILE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "platform_status_reconciler_reconcile_duration_seconds",
            "Duration of a single vcluster status reconcile in seconds",
        ),
        &["name"],
    )
    .expect("Failed to create RECONCILE_DURATION metric - this should never happen")
});

static ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "platform_status_reconciler_errors_total",
            "Total number of probe and status write errors per vcluster",
        ),
        &["name"],
    )
    .expect("Failed to create ERRORS_TOTAL metric - this should never happen")
});

static RECONCILES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "platform_status_reconciler_reconciles_total",
        "Total number of completed reconcile cycles",
    )
    .expect("Failed to create RECONCILES_TOTAL metric - this should never happen")
});

static LISTING_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "platform_status_reconciler_listing_errors_total",
            "Total number of failed list requests by resource",
        ),
        &["resource"],
    )
    .expect("Failed to create LISTING_ERRORS_TOTAL metric - this should never happen")
});

static CYCLE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "platform_status_reconciler_cycle_duration_seconds",
            "Duration of a full reconcile cycle in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
    )
    .expect("Failed to create CYCLE_DURATION metric - this should never happen")
});

pub(crate) fn register_controller_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILE_DURATION.clone()))?;
    REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LISTING_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CYCLE_DURATION.clone()))?;
    Ok(())
}

pub fn observe_reconcile_duration(name: &str, duration: f64) {
    RECONCILE_DURATION.with_label_values(&[name]).observe(duration);
}

pub fn increment_errors(name: &str) {
    ERRORS_TOTAL.with_label_values(&[name]).inc();
}

pub fn errors_total(name: &str) -> u64 {
    ERRORS_TOTAL.with_label_values(&[name]).get()
}

pub fn increment_reconciles_total() {
    RECONCILES_TOTAL.inc();
}

pub fn reconciles_total() -> u64 {
    RECONCILES_TOTAL.get()
}

pub fn increment_listing_errors(resource: &str) {
    LISTING_ERRORS_TOTAL.with_label_values(&[resource]).inc();
}

pub fn listing_errors_total(resource: &str) -> u64 {
    LISTING_ERRORS_TOTAL.with_label_values(&[resource]).get()
}

pub fn observe_cycle_duration(duration: f64) {
    CYCLE_DURATION.observe(duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_errors() {
        let before = errors_total("cm-errors");
        increment_errors("cm-errors");
        increment_errors("cm-errors");
        assert_eq!(errors_total("cm-errors"), before + 2);
    }

    #[test]
    fn test_increment_reconciles_total() {
        let before = reconciles_total();
        increment_reconciles_total();
        assert!(reconciles_total() > before);
    }

    #[test]
    fn test_increment_listing_errors() {
        let before = listing_errors_total("cm-test-resource");
        increment_listing_errors("cm-test-resource");
        assert_eq!(listing_errors_total("cm-test-resource"), before + 1);
    }

    #[test]
    fn test_observe_reconcile_duration() {
        observe_reconcile_duration("cm-duration", 0.25);
        let histogram = RECONCILE_DURATION.with_label_values(&["cm-duration"]);
        assert!(histogram.get_sample_count() >= 1);
    }

    #[test]
    fn test_observe_cycle_duration() {
        let before = CYCLE_DURATION.get_sample_count();
        observe_cycle_duration(1.5);
        assert!(CYCLE_DURATION.get_sample_count() > before);
    }
}
