//! # Dependent Metrics
//!
//! Phase and sync/health gauges for classified dependent records.
//! Workloads are labelled `name`, `cluster`, `namespace`; addons additionally
//! carry `environment`.

use crate::controller::reconciler::dependents::{DependentKind, DependentPhase, DependentRecord};
use crate::controller::reconciler::health::{AppHealth, SyncStatus};
use crate::observability::metrics::{flag, registry::REGISTRY};
use anyhow::Result;
use prometheus::{GaugeVec, Opts};
use std::sync::LazyLock;

const WORKLOAD_LABELS: &[&str] = &["name", "cluster", "namespace"];
const ADDON_LABELS: &[&str] = &["name", "cluster", "environment", "namespace"];

fn gauge(name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    GaugeVec::new(Opts::new(name, help), labels)
        .expect("Failed to create dependent gauge - this should never happen")
}

static WORKLOAD_PHASE_INFO: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_workload_phase_info",
        "Current phase of workload ArgoCD app (1=active for the labeled phase)",
        &["name", "cluster", "namespace", "phase"],
    )
});

static WORKLOAD_ARGOCD_SYNCED: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_workload_argocd_synced",
        "Whether workload ArgoCD app is synced (1=synced, 0=not)",
        WORKLOAD_LABELS,
    )
});

static WORKLOAD_ARGOCD_HEALTHY: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_workload_argocd_healthy",
        "Whether workload ArgoCD app is healthy (1=healthy, 0=not)",
        WORKLOAD_LABELS,
    )
});

static ADDON_PHASE_INFO: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_addon_phase_info",
        "Current phase of addon ArgoCD app (1=active for the labeled phase)",
        &["name", "cluster", "environment", "namespace", "phase"],
    )
});

static ADDON_ARGOCD_SYNCED: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_addon_argocd_synced",
        "Whether addon ArgoCD app is synced (1=synced, 0=not)",
        ADDON_LABELS,
    )
});

static ADDON_ARGOCD_HEALTHY: LazyLock<GaugeVec> = LazyLock::new(|| {
    gauge(
        "platform_addon_argocd_healthy",
        "Whether addon ArgoCD app is healthy (1=healthy, 0=not)",
        ADDON_LABELS,
    )
});

pub(crate) fn register_dependent_metrics() -> Result<()> {
    REGISTRY.register(Box::new(WORKLOAD_PHASE_INFO.clone()))?;
    REGISTRY.register(Box::new(WORKLOAD_ARGOCD_SYNCED.clone()))?;
    REGISTRY.register(Box::new(WORKLOAD_ARGOCD_HEALTHY.clone()))?;
    REGISTRY.register(Box::new(ADDON_PHASE_INFO.clone()))?;
    REGISTRY.register(Box::new(ADDON_ARGOCD_SYNCED.clone()))?;
    REGISTRY.register(Box::new(ADDON_ARGOCD_HEALTHY.clone()))?;
    Ok(())
}

/// Publish one classified record under the workload or addon families
pub fn record_dependent(record: &DependentRecord) {
    let synced = flag(record.sync == SyncStatus::Synced);
    let healthy = flag(record.health == AppHealth::Healthy);
    let name = record.name.as_str();
    let cluster = record.owner_cluster.as_str();
    let namespace = record.namespace.as_str();

    match record.kind {
        DependentKind::Workload => {
            for phase in DependentPhase::ALL {
                WORKLOAD_PHASE_INFO
                    .with_label_values(&[name, cluster, namespace, phase.as_str()])
                    .set(flag(phase == record.phase));
            }
            let labels = [name, cluster, namespace];
            WORKLOAD_ARGOCD_SYNCED.with_label_values(&labels).set(synced);
            WORKLOAD_ARGOCD_HEALTHY.with_label_values(&labels).set(healthy);
        }
        DependentKind::Addon => {
            let environment = record.environment.as_str();
            for phase in DependentPhase::ALL {
                ADDON_PHASE_INFO
                    .with_label_values(&[name, cluster, environment, namespace, phase.as_str()])
                    .set(flag(phase == record.phase));
            }
            let labels = [name, cluster, environment, namespace];
            ADDON_ARGOCD_SYNCED.with_label_values(&labels).set(synced);
            ADDON_ARGOCD_HEALTHY.with_label_values(&labels).set(healthy);
        }
    }
}

/// Current value of a workload phase series
pub fn workload_phase_gauge(
    name: &str,
    cluster: &str,
    namespace: &str,
    phase: DependentPhase,
) -> Option<f64> {
    WORKLOAD_PHASE_INFO
        .get_metric_with_label_values(&[name, cluster, namespace, phase.as_str()])
        .ok()
        .map(|g| g.get())
}

/// Current value of an addon phase series
pub fn addon_phase_gauge(
    name: &str,
    cluster: &str,
    environment: &str,
    namespace: &str,
    phase: DependentPhase,
) -> Option<f64> {
    ADDON_PHASE_INFO
        .get_metric_with_label_values(&[name, cluster, environment, namespace, phase.as_str()])
        .ok()
        .map(|g| g.get())
}
