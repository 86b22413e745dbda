//! # Cluster Metrics
//!
//! Gauges mirroring each ManagedCluster's computed phase and health snapshot,
//! labelled by `name` and `namespace`.

use crate::controller::reconciler::health::{AppHealth, HealthSnapshot, SyncStatus};
use crate::controller::reconciler::phase::Phase;
use crate::observability::metrics::{flag, registry::REGISTRY};
use anyhow::Result;
use prometheus::{GaugeVec, Opts};
use std::sync::LazyLock;

const CLUSTER_LABELS: &[&str] = &["name", "namespace"];

fn cluster_gauge(name: &str, help: &str) -> GaugeVec {
    GaugeVec::new(Opts::new(name, help), CLUSTER_LABELS)
        .expect("Failed to create cluster gauge - this should never happen")
}

static PHASE_INFO: LazyLock<GaugeVec> = LazyLock::new(|| {
    GaugeVec::new(
        Opts::new(
            "platform_vcluster_phase_info",
            "Current phase of vcluster (1=active for the labeled phase)",
        ),
        &["name", "namespace", "phase"],
    )
    .expect("Failed to create PHASE_INFO metric - this should never happen")
});

static READY: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_ready",
        "Whether vcluster is in Ready phase (1=ready, 0=not)",
    )
});

static PODS_READY: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_pods_ready",
        "Number of ready pods in vcluster namespace",
    )
});

static PODS_TOTAL: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_pods_total",
        "Total pods in vcluster namespace",
    )
});

static ARGOCD_SYNCED: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_argocd_synced",
        "Whether ArgoCD app is synced (1=synced, 0=not)",
    )
});

static ARGOCD_HEALTHY: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_argocd_healthy",
        "Whether ArgoCD app is healthy (1=healthy, 0=not)",
    )
});

static CREDENTIAL_AVAILABLE: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_credential_available",
        "Whether the kubeconfig secret exists (1=present, 0=missing)",
    )
});

static SUBAPPS_HEALTHY: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_subapps_healthy",
        "Number of healthy sub-apps for vcluster",
    )
});

static SUBAPPS_TOTAL: LazyLock<GaugeVec> = LazyLock::new(|| {
    cluster_gauge(
        "platform_vcluster_subapps_total",
        "Total number of sub-apps for vcluster",
    )
});

pub(crate) fn register_cluster_metrics() -> Result<()> {
    REGISTRY.register(Box::new(PHASE_INFO.clone()))?;
    REGISTRY.register(Box::new(READY.clone()))?;
    REGISTRY.register(Box::new(PODS_READY.clone()))?;
    REGISTRY.register(Box::new(PODS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ARGOCD_SYNCED.clone()))?;
    REGISTRY.register(Box::new(ARGOCD_HEALTHY.clone()))?;
    REGISTRY.register(Box::new(CREDENTIAL_AVAILABLE.clone()))?;
    REGISTRY.register(Box::new(SUBAPPS_HEALTHY.clone()))?;
    REGISTRY.register(Box::new(SUBAPPS_TOTAL.clone()))?;
    Ok(())
}

/// Publish a cluster's phase and snapshot.
///
/// Every one of the seven phase series is written on each call, so exactly one
/// of them is 1 for the cluster afterwards.
pub fn record_cluster_status(name: &str, namespace: &str, phase: Phase, snapshot: &HealthSnapshot) {
    for candidate in Phase::ALL {
        PHASE_INFO
            .with_label_values(&[name, namespace, candidate.as_str()])
            .set(flag(candidate == phase));
    }

    let labels = [name, namespace];
    READY
        .with_label_values(&labels)
        .set(flag(phase == Phase::Ready));
    PODS_READY
        .with_label_values(&labels)
        .set(f64::from(snapshot.workloads_ready));
    PODS_TOTAL
        .with_label_values(&labels)
        .set(f64::from(snapshot.workloads_total));
    ARGOCD_SYNCED
        .with_label_values(&labels)
        .set(flag(snapshot.deployment_sync == SyncStatus::Synced));
    ARGOCD_HEALTHY
        .with_label_values(&labels)
        .set(flag(snapshot.deployment_health == AppHealth::Healthy));
    CREDENTIAL_AVAILABLE
        .with_label_values(&labels)
        .set(flag(snapshot.credential_exists));
    SUBAPPS_HEALTHY
        .with_label_values(&labels)
        .set(f64::from(snapshot.sub_apps_healthy));
    SUBAPPS_TOTAL
        .with_label_values(&labels)
        .set(f64::from(snapshot.sub_apps_total));
}

/// Current value of one phase series for a cluster
pub fn phase_gauge(name: &str, namespace: &str, phase: Phase) -> Option<f64> {
    PHASE_INFO
        .get_metric_with_label_values(&[name, namespace, phase.as_str()])
        .ok()
        .map(|gauge| gauge.get())
}
