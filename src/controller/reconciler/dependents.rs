//! # Dependent-Record Classifier
//!
//! Second pass of every cycle. Platform-managed Applications (`addon=true`) are
//! given a memoryless phase from their sync/health pair and published either as
//! workload metrics, when their `clusterName` label names a ManagedCluster seen
//! in this cycle, or as addon metrics otherwise. Records are never mutated.

use super::api::{AppRecord, PlatformApi};
use super::health::{AppHealth, SyncStatus};
use super::types::ReconcilerError;
use crate::constants::{
    ADDON_NAME_LABEL, CLUSTER_NAME_LABEL, ENVIRONMENT_LABEL, PLATFORM_MANAGED_SELECTOR,
};
use crate::observability::metrics::{controller_metrics, dependent_metrics};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Phase of a dependent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependentPhase {
    Ready,
    Progressing,
    Degraded,
    Suspended,
    Unknown,
}

impl DependentPhase {
    pub const ALL: [DependentPhase; 5] = [
        DependentPhase::Ready,
        DependentPhase::Progressing,
        DependentPhase::Degraded,
        DependentPhase::Suspended,
        DependentPhase::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DependentPhase::Ready => "Ready",
            DependentPhase::Progressing => "Progressing",
            DependentPhase::Degraded => "Degraded",
            DependentPhase::Suspended => "Suspended",
            DependentPhase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DependentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a dependent record's phase. Rules are checked top to bottom.
pub fn dependent_phase(sync: SyncStatus, health: AppHealth) -> DependentPhase {
    if sync == SyncStatus::Synced && health == AppHealth::Healthy {
        return DependentPhase::Ready;
    }
    if health == AppHealth::Degraded {
        return DependentPhase::Degraded;
    }
    if health == AppHealth::Missing || sync == SyncStatus::Unknown {
        return DependentPhase::Unknown;
    }
    if health == AppHealth::Progressing || sync == SyncStatus::OutOfSync {
        return DependentPhase::Progressing;
    }
    if health == AppHealth::Suspended {
        return DependentPhase::Suspended;
    }
    DependentPhase::Progressing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependentKind {
    /// Owned by a known ManagedCluster
    Workload,
    /// Everything else
    Addon,
}

/// A platform-managed Application after classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentRecord {
    /// `addonName` label, or the Application name when the label is absent
    pub name: String,
    pub owner_cluster: String,
    /// Destination namespace
    pub namespace: String,
    pub environment: String,
    pub sync: SyncStatus,
    pub health: AppHealth,
    pub phase: DependentPhase,
    pub kind: DependentKind,
}

/// Classify one Application against the cluster names discovered this cycle
pub fn classify(app: &AppRecord, known_clusters: &HashSet<String>) -> DependentRecord {
    let owner_cluster = app.label(CLUSTER_NAME_LABEL).unwrap_or_default().to_string();
    let kind = if !owner_cluster.is_empty() && known_clusters.contains(&owner_cluster) {
        DependentKind::Workload
    } else {
        DependentKind::Addon
    };

    DependentRecord {
        name: app
            .label(ADDON_NAME_LABEL)
            .filter(|n| !n.is_empty())
            .unwrap_or(&app.name)
            .to_string(),
        owner_cluster,
        namespace: app.destination_namespace.clone().unwrap_or_default(),
        environment: app.label(ENVIRONMENT_LABEL).unwrap_or_default().to_string(),
        sync: app.sync,
        health: app.health,
        phase: dependent_phase(app.sync, app.health),
        kind,
    }
}

/// List platform-managed Applications, classify them and publish their metrics.
///
/// Must only run once every ManagedCluster of the cycle has been reconciled, so
/// that `known_clusters` is complete.
///
/// # Errors
///
/// Returns [`ReconcilerError::ListFailed`] if the Applications cannot be listed;
/// nothing is published in that case.
pub async fn reconcile_dependents(
    api: &dyn PlatformApi,
    argocd_namespace: &str,
    known_clusters: &HashSet<String>,
) -> Result<Vec<DependentRecord>, ReconcilerError> {
    let apps = match api
        .list_applications(argocd_namespace, Some(PLATFORM_MANAGED_SELECTOR))
        .await
    {
        Ok(apps) => apps,
        Err(e) => {
            controller_metrics::increment_listing_errors("applications");
            warn!(error = %e, "Failed to list platform-managed applications");
            return Err(ReconcilerError::list("applications", e));
        }
    };

    let records: Vec<DependentRecord> = apps
        .iter()
        .map(|app| classify(app, known_clusters))
        .collect();

    for record in &records {
        debug!(
            application = %record.name,
            cluster = %record.owner_cluster,
            kind = ?record.kind,
            phase = record.phase.as_str(),
            "Classified dependent record"
        );
        dependent_metrics::record_dependent(record);
    }

    let workloads = records
        .iter()
        .filter(|r| r.kind == DependentKind::Workload)
        .count();
    info!(
        workloads,
        addons = records.len() - workloads,
        "Reconciled dependent records"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_dependent_phase_rules() {
        use AppHealth as H;
        use DependentPhase as P;
        use SyncStatus as S;

        assert_eq!(dependent_phase(S::Synced, H::Healthy), P::Ready);
        assert_eq!(dependent_phase(S::OutOfSync, H::Healthy), P::Progressing);
        assert_eq!(dependent_phase(S::Synced, H::Degraded), P::Degraded);
        // Degraded wins over an unknown sync status
        assert_eq!(dependent_phase(S::Unknown, H::Degraded), P::Degraded);
        assert_eq!(dependent_phase(S::Synced, H::Missing), P::Unknown);
        assert_eq!(dependent_phase(S::Unknown, H::Healthy), P::Unknown);
        assert_eq!(dependent_phase(S::Synced, H::Progressing), P::Progressing);
        assert_eq!(dependent_phase(S::OutOfSync, H::Suspended), P::Progressing);
        assert_eq!(dependent_phase(S::Synced, H::Suspended), P::Suspended);
        assert_eq!(dependent_phase(S::Synced, H::Unknown), P::Progressing);
    }

    fn app(name: &str, labels: &[(&str, &str)]) -> AppRecord {
        AppRecord {
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<BTreeMap<_, _>>(),
            sync: SyncStatus::Synced,
            health: AppHealth::Healthy,
            destination_namespace: Some("monitoring".to_string()),
            ..Default::default()
        }
    }

    fn known(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn test_classify_workload() {
        let record = classify(
            &app("media-jellyfin", &[("addon", "true"), ("clusterName", "media")]),
            &known(&["media"]),
        );
        assert_eq!(record.kind, DependentKind::Workload);
        assert_eq!(record.name, "media-jellyfin");
        assert_eq!(record.owner_cluster, "media");
        assert_eq!(record.namespace, "monitoring");
        assert_eq!(record.phase, DependentPhase::Ready);
    }

    #[test]
    fn test_classify_addon_keeps_environment() {
        let record = classify(
            &app(
                "cert-manager-prod",
                &[
                    ("addon", "true"),
                    ("clusterName", "the-cluster"),
                    ("environment", "production"),
                    ("addonName", "cert-manager"),
                ],
            ),
            &known(&["media"]),
        );
        assert_eq!(record.kind, DependentKind::Addon);
        assert_eq!(record.name, "cert-manager");
        assert_eq!(record.environment, "production");
    }

    #[test]
    fn test_classify_without_cluster_label_is_addon() {
        let record = classify(&app("external-dns", &[("addon", "true")]), &known(&["media"]));
        assert_eq!(record.kind, DependentKind::Addon);
        assert_eq!(record.owner_cluster, "");
    }

    #[test]
    fn test_empty_cluster_set_classifies_everything_as_addon() {
        let record = classify(
            &app("media-jellyfin", &[("clusterName", "media")]),
            &HashSet::new(),
        );
        assert_eq!(record.kind, DependentKind::Addon);
    }
}
