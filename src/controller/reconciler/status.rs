//! # Status Writer
//!
//! Merges a [`ReconcileOutcome`] into a ManagedCluster's persisted status.
//!
//! The patch carries only the fields this reconciler owns (`phase`, `message`,
//! `lastReconciled`, `health`, `conditions`). `endpoints` and `credentials` belong
//! to the provisioning pipeline: they are re-read right before the write and
//! echoed back unchanged when non-empty, so the merge never drops them.
//!
//! The same re-read guards `Deleting`: if the stored phase turned `Deleting`
//! after the cluster was listed, the outcome is switched to `Deleting` before
//! the patch is built.

use super::api::PlatformApi;
use super::conditions::build_conditions;
use super::phase::{phase_message, Phase};
use super::types::{ReconcileOutcome, ReconcilerError};
use crate::crd::{Condition, Credentials, Endpoints, HealthStatus, ManagedCluster, ManagedClusterStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use kube::ResourceExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

/// Body of the `status` merge patch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusPatch<'a> {
    phase: &'a str,
    message: &'a str,
    last_reconciled: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoints: Option<Endpoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials: Option<Credentials>,
    health: HealthStatus,
    conditions: &'a [Condition],
}

/// Build the merge patch document for an outcome.
///
/// `existing` is the freshly re-read status; only its non-empty `endpoints` and
/// `credentials` are carried over.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized.
pub fn build_status_patch(
    outcome: &ReconcileOutcome,
    existing: Option<&ManagedClusterStatus>,
    now: DateTime<Utc>,
) -> Result<Value, ReconcilerError> {
    let status = StatusPatch {
        phase: outcome.phase.as_str(),
        message: &outcome.message,
        last_reconciled: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        endpoints: existing
            .and_then(|s| s.endpoints.clone())
            .filter(|e| !e.is_empty()),
        credentials: existing
            .and_then(|s| s.credentials.clone())
            .filter(|c| !c.is_empty()),
        health: outcome.snapshot.to_status(),
        conditions: &outcome.conditions,
    };

    Ok(serde_json::json!({ "status": serde_json::to_value(status)? }))
}

/// Switch `outcome` to `Deleting` when the freshly read status already says so.
///
/// Returns true if the outcome was changed.
pub fn hold_deleting(
    outcome: &mut ReconcileOutcome,
    current: &ManagedCluster,
    cluster_name: &str,
    now: DateTime<Utc>,
) -> bool {
    let stored_deleting = current.stored_phase() == Some(Phase::Deleting.as_str());
    if !stored_deleting || outcome.phase == Phase::Deleting {
        return false;
    }
    outcome.phase = Phase::Deleting;
    outcome.message = phase_message(Phase::Deleting, cluster_name);
    outcome.conditions = build_conditions(&outcome.snapshot, Phase::Deleting, cluster_name, now);
    true
}

/// Re-read the cluster, then apply the status patch in one merge-patch request.
///
/// `outcome` is switched to `Deleting` if the re-read shows the cluster is being
/// torn down (see [`hold_deleting`]). Nothing is retried here; a failed read or
/// write leaves the stored status untouched and is reported to the caller.
///
/// # Errors
///
/// Returns [`ReconcilerError::StatusWriteFailed`] if the re-read or the patch fails.
pub async fn write_status(
    api: &dyn PlatformApi,
    cluster: &ManagedCluster,
    outcome: &mut ReconcileOutcome,
    now: DateTime<Utc>,
) -> Result<(), ReconcilerError> {
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();
    let wrap = |e: ReconcilerError| ReconcilerError::status_write(&namespace, &name, e);

    let current = api.get_cluster(&namespace, &name).await.map_err(wrap)?;
    if hold_deleting(outcome, &current, &name, now) {
        info!(
            resource.name = %name,
            resource.namespace = %namespace,
            "Cluster became Deleting during reconcile, keeping Deleting"
        );
    }
    let patch = build_status_patch(outcome, current.status.as_ref(), now).map_err(wrap)?;

    debug!(
        resource.name = %name,
        resource.namespace = %namespace,
        phase = outcome.phase.as_str(),
        "Patching status"
    );

    api.patch_cluster_status(&namespace, &name, patch)
        .await
        .map_err(wrap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::health::{AppHealth, HealthSnapshot, SyncStatus};
    use crate::crd::ManagedClusterSpec;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn outcome() -> ReconcileOutcome {
        let snapshot = HealthSnapshot {
            deployment_sync: SyncStatus::Synced,
            deployment_health: AppHealth::Degraded,
            workloads_ready: 3,
            workloads_total: 5,
            sub_apps_healthy: 1,
            sub_apps_total: 2,
            sub_apps_unhealthy: vec!["media-loki".to_string()],
            credential_exists: true,
        };
        ReconcileOutcome {
            phase: Phase::Degraded,
            message: phase_message(Phase::Degraded, "media"),
            conditions: build_conditions(&snapshot, Phase::Degraded, "media", now()),
            snapshot,
        }
    }

    #[test]
    fn test_patch_contains_owned_fields_only() {
        let patch = build_status_patch(&outcome(), None, now()).unwrap();
        let status = patch["status"].as_object().unwrap();

        let mut keys: Vec<&str> = status.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["conditions", "health", "lastReconciled", "message", "phase"]
        );
        assert_eq!(status["phase"], "Degraded");
        assert_eq!(status["lastReconciled"], "2026-03-01T12:00:00Z");
        assert_eq!(status["health"]["argocd"]["healthStatus"], "Degraded");
        assert_eq!(status["health"]["workloads"]["total"], 5);
        assert_eq!(status["health"]["subApps"]["unhealthy"][0], "media-loki");
        assert_eq!(status["conditions"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_patch_echoes_pipeline_fields() {
        let existing = ManagedClusterStatus {
            phase: Some("Progressing".to_string()),
            endpoints: Some(Endpoints {
                api: Some("https://media.integratn.tech".to_string()),
                argocd: Some("https://argocd.media.integratn.tech".to_string()),
            }),
            credentials: Some(Credentials {
                kubeconfig_secret: Some("vc-media".to_string()),
                one_password_item: Some("vcluster-media-kubeconfig".to_string()),
            }),
            ..Default::default()
        };

        let patch = build_status_patch(&outcome(), Some(&existing), now()).unwrap();
        let status = &patch["status"];
        assert_eq!(status["endpoints"]["api"], "https://media.integratn.tech");
        assert_eq!(status["endpoints"]["argocd"], "https://argocd.media.integratn.tech");
        assert_eq!(status["credentials"]["kubeconfigSecret"], "vc-media");
        assert_eq!(
            status["credentials"]["onePasswordItem"],
            "vcluster-media-kubeconfig"
        );
    }

    #[test]
    fn test_patch_omits_empty_pipeline_fields() {
        let existing = ManagedClusterStatus {
            endpoints: Some(Endpoints {
                api: Some(String::new()),
                argocd: None,
            }),
            credentials: Some(Credentials::default()),
            ..Default::default()
        };

        let patch = build_status_patch(&outcome(), Some(&existing), now()).unwrap();
        assert!(patch["status"].get("endpoints").is_none());
        assert!(patch["status"].get("credentials").is_none());
    }

    fn cluster_with_phase(phase: &str) -> ManagedCluster {
        let mut mc = ManagedCluster::new("media", ManagedClusterSpec::default());
        mc.status = Some(ManagedClusterStatus {
            phase: Some(phase.to_string()),
            ..Default::default()
        });
        mc
    }

    #[test]
    fn test_hold_deleting_switches_outcome() {
        let mut outcome = outcome();
        let current = cluster_with_phase("Deleting");
        let changed = hold_deleting(&mut outcome, &current, "media", now());

        assert!(changed);
        assert_eq!(outcome.phase, Phase::Deleting);
        assert_eq!(outcome.message, phase_message(Phase::Deleting, "media"));
        assert_eq!(outcome.conditions[0].reason, "Deleting");

        let patch = build_status_patch(&outcome, None, now()).unwrap();
        assert_eq!(patch["status"]["phase"], "Deleting");
    }

    #[test]
    fn test_hold_deleting_leaves_other_phases() {
        let mut outcome = outcome();
        let before = outcome.clone();
        assert!(!hold_deleting(&mut outcome, &cluster_with_phase("Ready"), "media", now()));
        assert_eq!(outcome, before);
    }
}
