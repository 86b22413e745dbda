//! # Conditions
//!
//! Builds the four status conditions for a cluster. The list always has the same
//! order and fully replaces whatever was stored before.

use super::health::{HealthSnapshot, SyncStatus};
use super::phase::{phase_message, Phase};
use crate::crd::Condition;
use chrono::{DateTime, SecondsFormat, Utc};

pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_DEPLOYMENT_SYNCED: &str = "DeploymentSynced";
pub const CONDITION_WORKLOADS_READY: &str = "WorkloadsReady";
pub const CONDITION_CREDENTIAL_AVAILABLE: &str = "CredentialAvailable";

fn condition(
    r#type: &str,
    status: bool,
    reason: &str,
    message: String,
    now: DateTime<Utc>,
) -> Condition {
    Condition {
        r#type: r#type.to_string(),
        status: if status { "True" } else { "False" }.to_string(),
        reason: reason.to_string(),
        message,
        last_transition_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Build Ready, DeploymentSynced, WorkloadsReady and CredentialAvailable, in that order.
///
/// `lastTransitionTime` is stamped with `now` on every call.
pub fn build_conditions(
    snapshot: &HealthSnapshot,
    phase: Phase,
    cluster_name: &str,
    now: DateTime<Utc>,
) -> Vec<Condition> {
    let ready = if phase == Phase::Ready {
        condition(
            CONDITION_READY,
            true,
            "AllHealthy",
            "All components healthy".to_string(),
            now,
        )
    } else {
        condition(
            CONDITION_READY,
            false,
            phase.as_str(),
            phase_message(phase, cluster_name),
            now,
        )
    };

    let synced = if snapshot.deployment_sync == SyncStatus::Synced {
        condition(
            CONDITION_DEPLOYMENT_SYNCED,
            true,
            "Synced",
            "ArgoCD application is synced".to_string(),
            now,
        )
    } else {
        condition(
            CONDITION_DEPLOYMENT_SYNCED,
            false,
            snapshot.deployment_sync.as_str(),
            format!("ArgoCD sync status: {}", snapshot.deployment_sync),
            now,
        )
    };

    let workloads = if snapshot.all_workloads_ready() {
        condition(
            CONDITION_WORKLOADS_READY,
            true,
            "AllWorkloadsReady",
            format!("All {} workloads are ready", snapshot.workloads_total),
            now,
        )
    } else {
        condition(
            CONDITION_WORKLOADS_READY,
            false,
            "WorkloadsNotReady",
            format!(
                "{}/{} workloads ready",
                snapshot.workloads_ready, snapshot.workloads_total
            ),
            now,
        )
    };

    let credential = if snapshot.credential_exists {
        condition(
            CONDITION_CREDENTIAL_AVAILABLE,
            true,
            "SecretExists",
            "Kubeconfig secret is available".to_string(),
            now,
        )
    } else {
        condition(
            CONDITION_CREDENTIAL_AVAILABLE,
            false,
            "SecretMissing",
            "Kubeconfig secret not found".to_string(),
            now,
        )
    };

    vec![ready, synced, workloads, credential]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::health::AppHealth;

    fn types(conditions: &[Condition]) -> Vec<&str> {
        conditions.iter().map(|c| c.r#type.as_str()).collect()
    }

    #[test]
    fn test_fixed_order_and_count() {
        let conditions = build_conditions(&HealthSnapshot::default(), Phase::Unknown, "media", Utc::now());
        assert_eq!(
            types(&conditions),
            vec![
                CONDITION_READY,
                CONDITION_DEPLOYMENT_SYNCED,
                CONDITION_WORKLOADS_READY,
                CONDITION_CREDENTIAL_AVAILABLE
            ]
        );
    }

    #[test]
    fn test_all_true_when_ready() {
        let snapshot = HealthSnapshot {
            deployment_sync: SyncStatus::Synced,
            deployment_health: AppHealth::Healthy,
            workloads_ready: 4,
            workloads_total: 4,
            credential_exists: true,
            ..Default::default()
        };
        let conditions = build_conditions(&snapshot, Phase::Ready, "media", Utc::now());
        assert!(conditions.iter().all(|c| c.status == "True"));
        assert_eq!(conditions[2].message, "All 4 workloads are ready");
    }

    #[test]
    fn test_false_conditions_carry_reasons() {
        let snapshot = HealthSnapshot {
            deployment_sync: SyncStatus::OutOfSync,
            workloads_ready: 0,
            workloads_total: 0,
            ..Default::default()
        };
        let conditions = build_conditions(&snapshot, Phase::Progressing, "media", Utc::now());
        assert!(conditions.iter().all(|c| c.status == "False"));
        assert_eq!(conditions[0].reason, "Progressing");
        assert_eq!(conditions[0].message, "VCluster media is being provisioned");
        assert_eq!(conditions[1].reason, "OutOfSync");
        assert_eq!(conditions[2].message, "0/0 workloads ready");
        assert_eq!(conditions[3].reason, "SecretMissing");
    }

    #[test]
    fn test_transition_time_is_now() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let conditions = build_conditions(&HealthSnapshot::default(), Phase::Scheduled, "media", now);
        assert!(conditions
            .iter()
            .all(|c| c.last_transition_time == "2026-03-01T12:00:00Z"));
    }
}
