//! # Phase Engine
//!
//! Folds a [`HealthSnapshot`] into one aggregate [`Phase`].
//!
//! The decision order is fixed:
//! 1. a stored `Deleting` phase is never overwritten
//! 2. full health wins over every failure signal
//! 3. a missing deployment record means the cluster is only scheduled
//! 4. degraded deployment or fewer than half the workloads ready is `Degraded`,
//!    escalating to `Failed` once the cluster is older than the failure threshold
//! 5. anything else is still `Progressing`

use super::health::{AppHealth, HealthSnapshot, SyncStatus};
use crate::constants::FAILURE_THRESHOLD_SECS;
use chrono::Duration;
use std::fmt;
use std::str::FromStr;

/// Aggregate lifecycle phase of a ManagedCluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Scheduled,
    Progressing,
    Ready,
    Degraded,
    Failed,
    Deleting,
    Unknown,
}

impl Phase {
    /// Every phase, in metric emission order
    pub const ALL: [Phase; 7] = [
        Phase::Scheduled,
        Phase::Progressing,
        Phase::Ready,
        Phase::Degraded,
        Phase::Failed,
        Phase::Deleting,
        Phase::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Scheduled => "Scheduled",
            Phase::Progressing => "Progressing",
            Phase::Ready => "Ready",
            Phase::Degraded => "Degraded",
            Phase::Failed => "Failed",
            Phase::Deleting => "Deleting",
            Phase::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| format!("unknown phase '{s}'"))
    }
}

/// Age after which sustained instability is reported as `Failed`
pub fn failure_threshold() -> Duration {
    Duration::seconds(FAILURE_THRESHOLD_SECS)
}

/// Compute the phase for one cluster.
///
/// Pure: the result depends only on the arguments.
pub fn compute_phase(
    snapshot: &HealthSnapshot,
    cluster_age: Duration,
    stored_phase: Option<Phase>,
) -> Phase {
    if stored_phase == Some(Phase::Deleting) {
        return Phase::Deleting;
    }

    let fully_healthy = snapshot.deployment_health == AppHealth::Healthy
        && snapshot.deployment_sync == SyncStatus::Synced
        && snapshot.all_workloads_ready()
        && snapshot.sub_apps_ok()
        && snapshot.credential_exists;
    if fully_healthy {
        return Phase::Ready;
    }

    if snapshot.deployment_health == AppHealth::Missing {
        return Phase::Scheduled;
    }

    let deploy_failed = snapshot.deployment_health == AppHealth::Degraded;
    if deploy_failed || snapshot.workloads_down() {
        if cluster_age > failure_threshold() {
            return Phase::Failed;
        }
        return Phase::Degraded;
    }

    Phase::Progressing
}

/// Human-readable message for a phase
pub fn phase_message(phase: Phase, cluster_name: &str) -> String {
    match phase {
        Phase::Ready => format!("VCluster {cluster_name} is fully operational"),
        Phase::Scheduled => format!(
            "VCluster {cluster_name} resources have been scheduled, waiting for ArgoCD to sync"
        ),
        Phase::Progressing => format!("VCluster {cluster_name} is being provisioned"),
        Phase::Degraded => {
            format!("VCluster {cluster_name} is running but some components are unhealthy")
        }
        Phase::Failed => format!(
            "VCluster {cluster_name} has failed, components have been unhealthy for an extended period"
        ),
        Phase::Deleting => format!("VCluster {cluster_name} is being deleted"),
        Phase::Unknown => format!("VCluster {cluster_name} is in an unknown state"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> HealthSnapshot {
        HealthSnapshot {
            deployment_sync: SyncStatus::Synced,
            deployment_health: AppHealth::Healthy,
            workloads_ready: 5,
            workloads_total: 5,
            sub_apps_healthy: 3,
            sub_apps_total: 3,
            sub_apps_unhealthy: vec![],
            credential_exists: true,
        }
    }

    fn unstable() -> HealthSnapshot {
        HealthSnapshot {
            deployment_health: AppHealth::Degraded,
            workloads_ready: 1,
            workloads_total: 5,
            ..healthy()
        }
    }

    #[test]
    fn test_ready_when_fully_healthy() {
        assert_eq!(
            compute_phase(&healthy(), Duration::minutes(30), None),
            Phase::Ready
        );
    }

    #[test]
    fn test_deleting_is_sticky() {
        for snapshot in [healthy(), unstable(), HealthSnapshot::default()] {
            assert_eq!(
                compute_phase(&snapshot, Duration::hours(3), Some(Phase::Deleting)),
                Phase::Deleting
            );
        }
    }

    #[test]
    fn test_other_stored_phases_are_recomputed() {
        assert_eq!(
            compute_phase(&healthy(), Duration::minutes(1), Some(Phase::Failed)),
            Phase::Ready
        );
    }

    #[test]
    fn test_missing_deployment_is_scheduled() {
        let snapshot = HealthSnapshot {
            deployment_health: AppHealth::Missing,
            ..HealthSnapshot::default()
        };
        assert_eq!(
            compute_phase(&snapshot, Duration::hours(2), None),
            Phase::Scheduled
        );
    }

    #[test]
    fn test_escalation_at_threshold() {
        let snapshot = unstable();
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(5), None),
            Phase::Degraded
        );
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(15), None),
            Phase::Degraded
        );
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(15) + Duration::seconds(1), None),
            Phase::Failed
        );
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(20), None),
            Phase::Failed
        );
    }

    #[test]
    fn test_workloads_down_alone_degrades() {
        let snapshot = HealthSnapshot {
            deployment_health: AppHealth::Progressing,
            workloads_ready: 1,
            workloads_total: 3,
            ..healthy()
        };
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(1), None),
            Phase::Degraded
        );
    }

    #[test]
    fn test_missing_credential_keeps_progressing() {
        let snapshot = HealthSnapshot {
            credential_exists: false,
            ..healthy()
        };
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(40), None),
            Phase::Progressing
        );
    }

    #[test]
    fn test_unhealthy_sub_app_keeps_progressing() {
        let snapshot = HealthSnapshot {
            sub_apps_healthy: 2,
            sub_apps_unhealthy: vec!["media-loki".to_string()],
            ..healthy()
        };
        assert_eq!(
            compute_phase(&snapshot, Duration::minutes(40), None),
            Phase::Progressing
        );
    }

    #[test]
    fn test_compute_phase_is_deterministic() {
        let snapshot = unstable();
        let first = compute_phase(&snapshot, Duration::minutes(7), Some(Phase::Ready));
        let second = compute_phase(&snapshot, Duration::minutes(7), Some(Phase::Ready));
        assert_eq!(first, second);
    }

    #[test]
    fn test_phase_round_trips_through_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.as_str().parse::<Phase>(), Ok(phase));
        }
        assert!("Pending".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_message_interpolates_name() {
        assert_eq!(
            phase_message(Phase::Ready, "media"),
            "VCluster media is fully operational"
        );
        for phase in Phase::ALL {
            assert!(phase_message(phase, "media").contains("media"));
        }
    }
}
