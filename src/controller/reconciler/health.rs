//! # Health Signals
//!
//! Typed health signals gathered by the probes and consumed by the phase engine.

use crate::crd::{DeploymentHealth, HealthStatus, SubAppHealth, WorkloadHealth};
use std::fmt;

/// Sync status of a deployment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    #[default]
    Unknown,
}

impl SyncStatus {
    /// Parse the status string reported by ArgoCD; anything unrecognised is `Unknown`
    pub fn from_argocd(value: &str) -> Self {
        match value {
            "Synced" => Self::Synced,
            "OutOfSync" => Self::OutOfSync,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synced => "Synced",
            Self::OutOfSync => "OutOfSync",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health status of a deployment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppHealth {
    Healthy,
    Degraded,
    Progressing,
    Missing,
    Suspended,
    #[default]
    Unknown,
}

impl AppHealth {
    /// Parse the health string reported by ArgoCD; anything unrecognised is `Unknown`
    pub fn from_argocd(value: &str) -> Self {
        match value {
            "Healthy" => Self::Healthy,
            "Degraded" => Self::Degraded,
            "Progressing" => Self::Progressing,
            "Missing" => Self::Missing,
            "Suspended" => Self::Suspended,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Progressing => "Progressing",
            Self::Missing => "Missing",
            Self::Suspended => "Suspended",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AppHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All health signals for one ManagedCluster, gathered fresh every cycle.
///
/// Invariant: `workloads_ready <= workloads_total` and `sub_apps_healthy <= sub_apps_total`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthSnapshot {
    pub deployment_sync: SyncStatus,
    pub deployment_health: AppHealth,
    pub workloads_ready: u32,
    pub workloads_total: u32,
    pub sub_apps_healthy: u32,
    pub sub_apps_total: u32,
    pub sub_apps_unhealthy: Vec<String>,
    pub credential_exists: bool,
}

impl HealthSnapshot {
    /// Every workload instance is ready and there is at least one
    pub fn all_workloads_ready(&self) -> bool {
        self.workloads_total > 0 && self.workloads_ready == self.workloads_total
    }

    /// No dependent applications, or all of them Healthy
    pub fn sub_apps_ok(&self) -> bool {
        self.sub_apps_total == 0 || self.sub_apps_healthy == self.sub_apps_total
    }

    /// Fewer than half of the workload instances are ready
    pub fn workloads_down(&self) -> bool {
        self.workloads_total > 0 && u64::from(self.workloads_ready) * 2 < u64::from(self.workloads_total)
    }

    /// Persisted form of the snapshot
    pub fn to_status(&self) -> HealthStatus {
        HealthStatus {
            argocd: DeploymentHealth {
                sync_status: self.deployment_sync.to_string(),
                health_status: self.deployment_health.to_string(),
            },
            workloads: WorkloadHealth {
                ready: self.workloads_ready,
                total: self.workloads_total,
            },
            sub_apps: SubAppHealth {
                healthy: self.sub_apps_healthy,
                total: self.sub_apps_total,
                unhealthy: self.sub_apps_unhealthy.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_argocd_strings() {
        assert_eq!(SyncStatus::from_argocd("Synced"), SyncStatus::Synced);
        assert_eq!(SyncStatus::from_argocd("OutOfSync"), SyncStatus::OutOfSync);
        assert_eq!(SyncStatus::from_argocd(""), SyncStatus::Unknown);
        assert_eq!(AppHealth::from_argocd("Suspended"), AppHealth::Suspended);
        assert_eq!(AppHealth::from_argocd("healthy"), AppHealth::Unknown);
    }

    #[test]
    fn test_workloads_down_boundary() {
        let mut snapshot = HealthSnapshot {
            workloads_ready: 2,
            workloads_total: 4,
            ..Default::default()
        };
        // exactly half is not down
        assert!(!snapshot.workloads_down());
        snapshot.workloads_ready = 1;
        assert!(snapshot.workloads_down());
        snapshot.workloads_total = 0;
        snapshot.workloads_ready = 0;
        assert!(!snapshot.workloads_down());
    }

    #[test]
    fn test_sub_apps_ok_with_no_children() {
        let snapshot = HealthSnapshot::default();
        assert!(snapshot.sub_apps_ok());
        assert!(!snapshot.all_workloads_ready());
    }
}
