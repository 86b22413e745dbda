//! # ManagedCluster Status
//!
//! Status types shared between the reconciler and the provisioning pipeline.
//!
//! Field ownership:
//! - `endpoints`, `credentials` are written by the pipeline; the reconciler only echoes them back
//! - everything else is recomputed by the reconciler on every cycle

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Status of the ManagedCluster resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterStatus {
    /// Aggregate lifecycle phase
    /// Values: Scheduled, Progressing, Ready, Degraded, Failed, Deleting, Unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Human-readable description of the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time of the last successful status write (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<String>,
    /// Discoverable URLs, owned by the provisioning pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
    /// Credential references (never values), owned by the provisioning pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
    /// Raw health signals behind the phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthStatus>,
    /// Conditions, fully replaced on every write
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Discoverable URLs for the cluster
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    /// API server URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<String>,
    /// ArgoCD URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argocd: Option<String>,
}

impl Endpoints {
    /// True when no endpoint carries a value
    pub fn is_empty(&self) -> bool {
        is_blank(self.api.as_deref()) && is_blank(self.argocd.as_deref())
    }
}

/// Credential references for the cluster
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Name of the kubeconfig secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig_secret: Option<String>,
    /// 1Password item holding the kubeconfig
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_password_item: Option<String>,
}

impl Credentials {
    /// True when no reference carries a value
    pub fn is_empty(&self) -> bool {
        is_blank(self.kubeconfig_secret.as_deref()) && is_blank(self.one_password_item.as_deref())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Health signals persisted alongside the phase
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    /// Parent deployment record status
    #[serde(default)]
    pub argocd: DeploymentHealth,
    /// Workload readiness in the target namespace
    #[serde(default)]
    pub workloads: WorkloadHealth,
    /// Aggregate health of dependent applications
    #[serde(default)]
    pub sub_apps: SubAppHealth,
}

/// Sync and health reported by the continuous-delivery system
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentHealth {
    /// Synced, OutOfSync or Unknown
    #[serde(default)]
    pub sync_status: String,
    /// Healthy, Degraded, Progressing, Missing, Suspended or Unknown
    #[serde(default)]
    pub health_status: String,
}

/// Ready and total workload instances
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
pub struct WorkloadHealth {
    #[serde(default)]
    pub ready: u32,
    #[serde(default)]
    pub total: u32,
}

/// Healthy and total dependent applications
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq, JsonSchema)]
pub struct SubAppHealth {
    #[serde(default)]
    pub healthy: u32,
    #[serde(default)]
    pub total: u32,
    /// Names of dependent applications that are not Healthy
    #[serde(default)]
    pub unhealthy: Vec<String>,
}

/// Condition represents one boolean fact about the cluster
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False)
    pub status: String,
    /// Machine-readable reason
    #[serde(default)]
    pub reason: String,
    /// Message describing the condition
    #[serde(default)]
    pub message: String,
    /// Last transition time (RFC3339)
    #[serde(default)]
    pub last_transition_time: String,
}
