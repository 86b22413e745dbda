//! # Constants
//!
//! Default values, well-known resource names and the label contract shared with
//! the provisioning pipeline.

/// Default interval between reconcile cycles (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 60;

/// Default HTTP port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default time to wait for the HTTP listener to bind (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default poll interval while waiting for the HTTP listener (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default number of ManagedClusters reconciled concurrently within one cycle
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: usize = 4;

/// Namespace holding ArgoCD Application records
pub const DEFAULT_ARGOCD_NAMESPACE: &str = "argocd";

/// A cluster that has been unstable for longer than this is reported as Failed
/// instead of Degraded.
pub const FAILURE_THRESHOLD_SECS: i64 = 15 * 60;

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "platform-status-reconciler";

/// Prefix of the parent ArgoCD Application deploying a vCluster (`vcluster-<name>`)
pub const DEPLOYMENT_APP_PREFIX: &str = "vcluster-";

/// Prefix of the generated kubeconfig secret (`vc-<name>`)
pub const CREDENTIAL_SECRET_PREFIX: &str = "vc-";

/// Label ArgoCD sets on applications created by a parent application
pub const ARGOCD_INSTANCE_LABEL: &str = "argocd.argoproj.io/instance";

/// Label carrying the owning cluster name of a deployment record
pub const CLUSTER_NAME_LABEL: &str = "clusterName";

/// Label carrying the environment of an add-on record
pub const ENVIRONMENT_LABEL: &str = "environment";

/// Optional label carrying the display name of a deployment record
pub const ADDON_NAME_LABEL: &str = "addonName";

/// Label selector matching every platform-managed deployment record (`addon=true`)
pub const PLATFORM_MANAGED_SELECTOR: &str = "addon=true";

/// Name of the parent ArgoCD Application for a cluster
pub fn deployment_app_name(cluster_name: &str) -> String {
    format!("{DEPLOYMENT_APP_PREFIX}{cluster_name}")
}

/// Name of the generated kubeconfig secret for a cluster
pub fn credential_secret_name(cluster_name: &str) -> String {
    format!("{CREDENTIAL_SECRET_PREFIX}{cluster_name}")
}
