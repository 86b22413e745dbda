//! # Reconciler Configuration
//!
//! Scheduling and discovery settings loaded from environment variables.

use super::{env_var_or_default, parse_duration};
use crate::constants::{
    DEFAULT_ARGOCD_NAMESPACE, DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_RECONCILE_INTERVAL_SECS,
};
use std::time::Duration;
use tracing::warn;

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Sleep between reconcile cycles
    pub reconcile_interval: Duration,
    /// Namespace holding ArgoCD Application records
    pub argocd_namespace: String,
    /// Namespace scope for ManagedCluster listing (`None` lists all namespaces)
    pub cluster_namespace: Option<String>,
    /// Maximum number of ManagedClusters reconciled concurrently
    pub max_concurrent_reconciles: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS),
            argocd_namespace: DEFAULT_ARGOCD_NAMESPACE.to_string(),
            cluster_namespace: None,
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let interval = std::env::var("RECONCILE_INTERVAL").ok();
        let cluster_namespace = std::env::var("CLUSTER_NAMESPACE")
            .ok()
            .map(|ns| ns.trim().to_string())
            .filter(|ns| !ns.is_empty());

        Self {
            reconcile_interval: reconcile_interval_from(interval.as_deref()),
            argocd_namespace: env_var_or_default(
                "ARGOCD_NAMESPACE",
                DEFAULT_ARGOCD_NAMESPACE.to_string(),
            ),
            cluster_namespace,
            max_concurrent_reconciles: env_var_or_default(
                "MAX_CONCURRENT_RECONCILES",
                DEFAULT_MAX_CONCURRENT_RECONCILES,
            )
            .max(1),
        }
    }
}

/// Resolve the reconcile interval from an optional raw value.
///
/// Unset, empty or unparseable values fall back to the default interval.
pub(crate) fn reconcile_interval_from(raw: Option<&str>) -> Duration {
    let default = Duration::from_secs(DEFAULT_RECONCILE_INTERVAL_SECS);
    match raw.map(str::trim) {
        None | Some("") => default,
        Some(value) => parse_duration(value).unwrap_or_else(|e| {
            warn!(
                value,
                error = %e,
                "Invalid RECONCILE_INTERVAL, using default of {}s",
                DEFAULT_RECONCILE_INTERVAL_SECS
            );
            default
        }),
    }
}
