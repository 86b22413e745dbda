//! # Reconciler Types
//!
//! Shared reconciler context and error types.

use super::api::PlatformApi;
use super::health::HealthSnapshot;
use super::phase::Phase;
use crate::config::ReconcilerConfig;
use crate::crd::Condition;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Reconciler context shared by every cycle
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Read/write access to the platform's resources
    pub api: Arc<dyn PlatformApi>,
    pub config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(api: Arc<dyn PlatformApi>, config: ReconcilerConfig) -> Self {
        Self { api, config }
    }
}

/// Everything computed for one ManagedCluster in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub phase: Phase,
    pub message: String,
    pub conditions: Vec<Condition>,
    pub snapshot: HealthSnapshot,
}

/// The four independent health probes run for every ManagedCluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    Deployment,
    Workloads,
    SubApps,
    Credential,
}

impl Probe {
    pub fn as_str(self) -> &'static str {
        match self {
            Probe::Deployment => "deployment",
            Probe::Workloads => "workloads",
            Probe::SubApps => "sub-apps",
            Probe::Credential => "credential",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciler errors
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to list {resource}: {source}")]
    ListFailed {
        resource: &'static str,
        #[source]
        source: Box<ReconcilerError>,
    },

    #[error("{probe} probe failed for {cluster}: {source}")]
    ProbeFailed {
        probe: Probe,
        cluster: String,
        #[source]
        source: Box<ReconcilerError>,
    },

    #[error("Failed to update status for {namespace}/{name}: {source}")]
    StatusWriteFailed {
        namespace: String,
        name: String,
        #[source]
        source: Box<ReconcilerError>,
    },

    #[error("Failed to serialize status patch: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconcilerError {
    pub(crate) fn probe(probe: Probe, cluster: &str, source: ReconcilerError) -> Self {
        Self::ProbeFailed {
            probe,
            cluster: cluster.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn list(resource: &'static str, source: ReconcilerError) -> Self {
        Self::ListFailed {
            resource,
            source: Box::new(source),
        }
    }

    pub(crate) fn status_write(namespace: &str, name: &str, source: ReconcilerError) -> Self {
        Self::StatusWriteFailed {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}
