//! # Custom Resource Definitions
//!
//! CRD types read and written by the reconciler.
//!
//! The ManagedCluster resource is created by the provisioning pipeline; this crate
//! only reads its spec and owns a subset of its status (see [`status`]).

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod status;

pub use status::*;

/// ManagedCluster Custom Resource Definition
///
/// One provisioned virtual cluster.
///
/// # Example
///
/// ```yaml
/// apiVersion: platform.integratn.tech/v1alpha1
/// kind: VClusterOrchestratorV2
/// metadata:
///   name: media
///   namespace: platform-requests
/// spec:
///   targetNamespace: vcluster-media
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "VClusterOrchestratorV2",
    root = "ManagedCluster",
    group = "platform.integratn.tech",
    version = "v1alpha1",
    plural = "vclusterorchestratorv2s",
    namespaced,
    status = "ManagedClusterStatus",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClusterSpec {
    /// Namespace where the cluster's workloads run
    /// Defaults to the resource's own namespace when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
}

impl ManagedCluster {
    /// Namespace where this cluster's workloads run
    pub fn target_namespace(&self) -> String {
        self.spec
            .target_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .map_or_else(|| self.namespace().unwrap_or_default(), str::to_string)
    }

    /// Phase string currently persisted in status, if any
    pub fn stored_phase(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.phase.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(target: Option<&str>) -> ManagedCluster {
        let mut mc = ManagedCluster::new(
            "media",
            ManagedClusterSpec {
                target_namespace: target.map(str::to_string),
            },
        );
        mc.metadata.namespace = Some("platform-requests".to_string());
        mc
    }

    #[test]
    fn test_target_namespace_from_spec() {
        assert_eq!(cluster(Some("vcluster-media")).target_namespace(), "vcluster-media");
    }

    #[test]
    fn test_target_namespace_falls_back_to_resource_namespace() {
        assert_eq!(cluster(None).target_namespace(), "platform-requests");
        assert_eq!(cluster(Some("")).target_namespace(), "platform-requests");
    }

    #[test]
    fn test_deserialize_ignores_pipeline_owned_spec_fields() {
        let mc: ManagedCluster = serde_json::from_value(serde_json::json!({
            "apiVersion": "platform.integratn.tech/v1alpha1",
            "kind": "VClusterOrchestratorV2",
            "metadata": { "name": "media", "namespace": "platform-requests" },
            "spec": { "targetNamespace": "vc-media-ns", "k8sVersion": "1.30", "replicas": 3 },
            "status": { "phase": "Deleting", "endpoints": { "api": "https://media.example.com" } }
        }))
        .unwrap();
        assert_eq!(mc.target_namespace(), "vc-media-ns");
        assert_eq!(mc.stored_phase(), Some("Deleting"));
        assert_eq!(
            mc.status.unwrap().endpoints.unwrap().api.as_deref(),
            Some("https://media.example.com")
        );
    }
}
