//! # Platform API
//!
//! The single seam between the reconciler and the Kubernetes API server.
//!
//! [`PlatformApi`] covers every read the probes need plus the one status write.
//! [`KubePlatformApi`] implements it against a live cluster; tests substitute an
//! in-memory implementation.

use super::health::{AppHealth, SyncStatus};
use super::types::ReconcilerError;
use crate::constants::FIELD_MANAGER;
use crate::crd::ManagedCluster;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::{ApiResource, DynamicObject, ListParams, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::{Api, Client, ResourceExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A continuous-delivery record (ArgoCD Application), reduced to what the reconciler reads
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppRecord {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub sync: SyncStatus,
    pub health: AppHealth,
    /// `spec.destination.server`
    pub destination_server: Option<String>,
    /// `spec.destination.namespace`
    pub destination_namespace: Option<String>,
}

impl AppRecord {
    /// Extract the record from an `argoproj.io/v1alpha1` Application object
    pub fn from_dynamic(obj: &DynamicObject) -> Self {
        let str_at = |path: &[&str]| -> Option<String> {
            path.iter()
                .try_fold(&obj.data, |value, key| value.get(*key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            name: obj.name_any(),
            labels: obj.labels().clone(),
            sync: SyncStatus::from_argocd(&str_at(&["status", "sync", "status"]).unwrap_or_default()),
            health: AppHealth::from_argocd(
                &str_at(&["status", "health", "status"]).unwrap_or_default(),
            ),
            destination_server: str_at(&["spec", "destination", "server"]),
            destination_namespace: str_at(&["spec", "destination", "namespace"]),
        }
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// One workload instance (Pod), reduced to phase and readiness
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkloadInstance {
    pub name: String,
    /// Pod phase (`Pending`, `Running`, `Succeeded`, `Failed`, `Unknown`)
    pub phase: Option<String>,
    /// The `Ready` condition is `True`
    pub ready: bool,
}

impl WorkloadInstance {
    pub fn from_pod(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        let ready = status
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            });

        Self {
            name: pod.name_any(),
            phase: status.and_then(|s| s.phase.clone()),
            ready,
        }
    }

    /// Completed or evicted instances are not counted
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase.as_deref(), Some("Succeeded" | "Failed"))
    }
}

/// Read and write access to the resources the reconciler works with
#[async_trait]
pub trait PlatformApi: Send + Sync + fmt::Debug {
    /// List ManagedClusters in the configured namespace scope
    async fn list_clusters(&self) -> Result<Vec<ManagedCluster>, ReconcilerError>;

    /// Fetch one ManagedCluster
    async fn get_cluster(&self, namespace: &str, name: &str)
        -> Result<ManagedCluster, ReconcilerError>;

    /// Fetch one Application; `Ok(None)` when it does not exist
    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AppRecord>, ReconcilerError>;

    /// List Applications, optionally filtered by a label selector
    async fn list_applications(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<AppRecord>, ReconcilerError>;

    /// List workload instances in a namespace
    async fn list_workloads(&self, namespace: &str)
        -> Result<Vec<WorkloadInstance>, ReconcilerError>;

    /// Whether a Secret exists; its content is never fetched
    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, ReconcilerError>;

    /// Apply a merge patch to a ManagedCluster's status sub-resource
    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        patch: Value,
    ) -> Result<(), ReconcilerError>;
}

/// [`PlatformApi`] backed by a Kubernetes client
#[derive(Clone)]
pub struct KubePlatformApi {
    client: Client,
    cluster_namespace: Option<String>,
    application: ApiResource,
}

impl fmt::Debug for KubePlatformApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubePlatformApi")
            .field("cluster_namespace", &self.cluster_namespace)
            .finish_non_exhaustive()
    }
}

impl KubePlatformApi {
    pub fn new(client: Client, cluster_namespace: Option<String>) -> Self {
        // Application is from argoproj.io/v1alpha1
        let application = ApiResource::from_gvk(&GroupVersionKind::gvk(
            "argoproj.io",
            "v1alpha1",
            "Application",
        ));
        Self {
            client,
            cluster_namespace,
            application,
        }
    }

    fn applications(&self, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &self.application)
    }

    fn clusters(&self, namespace: &str) -> Api<ManagedCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PlatformApi for KubePlatformApi {
    async fn list_clusters(&self) -> Result<Vec<ManagedCluster>, ReconcilerError> {
        let api: Api<ManagedCluster> = match &self.cluster_namespace {
            Some(ns) => self.clusters(ns),
            None => Api::all(self.client.clone()),
        };
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_cluster(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ManagedCluster, ReconcilerError> {
        Ok(self.clusters(namespace).get(name).await?)
    }

    async fn get_application(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<AppRecord>, ReconcilerError> {
        let app = self.applications(namespace).get_opt(name).await?;
        Ok(app.as_ref().map(AppRecord::from_dynamic))
    }

    async fn list_applications(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<AppRecord>, ReconcilerError> {
        let params = match label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        };
        let list = self.applications(namespace).list(&params).await?;
        Ok(list.items.iter().map(AppRecord::from_dynamic).collect())
    }

    async fn list_workloads(
        &self,
        namespace: &str,
    ) -> Result<Vec<WorkloadInstance>, ReconcilerError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods.list(&ListParams::default()).await?;
        Ok(list.items.iter().map(WorkloadInstance::from_pod).collect())
    }

    async fn secret_exists(&self, namespace: &str, name: &str) -> Result<bool, ReconcilerError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_metadata_opt(name).await?.is_some())
    }

    async fn patch_cluster_status(
        &self,
        namespace: &str,
        name: &str,
        patch: Value,
    ) -> Result<(), ReconcilerError> {
        self.clusters(namespace)
            .patch_status(
                name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        Ok(())
    }
}
