//! # Health Probes
//!
//! Four independent, read-only queries per ManagedCluster:
//!
//! - **deployment**: sync/health of the parent `vcluster-<name>` Application
//! - **workloads**: ready/total non-terminal Pods in the target namespace
//! - **sub-apps**: aggregate health of the cluster's child Applications
//! - **credential**: existence of the `vc-<name>` kubeconfig Secret
//!
//! Probes fail soft. A failing probe contributes its worst-case value to the
//! snapshot and its error is handed back to the caller for counting; it never
//! aborts the reconcile of the cluster.

use super::api::{AppRecord, PlatformApi};
use super::health::{AppHealth, HealthSnapshot, SyncStatus};
use super::types::{Probe, ReconcilerError};
use crate::constants::{credential_secret_name, deployment_app_name, ARGOCD_INSTANCE_LABEL};
use crate::crd::SubAppHealth;
use tracing::{debug, warn};

/// Snapshot plus the errors of any probe that failed while building it
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub snapshot: HealthSnapshot,
    pub errors: Vec<ReconcilerError>,
}

/// Run all four probes for a cluster concurrently and fold them into a snapshot.
pub async fn gather_snapshot(
    api: &dyn PlatformApi,
    argocd_namespace: &str,
    cluster_name: &str,
    target_namespace: &str,
) -> ProbeReport {
    let (deployment, workloads, sub_apps, credential) = tokio::join!(
        probe_deployment(api, argocd_namespace, cluster_name),
        probe_workloads(api, target_namespace),
        probe_sub_apps(api, argocd_namespace, cluster_name),
        probe_credential(api, target_namespace, cluster_name),
    );

    let mut errors = Vec::new();
    let mut degrade = |probe: Probe, err: ReconcilerError| {
        warn!(
            resource.name = cluster_name,
            probe = probe.as_str(),
            error = %err,
            "Health probe failed, using worst-case value"
        );
        errors.push(ReconcilerError::probe(probe, cluster_name, err));
    };

    let (deployment_sync, deployment_health) = deployment.unwrap_or_else(|e| {
        degrade(Probe::Deployment, e);
        (SyncStatus::Unknown, AppHealth::Missing)
    });
    let (workloads_ready, workloads_total) = workloads.unwrap_or_else(|e| {
        degrade(Probe::Workloads, e);
        (0, 0)
    });
    let sub_apps = match sub_apps {
        Ok(SubAppProbe { health, labelled_error }) => {
            if let Some(e) = labelled_error {
                degrade(Probe::SubApps, e);
            }
            health
        }
        Err(e) => {
            degrade(Probe::SubApps, e);
            SubAppHealth::default()
        }
    };
    let credential_exists = credential.unwrap_or_else(|e| {
        degrade(Probe::Credential, e);
        false
    });

    ProbeReport {
        snapshot: HealthSnapshot {
            deployment_sync,
            deployment_health,
            workloads_ready,
            workloads_total,
            sub_apps_healthy: sub_apps.healthy,
            sub_apps_total: sub_apps.total,
            sub_apps_unhealthy: sub_apps.unhealthy,
            credential_exists,
        },
        errors,
    }
}

/// Sync and health of the parent Application; `(Unknown, Missing)` when it does not exist
pub async fn probe_deployment(
    api: &dyn PlatformApi,
    argocd_namespace: &str,
    cluster_name: &str,
) -> Result<(SyncStatus, AppHealth), ReconcilerError> {
    let app_name = deployment_app_name(cluster_name);
    match api.get_application(argocd_namespace, &app_name).await? {
        Some(app) => Ok((app.sync, app.health)),
        None => {
            debug!(application = %app_name, "Deployment record not found");
            Ok((SyncStatus::Unknown, AppHealth::Missing))
        }
    }
}

/// Ready and total non-terminal workload instances in the namespace
pub async fn probe_workloads(
    api: &dyn PlatformApi,
    namespace: &str,
) -> Result<(u32, u32), ReconcilerError> {
    let instances = api.list_workloads(namespace).await?;
    let (ready, total) = instances
        .iter()
        .filter(|instance| !instance.is_terminal())
        .fold((0u32, 0u32), |(ready, total), instance| {
            (ready + u32::from(instance.ready), total + 1)
        });
    Ok((ready, total))
}

/// Sub-app aggregate, plus the error of a failed labelled query that was
/// answered by the destination fallback instead
#[derive(Debug, Default)]
pub struct SubAppProbe {
    pub health: SubAppHealth,
    pub labelled_error: Option<ReconcilerError>,
}

/// Aggregate health of the cluster's child Applications.
///
/// Children are found by the ArgoCD instance label first. When that yields
/// nothing or fails, Applications whose destination server host names the
/// cluster are used instead (see [`destination_matches_cluster`]).
pub async fn probe_sub_apps(
    api: &dyn PlatformApi,
    argocd_namespace: &str,
    cluster_name: &str,
) -> Result<SubAppProbe, ReconcilerError> {
    let parent = deployment_app_name(cluster_name);
    let selector = format!("{ARGOCD_INSTANCE_LABEL}={parent}");

    let (labelled, labelled_error) =
        match api.list_applications(argocd_namespace, Some(&selector)).await {
            Ok(apps) => (apps, None),
            Err(e) => {
                warn!(
                    resource.name = cluster_name,
                    error = %e,
                    "Labelled sub-app query failed, falling back to destination match"
                );
                (Vec::new(), Some(e))
            }
        };

    let children: Vec<AppRecord> = if labelled.is_empty() {
        api.list_applications(argocd_namespace, None)
            .await?
            .into_iter()
            .filter(|app| {
                app.destination_server
                    .as_deref()
                    .is_some_and(|server| destination_matches_cluster(server, cluster_name))
            })
            .collect()
    } else {
        labelled
    };

    Ok(SubAppProbe {
        health: aggregate_app_health(children.iter().filter(|app| app.name != parent)),
        labelled_error,
    })
}

/// Whether the credential Secret exists in the target namespace
pub async fn probe_credential(
    api: &dyn PlatformApi,
    namespace: &str,
    cluster_name: &str,
) -> Result<bool, ReconcilerError> {
    api.secret_exists(namespace, &credential_secret_name(cluster_name))
        .await
}

/// Count Healthy applications and collect the names of the rest
pub fn aggregate_app_health<'a>(apps: impl IntoIterator<Item = &'a AppRecord>) -> SubAppHealth {
    apps.into_iter().fold(SubAppHealth::default(), |mut acc, app| {
        acc.total += 1;
        if app.health == AppHealth::Healthy {
            acc.healthy += 1;
        } else {
            acc.unhealthy.push(app.name.clone());
        }
        acc
    })
}

/// Whether an Application destination server belongs to the named cluster.
///
/// The server URL is reduced to its host, and the host's first DNS label must be
/// exactly `<name>` or `vcluster-<name>` (case insensitive). This covers external
/// `https://<name>.<domain>` and in-cluster `https://vcluster-<name>.<ns>.svc`
/// servers without matching clusters whose names merely share a suffix.
pub fn destination_matches_cluster(server: &str, cluster_name: &str) -> bool {
    if cluster_name.is_empty() {
        return false;
    }
    let parent = deployment_app_name(cluster_name);
    server_host(server)
        .and_then(|host| host.split('.').next())
        .is_some_and(|label| {
            label.eq_ignore_ascii_case(cluster_name) || label.eq_ignore_ascii_case(&parent)
        })
}

fn server_host(server: &str) -> Option<&str> {
    let rest = server.split_once("://").map_or(server, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host_port.split(':').next()?;
    (!host.is_empty()).then_some(host)
}
