//! # Reconcile
//!
//! One cycle: list ManagedClusters, reconcile each (probes, phase, conditions,
//! metrics, status write) with bounded concurrency, then classify dependent
//! records once every cluster has finished.

use super::conditions::build_conditions;
use super::dependents::{reconcile_dependents, DependentKind};
use super::phase::{compute_phase, phase_message, Phase};
use super::probes::gather_snapshot;
use super::status::write_status;
use super::types::{ReconcileOutcome, Reconciler, ReconcilerError};
use crate::crd::ManagedCluster;
use crate::observability::metrics::{cluster_metrics, controller_metrics};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use kube::ResourceExt;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Summary of one reconcile cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// ManagedClusters processed; `None` when listing failed and the cycle was skipped
    pub clusters: Option<usize>,
    /// Clusters that hit at least one probe or write error
    pub clusters_with_errors: usize,
    pub workloads: usize,
    pub addons: usize,
}

/// Creation time of a cluster, read through its RFC3339 wire form
fn creation_time(cluster: &ManagedCluster) -> Option<DateTime<Utc>> {
    let raw = serde_json::to_value(cluster.metadata.creation_timestamp.as_ref()?).ok()?;
    DateTime::parse_from_rfc3339(raw.as_str()?)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Age of a cluster at `now`; zero when the creation timestamp is missing
pub fn cluster_age(cluster: &ManagedCluster, now: DateTime<Utc>) -> chrono::Duration {
    creation_time(cluster).map_or_else(chrono::Duration::zero, |created| now - created)
}

/// Parse the stored phase, ignoring values outside the seven known phases
fn stored_phase(cluster: &ManagedCluster) -> Option<Phase> {
    let raw = cluster.stored_phase()?;
    match raw.parse() {
        Ok(phase) => Some(phase),
        Err(e) => {
            debug!(stored = raw, error = %e, "Ignoring unrecognized stored phase");
            None
        }
    }
}

/// Reconcile a single ManagedCluster.
///
/// Probe and write failures never abort; they are logged and counted against
/// the cluster. Returns the outcome and whether any error occurred.
pub async fn reconcile_cluster(
    reconciler: &Reconciler,
    cluster: &ManagedCluster,
    now: DateTime<Utc>,
) -> (ReconcileOutcome, bool) {
    let start = Instant::now();
    let name = cluster.name_any();
    let namespace = cluster.namespace().unwrap_or_default();
    let api = reconciler.api.as_ref();

    let report = gather_snapshot(
        api,
        &reconciler.config.argocd_namespace,
        &name,
        &cluster.target_namespace(),
    )
    .await;
    let mut failed = !report.errors.is_empty();
    for _ in &report.errors {
        controller_metrics::increment_errors(&name);
    }

    let snapshot = report.snapshot;
    let phase = compute_phase(&snapshot, cluster_age(cluster, now), stored_phase(cluster));
    let mut outcome = ReconcileOutcome {
        phase,
        message: phase_message(phase, &name),
        conditions: build_conditions(&snapshot, phase, &name, now),
        snapshot,
    };

    // The write may switch the outcome to Deleting, so metrics follow it
    let written = write_status(api, cluster, &mut outcome, now).await;
    cluster_metrics::record_cluster_status(&name, &namespace, outcome.phase, &outcome.snapshot);

    match written {
        Ok(()) => info!(
            phase = outcome.phase.as_str(),
            workloads_ready = outcome.snapshot.workloads_ready,
            workloads_total = outcome.snapshot.workloads_total,
            "Reconciled vcluster status"
        ),
        Err(e) => {
            failed = true;
            controller_metrics::increment_errors(&name);
            error!(error = %e, "Failed to write vcluster status");
        }
    }

    controller_metrics::observe_reconcile_duration(&name, start.elapsed().as_secs_f64());
    (outcome, failed)
}

/// Run one full cycle.
///
/// If ManagedClusters cannot be listed the cycle is skipped, including the
/// dependent pass. The cycle counter is incremented either way.
pub async fn run_cycle(reconciler: &Reconciler) -> CycleSummary {
    let start = Instant::now();
    let summary = run_passes(reconciler)
        .instrument(info_span!("reconcile.cycle"))
        .await;

    controller_metrics::increment_reconciles_total();
    controller_metrics::observe_cycle_duration(start.elapsed().as_secs_f64());
    summary
}

async fn run_passes(reconciler: &Reconciler) -> CycleSummary {
    let api = reconciler.api.as_ref();
    let clusters = match api.list_clusters().await {
        Ok(clusters) => clusters,
        Err(e) => {
            controller_metrics::increment_listing_errors("clusters");
            let e = ReconcilerError::list("clusters", e);
            warn!(error = %e, "Skipping cycle");
            return CycleSummary::default();
        }
    };

    let now = Utc::now();
    let limit = reconciler.config.max_concurrent_reconciles.max(1);
    let futures: Vec<_> = clusters
        .iter()
        .map(|cluster| {
            let span = info_span!(
                "reconcile.resource",
                resource.name = %cluster.name_any(),
                resource.namespace = %cluster.namespace().unwrap_or_default(),
            );
            reconcile_cluster(reconciler, cluster, now).instrument(span)
        })
        .collect();
    let results: Vec<(ReconcileOutcome, bool)> = stream::iter(futures)
        .buffer_unordered(limit)
        .collect()
        .await;

    let mut summary = CycleSummary {
        clusters: Some(clusters.len()),
        clusters_with_errors: results.iter().filter(|(_, failed)| *failed).count(),
        ..Default::default()
    };

    // Every cluster has finished; the name set is complete
    let known: HashSet<String> = clusters.iter().map(ResourceExt::name_any).collect();
    match reconcile_dependents(api, &reconciler.config.argocd_namespace, &known).await {
        Ok(records) => {
            summary.workloads = records
                .iter()
                .filter(|r| r.kind == DependentKind::Workload)
                .count();
            summary.addons = records.len() - summary.workloads;
        }
        Err(e) => warn!(error = %e, "Skipping dependent records this cycle"),
    }

    info!(
        clusters = clusters.len(),
        clusters_with_errors = summary.clusters_with_errors,
        workloads = summary.workloads,
        addons = summary.addons,
        "Reconcile cycle complete"
    );
    summary
}
