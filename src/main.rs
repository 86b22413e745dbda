//! # Platform Status Reconciler
//!
//! A control loop that derives the lifecycle phase of every managed vCluster.
//!
//! ## Overview
//!
//! Once per interval the reconciler:
//!
//! 1. **Lists ManagedClusters** - `VClusterOrchestratorV2` resources
//! 2. **Probes health** - ArgoCD sync/health, pod readiness, sub-app health and kubeconfig secret presence
//! 3. **Computes a phase** - one of Scheduled, Progressing, Ready, Degraded, Failed, Deleting, Unknown, plus four conditions
//! 4. **Writes status** - merge patch that preserves pipeline-owned `endpoints` and `credentials`
//! 5. **Classifies dependents** - platform-managed ArgoCD apps reported as workloads or addons
//!
//! Everything is mirrored as Prometheus metrics on `/metrics`; `/healthz` and
//! `/readyz` serve liveness and readiness probes.

use anyhow::Result;
use platform_status_reconciler::runtime::{initialize, run_scheduler};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_scheduler(&init_result.reconciler, init_result.shutdown.clone()).await;

    // The listener closes on the same signal
    if let Err(e) = init_result.server_handle.await {
        warn!(error = %e, "HTTP server task ended abnormally");
    }

    info!("Shutdown complete");
    Ok(())
}
