//! # Initialization
//!
//! Process startup: rustls provider, tracing, metrics, HTTP server, Kubernetes
//! client and reconciler context.

use super::shutdown::{listen_for_signals, Shutdown};
use crate::config::{load_config, ServerConfig};
use crate::controller::reconciler::{KubePlatformApi, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use anyhow::{anyhow, Context, Result};
use kube::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Everything the scheduler needs once startup has finished
#[derive(Debug)]
pub struct InitializationResult {
    /// Reconciler context
    pub reconciler: Reconciler,
    /// Server state for health checks
    pub server_state: ServerState,
    /// Triggered by SIGINT/SIGTERM
    pub shutdown: Shutdown,
    /// HTTP server task; finishes after shutdown is triggered
    pub server_handle: JoinHandle<()>,
}

/// Initialize the reconciler runtime
///
/// In order:
/// - rustls crypto provider setup
/// - tracing subscriber setup
/// - metrics registration
/// - HTTP server startup, waiting until the listener is bound
/// - Kubernetes client creation
/// - reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before any TLS connection is made
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_existing| anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_missing| "platform_status_reconciler=info".into()),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting platform status reconciler"
    );

    let (reconciler_config, server_config) = load_config();

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let (trigger, shutdown) = Shutdown::channel();
    listen_for_signals(trigger);

    let server_state = ServerState::default();
    let server_handle = {
        let state = server_state.clone();
        let port = server_config.metrics_port;
        let stop = shutdown.clone().wait();
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state, stop).await {
                error!(error = %e, "HTTP server error");
            }
        })
    };

    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    info!(
        reconcile_interval = ?reconciler_config.reconcile_interval,
        argocd_namespace = %reconciler_config.argocd_namespace,
        cluster_namespace = reconciler_config.cluster_namespace.as_deref().unwrap_or("<all>"),
        max_concurrent_reconciles = reconciler_config.max_concurrent_reconciles,
        metrics_port = server_config.metrics_port,
        "Configuration loaded"
    );

    let api = Arc::new(KubePlatformApi::new(
        client,
        reconciler_config.cluster_namespace.clone(),
    ));
    let reconciler = Reconciler::new(api, reconciler_config);

    Ok(InitializationResult {
        reconciler,
        server_state,
        shutdown,
        server_handle,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &JoinHandle<()>,
    config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow!("HTTP server failed to start"));
        }

        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
