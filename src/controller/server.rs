//! # HTTP Server
//!
//! Metrics scrape and liveness/readiness endpoints.
//!
//! - `GET /metrics`: Prometheus text exposition of the global registry
//! - `GET /healthz`, `GET /readyz`: `200 ok` while the process is alive

use crate::observability::metrics::gather_text;
use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared server state
#[derive(Debug, Clone, Default)]
pub struct ServerState {
    /// Set once the listener is bound
    pub is_ready: Arc<AtomicBool>,
}

impl ServerState {
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::Relaxed)
    }
}

async fn metrics_handler() -> Response {
    match gather_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn ok_handler() -> &'static str {
    "ok"
}

pub fn router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(ok_handler))
        .route("/readyz", get(ok_handler))
        .layer(TraceLayer::new_for_http())
}

/// Bind `0.0.0.0:<port>` and serve until `shutdown` resolves.
///
/// `state.is_ready` is set as soon as the listener is bound.
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn start_server<F>(port: u16, state: ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server to {addr}"))?;

    state.is_ready.store(true, Ordering::Relaxed);
    info!(%addr, "HTTP server listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get_path(path: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        assert_eq!(get_path("/healthz").await, (StatusCode::OK, "ok".to_string()));
        assert_eq!(get_path("/readyz").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        crate::observability::metrics::register_metrics().unwrap();
        crate::observability::metrics::controller_metrics::increment_reconciles_total();

        let (status, body) = get_path("/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("platform_status_reconciler_reconciles_total"));
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (status, _) = get_path("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_start_server_sets_ready_and_stops() {
        let state = ServerState::default();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(start_server(0, state.clone(), async {
            let _ = rx.await;
        }));

        for _ in 0..100 {
            if state.is_ready() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(state.is_ready());

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
