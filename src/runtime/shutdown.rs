//! # Shutdown
//!
//! SIGINT/SIGTERM handling. A single watch channel fans the signal out to the
//! scheduler and the HTTP server.

use tokio::sync::watch;
use tracing::{info, warn};

/// Receiving side of the shutdown channel
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Create a handle and its trigger
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been triggered or every trigger is gone
    pub async fn wait(mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Spawn a task that triggers shutdown on Ctrl+C or SIGTERM
pub fn listen_for_signals(trigger: watch::Sender<bool>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = trigger.send(true);
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received terminate signal, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_resolves_on_trigger() {
        let (tx, shutdown) = Shutdown::channel();
        assert!(!shutdown.is_triggered());

        let waiter = tokio::spawn(shutdown.clone().wait());
        tx.send(true).unwrap();
        waiter.await.unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_resolves_when_trigger_dropped() {
        let (tx, shutdown) = Shutdown::channel();
        drop(tx);
        shutdown.wait().await;
    }
}
