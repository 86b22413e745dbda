//! # Scheduler
//!
//! Drives reconcile cycles on a fixed interval. Cycles never overlap: the next
//! tick is only awaited once the current cycle has returned.

use super::shutdown::Shutdown;
use crate::controller::reconciler::{run_cycle, Reconciler};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Run cycles until shutdown is triggered.
///
/// The first cycle starts immediately. A cycle still running when shutdown
/// arrives is abandoned.
pub async fn run_scheduler(reconciler: &Reconciler, shutdown: Shutdown) {
    let period = reconciler.config.reconcile_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?period, "Starting reconcile loop");

    let stop = shutdown.wait();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            () = &mut stop => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            () = &mut stop => {
                info!("Abandoning in-flight reconcile cycle");
                break;
            }
            _ = run_cycle(reconciler) => {}
        }
    }

    info!("Reconcile loop stopped");
}
