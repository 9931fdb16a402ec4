//! Background service running periodic reconciliation

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::reconciler::{EventReconciler, ReconcileOutcome};

/// Handle to a running sync service.
///
/// Stopping (or dropping) the handle ends the loop after the current pass;
/// a pass that is in flight is allowed to finish.
pub struct SyncHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the loop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            error!("Sync service task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Periodic pull-based reconciliation for one user
pub struct SyncService {
    reconciler: Arc<EventReconciler>,
    user_id: String,
    poll_interval: Duration,
}

impl SyncService {
    /// Spawn the background sync loop. The first pass runs immediately.
    pub fn spawn(
        reconciler: Arc<EventReconciler>,
        user_id: impl Into<String>,
        poll_interval: Duration,
    ) -> SyncHandle {
        let service = Self {
            reconciler,
            user_id: user_id.into(),
            poll_interval,
        };
        let (stop_tx, stop_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            service.start(stop_rx).await;
        });
        SyncHandle { stop_tx, join }
    }

    async fn start(&self, mut stop_rx: watch::Receiver<bool>) {
        info!(
            "Starting sync service for {} with interval {:?}",
            self.user_id, self.poll_interval
        );

        let mut interval = interval(self.poll_interval);
        // A slow pass must not be followed by a burst of catch-up passes
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Err means the handle was dropped
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => self.run_once().await,
            }
        }

        info!("Sync service for {} stopped", self.user_id);
    }

    async fn run_once(&self) {
        match self.reconciler.reconcile(&self.user_id).await {
            Ok(ReconcileOutcome::Completed(report)) => {
                debug!(
                    pulled = report.pulled,
                    updated = report.updated,
                    orphaned = report.orphaned,
                    "Sync pass complete"
                );
            }
            Ok(ReconcileOutcome::Skipped) => debug!("Previous sync pass still running"),
            Ok(ReconcileOutcome::NoProvider) => debug!("No task provider configured"),
            Ok(ReconcileOutcome::ProviderUnavailable(e)) => {
                warn!("Task provider unavailable, retrying next tick: {}", e);
            }
            Err(e) => error!("Sync pass failed: {}", e),
        }
    }
}
