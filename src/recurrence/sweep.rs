//! # Reconciliation sweep for missed occurrences.
//!
//! Handler failures inside the recurring engine (e.g. the task-store write
//! failing after the `completed` event was already acknowledged) silently
//! lose an occurrence — the dispatcher never asks the broker to redeliver.
//! [`ReconcileSweep`] is the out-of-band recovery: it periodically asks the
//! task store for completed recurring tasks that have no successor and
//! replays occurrence creation through the engine's idempotent path.
//!
//! ## Rules
//! - A sweep racing a late redelivery of the same `completed` event is safe:
//!   both go through the same atomic insert-if-absent.
//! - The sweep holds no state between passes; each pass re-queries the store.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::ports::TaskStore;
use crate::recurrence::RecurrenceEngine;

/// Periodic missed-occurrence recovery.
pub struct ReconcileSweep {
    store: Arc<dyn TaskStore>,
    engine: Arc<RecurrenceEngine>,
    cfg: Config,
}

impl ReconcileSweep {
    /// Creates a sweep over the given store and engine.
    pub fn new(store: Arc<dyn TaskStore>, engine: Arc<RecurrenceEngine>, cfg: Config) -> Self {
        Self { store, engine, cfg }
    }

    /// Runs a single reconciliation pass; returns how many occurrences were
    /// recovered.
    pub async fn run_once(&self) -> Result<usize, StoreError> {
        let orphaned = self.store.completed_without_successor().await?;
        if orphaned.is_empty() {
            debug!("reconcile sweep: nothing to recover");
            return Ok(0);
        }

        let mut recovered = 0;
        for task in &orphaned {
            match self.engine.spawn_next(task).await {
                Ok(Some(_)) => recovered += 1,
                Ok(None) => {}
                Err(e) => {
                    // Leave it for the next pass.
                    warn!(
                        task_id = task.id,
                        error = %e,
                        "reconcile sweep failed to recover occurrence"
                    );
                }
            }
        }

        info!(
            candidates = orphaned.len(),
            recovered, "reconcile sweep pass finished"
        );
        Ok(recovered)
    }

    /// Runs the sweep on [`Config::sweep_interval`] until `token` cancels.
    ///
    /// Store errors are logged and the loop keeps going; the next tick
    /// retries from scratch.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.cfg.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, label = e.as_label(), "reconcile sweep pass failed");
                    }
                }
            }
        }
    }
}
