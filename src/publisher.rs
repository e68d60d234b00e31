//! # Event publisher: best-effort envelope push.
//!
//! [`Publisher`] wraps task mutations: it builds an [`Envelope`] from a task
//! snapshot and pushes it to the broker topic for the event type.
//!
//! ## Rules
//! - **Never blocks the mutation**: the push is bounded by
//!   [`Config::publish_timeout`]; failure and timeout are logged and reported
//!   as [`PublishOutcome::Dropped`], never returned as an error. The mutation
//!   is already durable in the task store — messaging failure must not roll
//!   it back or block it.
//! - **Snapshots, not references**: callers pass an owned [`TaskSnapshot`]
//!   copied at mutation time, so concurrent task edits cannot race the
//!   envelope contents.
//! - **Best-effort delivery**: downstream consumers tolerate gaps; the
//!   reconciliation sweep covers the one case where a gap loses real work.

use std::sync::Arc;

use tokio::time;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::PublishError;
use crate::events::{Envelope, EventType, TaskSnapshot};
use crate::ports::Broker;

/// Result of a publish attempt, as seen by the mutation path.
///
/// Either way the caller proceeds; `Dropped` exists so tests and metrics can
/// observe gap behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The broker accepted the envelope.
    Delivered,
    /// The push failed or timed out; the envelope was logged and dropped.
    Dropped,
}

/// Builds envelopes and pushes them to the broker, absorbing all failures.
#[derive(Clone)]
pub struct Publisher {
    broker: Arc<dyn Broker>,
    cfg: Config,
}

impl Publisher {
    /// Creates a publisher over the given broker.
    pub fn new(broker: Arc<dyn Broker>, cfg: Config) -> Self {
        Self { broker, cfg }
    }

    /// Publishes a lifecycle event for `task`.
    ///
    /// Builds the envelope (fresh event id, current timestamp), resolves the
    /// topic from the event type, and pushes with a timeout.
    pub async fn publish(
        &self,
        event_type: EventType,
        task: TaskSnapshot,
        owner_id: impl Into<String>,
    ) -> PublishOutcome {
        self.publish_envelope(Envelope::new(event_type, task, owner_id))
            .await
    }

    /// Publishes a pre-built envelope (used by the reminder firing path to
    /// attach `remind_at`).
    pub async fn publish_envelope(&self, envelope: Envelope) -> PublishOutcome {
        let topic = self.cfg.topic_name(envelope.topic()).to_string();
        let timeout = self.cfg.publish_timeout;

        let pushed = time::timeout(timeout, self.broker.publish(&topic, &envelope)).await;

        match pushed {
            Ok(Ok(())) => {
                debug!(
                    topic = %topic,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    task_id = envelope.task.id,
                    "event published"
                );
                PublishOutcome::Delivered
            }
            Ok(Err(err)) => {
                warn!(
                    topic = %topic,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    error = %err,
                    label = err.as_label(),
                    "publish failed, envelope dropped"
                );
                PublishOutcome::Dropped
            }
            Err(_elapsed) => {
                let err = PublishError::Timeout { timeout };
                warn!(
                    topic = %topic,
                    event_id = %envelope.event_id,
                    event_type = %envelope.event_type,
                    label = err.as_label(),
                    "publish timed out, envelope dropped"
                );
                PublishOutcome::Dropped
            }
        }
    }
}
