//! # Scheduled-callback port: durable fire-once timers.
//!
//! Reminders must survive process restarts, so there is no in-process timer
//! heap. Registration hands `(registration_id, fire_at)` to an external
//! capability; when the time arrives, the deployment invokes
//! [`ReminderScheduler::fire`](crate::ReminderScheduler::fire) with the same
//! registration id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CallbackError;

/// Durable fire-once-at-time-T capability.
///
/// Keyed by registration id so that a registration can be canceled when the
/// task's due time or offset changes, or when the task is deleted.
#[async_trait]
pub trait CallbackScheduler: Send + Sync + 'static {
    /// Schedules a durable callback for `fire_at`, keyed by `registration_id`.
    async fn schedule(
        &self,
        registration_id: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<(), CallbackError>;

    /// Cancels the callback with the given registration id.
    ///
    /// Canceling an unknown id is a no-op — the firing path tolerates stale
    /// callbacks anyway.
    async fn cancel(&self, registration_id: &str) -> Result<(), CallbackError>;
}
