//! # Notification recorder: idempotent reminder consumption.
//!
//! [`NotificationRecorder`] consumes `reminder` events and records one
//! delivery attempt per `(task id, scheduled fire time)` — the primary
//! defense against at-least-once redelivery. "Delivery" here is a recorded
//! state transition, not an external send; real channels are out of scope.
//!
//! ## Rules
//! - Dedup keys on the fire time *carried in the event* (`remind_at`), not on
//!   the event id: re-registration after a due-time change produces a new
//!   fire time and legitimately records again, while duplicate delivery of
//!   the same firing never does.
//! - The insert is an atomic conditional insert against durable storage,
//!   safe under arbitrary concurrent delivery.
//!
//! The query surface ([`NotificationRecorder::records_for`]) serves the
//! notification-display collaborator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dispatch::Handle;
use crate::error::{HandlerError, StoreError};
use crate::events::{Envelope, EventType};
use crate::notifications::{DeliveryStatus, NotificationRecord};
use crate::ports::{InsertOutcome, NotificationStore};

/// Handler for `reminder` events with an owner-facing query surface.
pub struct NotificationRecorder {
    store: Arc<dyn NotificationStore>,
}

impl NotificationRecorder {
    /// Creates a recorder over the given notification store.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Returns all records for `owner_id`, optionally filtered by status,
    /// newest first.
    pub async fn records_for(
        &self,
        owner_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        self.store.list_by_owner(owner_id, status).await
    }
}

#[async_trait]
impl Handle for NotificationRecorder {
    async fn on_event(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        if envelope.event_type != EventType::Reminder {
            return Ok(());
        }

        let Some(fire_at) = envelope.remind_at else {
            // Nothing to key dedup on; redelivery cannot fix this.
            warn!(
                event_id = %envelope.event_id,
                task_id = envelope.task.id,
                "reminder event without fire time, dropped"
            );
            return Ok(());
        };

        let record =
            NotificationRecord::recorded(envelope.task.id, envelope.owner_id.clone(), fire_at);

        match self.store.insert_if_absent(record).await? {
            InsertOutcome::Inserted => {
                info!(
                    event_id = %envelope.event_id,
                    task_id = envelope.task.id,
                    fire_at = %fire_at,
                    "notification recorded"
                );
            }
            InsertOutcome::Duplicate => {
                debug!(
                    event_id = %envelope.event_id,
                    task_id = envelope.task.id,
                    fire_at = %fire_at,
                    "duplicate reminder delivery absorbed"
                );
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "notification-recorder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    use crate::adapters::memory::MemoryNotifications;
    use crate::events::TaskSnapshot;

    fn reminder_envelope(task_id: i64, fire_at: DateTime<Utc>) -> Envelope {
        Envelope::new(
            EventType::Reminder,
            TaskSnapshot::new(task_id, "user-1", "Standup"),
            "user-1",
        )
        .with_remind_at(fire_at)
    }

    #[tokio::test]
    async fn duplicate_deliveries_record_once() {
        let store = Arc::new(MemoryNotifications::new());
        let recorder = NotificationRecorder::new(store.clone());
        let fire_at = Utc::now() + Duration::hours(1);

        // The same firing is redelivered several times; each redelivery is a
        // distinct envelope with the same (task, fire time) pair.
        for _ in 0..5 {
            recorder
                .on_event(&reminder_envelope(7, fire_at))
                .await
                .unwrap();
        }

        let records = recorder
            .records_for("user-1", Some(DeliveryStatus::Recorded))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].task_id, 7);
        assert_eq!(records[0].fire_at, fire_at);
    }

    #[tokio::test]
    async fn distinct_fire_times_record_separately() {
        let store = Arc::new(MemoryNotifications::new());
        let recorder = NotificationRecorder::new(store.clone());
        let first = Utc::now() + Duration::hours(1);
        let second = first + Duration::days(7);

        recorder.on_event(&reminder_envelope(7, first)).await.unwrap();
        recorder.on_event(&reminder_envelope(7, second)).await.unwrap();

        let records = recorder.records_for("user-1", None).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn reminder_without_fire_time_is_dropped() {
        let store = Arc::new(MemoryNotifications::new());
        let recorder = NotificationRecorder::new(store.clone());

        let envelope = Envelope::new(
            EventType::Reminder,
            TaskSnapshot::new(7, "user-1", "Standup"),
            "user-1",
        );
        recorder.on_event(&envelope).await.unwrap();

        assert!(recorder.records_for("user-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_filters_by_owner_and_status() {
        let store = Arc::new(MemoryNotifications::new());
        let recorder = NotificationRecorder::new(store.clone());
        let fire_at = Utc::now() + Duration::hours(1);

        recorder.on_event(&reminder_envelope(1, fire_at)).await.unwrap();

        let other = Envelope::new(
            EventType::Reminder,
            TaskSnapshot::new(2, "user-2", "Other"),
            "user-2",
        )
        .with_remind_at(fire_at);
        recorder.on_event(&other).await.unwrap();

        assert_eq!(recorder.records_for("user-1", None).await.unwrap().len(), 1);
        assert_eq!(
            recorder
                .records_for("user-1", Some(DeliveryStatus::Pending))
                .await
                .unwrap()
                .len(),
            0
        );
    }
}
