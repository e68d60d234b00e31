//! # Recurring task engine: spawns the next occurrence on completion.
//!
//! [`RecurrenceEngine`] consumes `completed` events for tasks carrying a
//! recurrence pattern and a due timestamp, computes the next occurrence from
//! the pattern and the task's **current due timestamp**, creates it through
//! the external task store, and publishes a `created` event for the new task.
//!
//! ## Rules
//! - **Fixed cadence**: the next due is derived from the completed task's
//!   due, never from "now" — late completion or late event delivery does not
//!   shift the schedule.
//! - **Idempotent**: occurrence creation is an atomic insert-if-absent keyed
//!   on the parent-occurrence link; duplicate `completed` deliveries create
//!   exactly one successor.
//! - **Invalid snapshots don't fail the message**: a missing due timestamp or
//!   unparseable pattern is logged and skipped — there is nothing redelivery
//!   could fix.
//!
//! Cancellation is separate: [`RecurrenceEngine::cancel_recurrence`] clears
//! the pattern on the *current* task so no further occurrences spawn once it
//! completes. Already-created future occurrences are untouched.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::dispatch::Handle;
use crate::error::{HandlerError, StoreError};
use crate::events::{Envelope, EventType, TaskSnapshot};
use crate::ports::{CreateOutcome, NewOccurrence, TaskStore};
use crate::publisher::Publisher;
use crate::recurrence::RecurrencePattern;

/// Handler for `completed` events of recurring tasks.
pub struct RecurrenceEngine {
    store: Arc<dyn TaskStore>,
    publisher: Publisher,
}

impl RecurrenceEngine {
    /// Creates an engine over the given task store and publisher.
    pub fn new(store: Arc<dyn TaskStore>, publisher: Publisher) -> Self {
        Self { store, publisher }
    }

    /// Spawns the successor occurrence for a completed recurring task, if one
    /// is due and does not already exist.
    ///
    /// Returns the newly created snapshot, or `None` when the task is not
    /// eligible (no pattern, no due, pattern exhausted) or a successor
    /// already exists. Shared by the event path and the reconciliation sweep.
    pub async fn spawn_next(
        &self,
        completed: &TaskSnapshot,
    ) -> Result<Option<TaskSnapshot>, HandlerError> {
        let Some(pattern_str) = completed.recurrence.as_deref().filter(|p| !p.is_empty()) else {
            debug!(task_id = completed.id, "completed task is not recurring, skipping");
            return Ok(None);
        };

        let Some(due_at) = completed.due_at else {
            warn!(
                task_id = completed.id,
                "recurring task has no due timestamp, skipping (invalid snapshot)"
            );
            return Ok(None);
        };

        let pattern: RecurrencePattern = match pattern_str.parse() {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    task_id = completed.id,
                    pattern = pattern_str,
                    error = %e,
                    "unparseable recurrence pattern, skipping"
                );
                return Ok(None);
            }
        };

        let Some(next_due) = pattern.next_after(due_at) else {
            debug!(
                task_id = completed.id,
                pattern = %pattern,
                "pattern yields no occurrence after current due"
            );
            return Ok(None);
        };

        let fields = NewOccurrence {
            owner_id: completed.owner_id.clone(),
            title: completed.title.clone(),
            tags: completed.tags.clone(),
            due_at: next_due,
            recurrence: pattern_str.to_string(),
            reminder_offset_seconds: completed.reminder_offset_seconds,
            parent_occurrence: completed.id,
        };

        match self.store.create_occurrence(fields).await? {
            CreateOutcome::Created(snapshot) => {
                info!(
                    task_id = completed.id,
                    next_id = snapshot.id,
                    next_due = %next_due,
                    "recurring occurrence created"
                );
                let owner = snapshot.owner_id.clone();
                self.publisher
                    .publish(EventType::Created, snapshot.clone(), owner)
                    .await;
                Ok(Some(snapshot))
            }
            CreateOutcome::AlreadyExists(existing) => {
                debug!(
                    task_id = completed.id,
                    next_id = existing.id,
                    "successor already exists, duplicate completion absorbed"
                );
                Ok(None)
            }
        }
    }

    /// Clears the recurrence pattern on a not-yet-completed task so no
    /// further occurrences are spawned once it eventually completes.
    ///
    /// Does not delete or modify occurrences that already exist.
    pub async fn cancel_recurrence(&self, task_id: i64) -> Result<(), StoreError> {
        self.store.update_recurrence(task_id, None).await?;
        info!(task_id, "recurrence canceled");
        Ok(())
    }
}

#[async_trait]
impl Handle for RecurrenceEngine {
    async fn on_event(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        if envelope.event_type != EventType::Completed {
            return Ok(());
        }
        self.spawn_next(&envelope.task).await.map(|_| ())
    }

    fn name(&self) -> &'static str {
        "recurrence-engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::adapters::memory::{MemoryBroker, MemoryTaskStore};
    use crate::config::Config;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn standup(id: i64) -> TaskSnapshot {
        TaskSnapshot::new(id, "user-1", "Standup")
            .with_due_at(ts("2026-03-02T09:00:00Z"))
            .with_recurrence("weekly")
            .with_reminder_offset_seconds(3600)
            .with_tags(vec!["work".into()])
    }

    fn engine_with(
        store: Arc<MemoryTaskStore>,
    ) -> (RecurrenceEngine, Arc<MemoryBroker>) {
        let broker = Arc::new(MemoryBroker::new());
        let publisher = Publisher::new(broker.clone(), Config::default());
        (RecurrenceEngine::new(store, publisher), broker)
    }

    fn completed_envelope(task: &TaskSnapshot) -> Envelope {
        let mut completed = task.clone();
        completed.completed = true;
        Envelope::new(EventType::Completed, completed, task.owner_id.clone())
    }

    #[tokio::test]
    async fn next_occurrence_keeps_fixed_cadence() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = standup(1);
        store.insert(task.clone());
        let (engine, broker) = engine_with(store.clone());

        // Completed late (Mon 09:15) — the event arrives whenever it arrives.
        engine
            .on_event(&completed_envelope(&task))
            .await
            .unwrap();

        let spawned = store.find_by_parent(1).expect("successor created");
        assert_eq!(spawned.due_at.unwrap(), ts("2026-03-09T09:00:00Z"));
        assert_eq!(spawned.title, "Standup");
        assert_eq!(spawned.tags, vec!["work".to_string()]);
        assert_eq!(spawned.recurrence.as_deref(), Some("weekly"));
        assert_eq!(spawned.reminder_offset_seconds, Some(3600));
        assert_eq!(spawned.parent_occurrence, Some(1));
        assert!(!spawned.completed);

        // The new task's created event went out on task-events.
        let published = broker.take();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.event_type, EventType::Created);
        assert_eq!(published[0].1.task.id, spawned.id);
    }

    #[tokio::test]
    async fn duplicate_completed_delivery_creates_one_successor() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = standup(1);
        store.insert(task.clone());
        let (engine, broker) = engine_with(store.clone());

        let envelope = completed_envelope(&task);
        for _ in 0..4 {
            engine.on_event(&envelope).await.unwrap();
        }

        assert_eq!(store.children_of(1).len(), 1);
        // Only the first delivery published a created event.
        assert_eq!(broker.take().len(), 1);
    }

    #[tokio::test]
    async fn non_recurring_completion_is_ignored() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = TaskSnapshot::new(1, "u", "one-shot").with_due_at(ts("2026-03-02T09:00:00Z"));
        store.insert(task.clone());
        let (engine, broker) = engine_with(store.clone());

        engine.on_event(&completed_envelope(&task)).await.unwrap();
        assert!(store.find_by_parent(1).is_none());
        assert!(broker.take().is_empty());
    }

    #[tokio::test]
    async fn recurring_without_due_is_skipped_not_failed() {
        let store = Arc::new(MemoryTaskStore::new());
        let mut task = TaskSnapshot::new(1, "u", "broken").with_recurrence("daily");
        task.completed = true;
        let (engine, _broker) = engine_with(store.clone());

        let result = engine
            .on_event(&Envelope::new(EventType::Completed, task, "u"))
            .await;
        assert!(result.is_ok());
        assert!(store.find_by_parent(1).is_none());
    }

    #[tokio::test]
    async fn other_event_types_are_no_ops() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = standup(1);
        store.insert(task.clone());
        let (engine, _broker) = engine_with(store.clone());

        engine
            .on_event(&Envelope::new(EventType::Updated, task, "user-1"))
            .await
            .unwrap();
        assert!(store.find_by_parent(1).is_none());
    }

    #[tokio::test]
    async fn canceling_recurrence_stops_future_occurrences_only() {
        let store = Arc::new(MemoryTaskStore::new());
        let task = standup(1);
        store.insert(task.clone());
        let (engine, _broker) = engine_with(store.clone());

        // Occurrence K completes; K+1 is created.
        engine.on_event(&completed_envelope(&task)).await.unwrap();
        let second = store.find_by_parent(1).unwrap();

        // Cancel recurrence on the current (not-yet-completed) occurrence.
        engine.cancel_recurrence(second.id).await.unwrap();

        // Occurrence K is untouched, K+1 still exists.
        assert!(store.get_sync(1).is_some());
        let second_now = store.get_sync(second.id).unwrap();
        assert!(second_now.recurrence.is_none());

        // When K+1 eventually completes, no K+2 is spawned.
        engine
            .on_event(&completed_envelope(&second_now))
            .await
            .unwrap();
        assert!(store.find_by_parent(second.id).is_none());
    }
}
