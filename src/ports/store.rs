//! # Task-store port: the external CRUD store's boundary.
//!
//! This subsystem reads task snapshots and performs exactly two writes
//! against the external store: creating the next occurrence of a recurring
//! task, and clearing a recurrence pattern. Everything else about the store
//! (schema, HTTP API, auth) is out of scope.
//!
//! ## Atomicity requirement
//! [`TaskStore::create_occurrence`] must be an atomic insert-if-absent keyed
//! on the parent-occurrence link. A read-then-write pair is not acceptable:
//! duplicate `completed` deliveries race, and the dedup boundary is storage
//! identity, not a lock.

use async_trait::async_trait;

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::events::TaskSnapshot;

/// Fields for a new recurring occurrence.
///
/// Built by the recurring engine from the completed task's snapshot: title,
/// owner, tags, pattern and offset are carried forward; the due timestamp is
/// the computed next occurrence; `parent_occurrence` links back to the
/// just-completed task and is the idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOccurrence {
    /// Owning user identifier.
    pub owner_id: String,
    /// Title carried forward from the completed occurrence.
    pub title: String,
    /// Tags carried forward.
    pub tags: Vec<String>,
    /// Due timestamp of the new occurrence.
    pub due_at: DateTime<Utc>,
    /// Recurrence pattern carried forward.
    pub recurrence: String,
    /// Reminder offset carried forward, if any.
    pub reminder_offset_seconds: Option<i64>,
    /// Id of the completed task that spawned this occurrence (dedup key).
    pub parent_occurrence: i64,
}

/// Outcome of an atomic occurrence insert.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// No occurrence with this parent link existed; one was created.
    Created(TaskSnapshot),
    /// An occurrence with this parent link already exists (duplicate delivery).
    AlreadyExists(TaskSnapshot),
}

/// Read/write boundary to the external task store.
#[async_trait]
pub trait TaskStore: Send + Sync + 'static {
    /// Loads the current state of a task, or `None` if it no longer exists.
    async fn get_task(&self, id: i64) -> Result<Option<TaskSnapshot>, StoreError>;

    /// Atomically creates the next occurrence unless one with the same
    /// parent-occurrence link already exists.
    async fn create_occurrence(&self, fields: NewOccurrence) -> Result<CreateOutcome, StoreError>;

    /// Sets or clears a task's recurrence pattern.
    ///
    /// Clearing (`None`) stops future occurrences from being spawned once the
    /// task completes; it does not touch already-created occurrences.
    async fn update_recurrence(&self, id: i64, pattern: Option<String>) -> Result<(), StoreError>;

    /// Returns completed tasks that still carry a recurrence pattern and a
    /// due timestamp but have no successor occurrence linked to them.
    ///
    /// This is the reconciliation sweep's detection query for occurrences
    /// lost to handler failures.
    async fn completed_without_successor(&self) -> Result<Vec<TaskSnapshot>, StoreError>;
}
