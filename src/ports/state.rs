//! # Durable state owned by the subsystem: registrations and notification records.
//!
//! All cross-invocation state lives behind these ports, never in process
//! memory — dispatcher instances scale horizontally and restart freely.
//!
//! [`NotificationStore::insert_if_absent`] is the idempotency boundary for
//! reminder delivery: identity (`task_id`, `fire_at`) is the dedup key, and
//! the insert must be atomic against concurrent duplicate deliveries.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::notifications::{DeliveryStatus, NotificationRecord};
use crate::reminders::ReminderRegistration;

/// Outcome of an atomic conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No record existed for the dedup key; the record was inserted.
    Inserted,
    /// A `recorded` record already exists for the key; nothing was written.
    Duplicate,
}

/// Durable store for reminder registrations.
///
/// At most one registration exists per task: re-registration replaces the
/// prior entry, and the firing path removes the entry it fired for.
#[async_trait]
pub trait RegistrationStore: Send + Sync + 'static {
    /// Inserts or replaces the registration for `registration.task_id`.
    async fn put(&self, registration: ReminderRegistration) -> Result<(), StoreError>;

    /// Loads a registration by its id.
    async fn get(&self, registration_id: &str)
        -> Result<Option<ReminderRegistration>, StoreError>;

    /// Loads the registration for a task, if any.
    async fn by_task(&self, task_id: i64) -> Result<Option<ReminderRegistration>, StoreError>;

    /// Removes a registration by its id. Removing an unknown id is a no-op.
    async fn remove(&self, registration_id: &str) -> Result<(), StoreError>;
}

/// Durable store for notification delivery records.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Atomically inserts `record` unless a `recorded` entry already exists
    /// for `(record.task_id, record.fire_at)`.
    async fn insert_if_absent(
        &self,
        record: NotificationRecord,
    ) -> Result<InsertOutcome, StoreError>;

    /// Returns all records for an owner, optionally filtered by status,
    /// newest first.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<NotificationRecord>, StoreError>;
}
