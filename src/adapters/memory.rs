//! # In-memory reference adapters for all five ports.
//!
//! Backed by plain maps behind mutexes, these implement the port traits for
//! tests, demos and local development. They honor the same contracts the
//! real backends must: `create_occurrence` and `insert_if_absent` are atomic
//! under their lock, `put` replaces a task's prior registration, and the
//! broker can simulate an outage.
//!
//! Production deployments supply their own implementations; nothing in the
//! subsystem is coupled to these types.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{CallbackError, PublishError, StoreError};
use crate::events::{Envelope, TaskSnapshot};
use crate::notifications::{DeliveryStatus, NotificationRecord};
use crate::ports::{
    Broker, CallbackScheduler, CreateOutcome, InsertOutcome, NewOccurrence, NotificationStore,
    RegistrationStore, TaskStore,
};
use crate::reminders::ReminderRegistration;

/// In-memory broker capturing published envelopes per topic.
#[derive(Default)]
pub struct MemoryBroker {
    published: Mutex<Vec<(String, Envelope)>>,
    unavailable: AtomicBool,
}

impl MemoryBroker {
    /// Creates an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles a simulated outage; while set, every publish fails.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    /// Drains and returns everything published so far.
    pub fn take(&self) -> Vec<(String, Envelope)> {
        std::mem::take(&mut self.published.lock().unwrap())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, topic: &str, envelope: &Envelope) -> Result<(), PublishError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PublishError::Transport {
                reason: "simulated outage".to_string(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), envelope.clone()));
        Ok(())
    }
}

/// In-memory task store with atomic parent-link occurrence creation.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<i64, TaskSnapshot>>,
    next_id: AtomicI64,
}

impl MemoryTaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1000),
        }
    }

    /// Inserts or replaces a task (test fixture path).
    pub fn insert(&self, task: TaskSnapshot) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    /// Removes a task (test fixture path).
    pub fn remove(&self, id: i64) {
        self.tasks.lock().unwrap().remove(&id);
    }

    /// Synchronous lookup for assertions.
    pub fn get_sync(&self, id: i64) -> Option<TaskSnapshot> {
        self.tasks.lock().unwrap().get(&id).cloned()
    }

    /// Returns the occurrence spawned by `parent`, if any.
    pub fn find_by_parent(&self, parent: i64) -> Option<TaskSnapshot> {
        self.tasks
            .lock()
            .unwrap()
            .values()
            .find(|t| t.parent_occurrence == Some(parent))
            .cloned()
    }

    /// Returns all occurrences spawned by `parent`.
    pub fn children_of(&self, parent: i64) -> Vec<TaskSnapshot> {
        self.tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.parent_occurrence == Some(parent))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn get_task(&self, id: i64) -> Result<Option<TaskSnapshot>, StoreError> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn create_occurrence(&self, fields: NewOccurrence) -> Result<CreateOutcome, StoreError> {
        // Check-and-insert under one lock: the parent link is the identity.
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(existing) = tasks
            .values()
            .find(|t| t.parent_occurrence == Some(fields.parent_occurrence))
        {
            return Ok(CreateOutcome::AlreadyExists(existing.clone()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let snapshot = TaskSnapshot {
            id,
            owner_id: fields.owner_id,
            title: fields.title,
            completed: false,
            due_at: Some(fields.due_at),
            recurrence: Some(fields.recurrence),
            reminder_offset_seconds: fields.reminder_offset_seconds,
            tags: fields.tags,
            parent_occurrence: Some(fields.parent_occurrence),
        };
        tasks.insert(id, snapshot.clone());
        Ok(CreateOutcome::Created(snapshot))
    }

    async fn update_recurrence(&self, id: i64, pattern: Option<String>) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks.get_mut(&id).ok_or_else(|| StoreError::Conflict {
            reason: format!("task {id} not found"),
        })?;
        task.recurrence = pattern;
        Ok(())
    }

    async fn completed_without_successor(&self) -> Result<Vec<TaskSnapshot>, StoreError> {
        let tasks = self.tasks.lock().unwrap();
        let result = tasks
            .values()
            .filter(|t| t.completed && t.is_recurring() && t.due_at.is_some())
            .filter(|t| {
                !tasks
                    .values()
                    .any(|c| c.parent_occurrence == Some(t.id))
            })
            .cloned()
            .collect();
        Ok(result)
    }
}

/// In-memory scheduled-callback capability.
///
/// Tests drive firing explicitly via [`MemoryCallbacks::due_before`].
#[derive(Default)]
pub struct MemoryCallbacks {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryCallbacks {
    /// Creates an empty capability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scheduled fire time for a registration, if any.
    pub fn scheduled_for(&self, registration_id: &str) -> Option<DateTime<Utc>> {
        self.entries.lock().unwrap().get(registration_id).copied()
    }

    /// Returns true when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Drains and returns registration ids due at or before `now`
    /// (the test stand-in for the external timer firing).
    pub fn due_before(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut entries = self.entries.lock().unwrap();
        let due: Vec<String> = entries
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &due {
            entries.remove(id);
        }
        due
    }
}

#[async_trait]
impl CallbackScheduler for MemoryCallbacks {
    async fn schedule(
        &self,
        registration_id: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<(), CallbackError> {
        self.entries
            .lock()
            .unwrap()
            .insert(registration_id.to_string(), fire_at);
        Ok(())
    }

    async fn cancel(&self, registration_id: &str) -> Result<(), CallbackError> {
        self.entries.lock().unwrap().remove(registration_id);
        Ok(())
    }
}

/// In-memory registration store (one registration per task).
#[derive(Default)]
pub struct MemoryRegistrations {
    entries: Mutex<HashMap<String, ReminderRegistration>>,
}

impl MemoryRegistrations {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for MemoryRegistrations {
    async fn put(&self, registration: ReminderRegistration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, r| r.task_id != registration.task_id);
        entries.insert(registration.id.clone(), registration);
        Ok(())
    }

    async fn get(
        &self,
        registration_id: &str,
    ) -> Result<Option<ReminderRegistration>, StoreError> {
        Ok(self.entries.lock().unwrap().get(registration_id).cloned())
    }

    async fn by_task(&self, task_id: i64) -> Result<Option<ReminderRegistration>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .values()
            .find(|r| r.task_id == task_id)
            .cloned())
    }

    async fn remove(&self, registration_id: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(registration_id);
        Ok(())
    }
}

/// In-memory notification store with a conditional insert on
/// `(task_id, fire_at)`.
#[derive(Default)]
pub struct MemoryNotifications {
    records: Mutex<Vec<NotificationRecord>>,
}

impl MemoryNotifications {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotifications {
    async fn insert_if_absent(
        &self,
        record: NotificationRecord,
    ) -> Result<InsertOutcome, StoreError> {
        // Check-and-insert under one lock: identity is the dedup key.
        let mut records = self.records.lock().unwrap();
        let exists = records.iter().any(|r| {
            r.task_id == record.task_id
                && r.fire_at == record.fire_at
                && r.status == DeliveryStatus::Recorded
        });
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }
        records.push(record);
        Ok(InsertOutcome::Inserted)
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut matched: Vec<NotificationRecord> = records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        Ok(matched)
    }
}
