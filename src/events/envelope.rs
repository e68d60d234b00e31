//! # Event schema: envelope, event types, and task snapshots.
//!
//! [`Envelope`] is the wire-format wrapper around a task lifecycle event. It
//! carries identity (a unique `event_id` used for consumer-side dedup), the
//! event classification, the *full* task state at emission time, and timing
//! metadata.
//!
//! ## Dedup contract
//! `event_id` is never reused; consumers key dedup state on it — not on the
//! task id, since one task appears in many envelopes over its lifetime.
//!
//! ## Snapshots, not deltas
//! The embedded [`TaskSnapshot`] is a complete immutable copy of task state
//! at emission time. Handlers must never reach back into live task records
//! to interpret an event.
//!
//! ## Example
//! ```rust
//! use taskpulse::{Envelope, EventType, TaskSnapshot};
//!
//! let task = TaskSnapshot::new(7, "user-1", "Standup");
//! let ev = Envelope::new(EventType::Created, task, "user-1");
//!
//! assert_eq!(ev.event_type, EventType::Created);
//! assert_eq!(ev.task.id, 7);
//! assert!(ev.remind_at.is_none());
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::Topic;

/// Classification of task lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// A task was created (including recurring occurrences spawned by the engine).
    Created,
    /// A task's fields changed.
    Updated,
    /// A task was marked complete.
    Completed,
    /// A task was deleted.
    Deleted,
    /// A reminder fired for a task.
    Reminder,
}

impl EventType {
    /// Returns the wire name of this event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Completed => "completed",
            EventType::Deleted => "deleted",
            EventType::Reminder => "reminder",
        }
    }

    /// Returns the topic this event type is published to.
    #[inline]
    pub fn topic(&self) -> Topic {
        match self {
            EventType::Reminder => Topic::Reminders,
            _ => Topic::TaskEvents,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete task state at event emission time.
///
/// Owned by the external CRUD store; this subsystem only reads and
/// re-publishes snapshots. The one invariant enforced here: a recurrence
/// pattern is always anchored to a due timestamp
/// ([`TaskSnapshot::validate`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task identifier in the external store.
    pub id: i64,
    /// Owning user identifier.
    pub owner_id: String,
    /// Task title.
    pub title: String,
    /// Completion flag.
    #[serde(default)]
    pub completed: bool,
    /// Due timestamp, if any.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    /// Recurrence pattern (`daily`/`weekly`/`biweekly`/`monthly` or a cron
    /// expression), if any.
    #[serde(default)]
    pub recurrence: Option<String>,
    /// Reminder offset in seconds before `due_at`, if any.
    #[serde(default)]
    pub reminder_offset_seconds: Option<i64>,
    /// Free-form tags carried across recurring occurrences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Id of the completed occurrence that spawned this task, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_occurrence: Option<i64>,
}

impl TaskSnapshot {
    /// Creates a minimal snapshot (no due time, no recurrence, no reminder).
    pub fn new(id: i64, owner_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            owner_id: owner_id.into(),
            title: title.into(),
            completed: false,
            due_at: None,
            recurrence: None,
            reminder_offset_seconds: None,
            tags: Vec::new(),
            parent_occurrence: None,
        }
    }

    /// Sets the due timestamp.
    #[inline]
    pub fn with_due_at(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    /// Sets the recurrence pattern.
    #[inline]
    pub fn with_recurrence(mut self, pattern: impl Into<String>) -> Self {
        self.recurrence = Some(pattern.into());
        self
    }

    /// Sets the reminder offset in seconds before the due timestamp.
    #[inline]
    pub fn with_reminder_offset_seconds(mut self, secs: i64) -> Self {
        self.reminder_offset_seconds = Some(secs);
        self
    }

    /// Sets the tags.
    #[inline]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Returns the reminder offset as a duration, if configured and positive.
    pub fn reminder_offset(&self) -> Option<Duration> {
        match self.reminder_offset_seconds {
            Some(secs) if secs > 0 => Some(Duration::seconds(secs)),
            _ => None,
        }
    }

    /// Returns true if the snapshot carries a non-empty recurrence pattern.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Checks the snapshot-level invariant: recurrence requires a due timestamp.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.is_recurring() && self.due_at.is_none() {
            return Err("recurrence pattern without due timestamp");
        }
        Ok(())
    }
}

/// Wire-format wrapper around a task lifecycle event.
///
/// - `event_id`: unique per emission, the consumer dedup key
/// - `emitted_at`: wall-clock emission timestamp
/// - `remind_at`: scheduled fire time, set only on `reminder` events —
///   the [`NotificationRecorder`](crate::NotificationRecorder) keys its
///   idempotency on `(task.id, remind_at)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique event identifier (UUID v4), never reused.
    pub event_id: String,
    /// Event classification.
    pub event_type: EventType,
    /// Full task state at emission time.
    pub task: TaskSnapshot,
    /// Owning user identifier (duplicated out of the snapshot for routing).
    pub owner_id: String,
    /// Wall-clock emission timestamp.
    pub emitted_at: DateTime<Utc>,
    /// Scheduled reminder fire time; present only on `reminder` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Creates a new envelope with a fresh event id and current timestamp.
    pub fn new(event_type: EventType, task: TaskSnapshot, owner_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type,
            task,
            owner_id: owner_id.into(),
            emitted_at: Utc::now(),
            remind_at: None,
        }
    }

    /// Attaches the scheduled fire time (reminder events).
    #[inline]
    pub fn with_remind_at(mut self, at: DateTime<Utc>) -> Self {
        self.remind_at = Some(at);
        self
    }

    /// Returns the topic this envelope belongs on.
    #[inline]
    pub fn topic(&self) -> Topic {
        self.event_type.topic()
    }

    /// Parses an envelope from a JSON payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
