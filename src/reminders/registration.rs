//! Durable reminder registration record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One durable reminder registration.
///
/// Created when a task with both a due timestamp and a reminder offset is
/// created or updated; replaced whenever either changes; removed on deletion,
/// on completion of non-recurring tasks, and after firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRegistration {
    /// Registration identifier, the key handed to the scheduled-callback
    /// capability and used to cancel.
    pub id: String,
    /// The task this reminder belongs to.
    pub task_id: i64,
    /// Scheduled fire time (`due_at − reminder offset`).
    pub fire_at: DateTime<Utc>,
}

impl ReminderRegistration {
    /// Creates a registration with a fresh id.
    pub fn new(task_id: i64, fire_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            fire_at,
        }
    }

    /// Computes a fire time from a due timestamp and offset.
    #[inline]
    pub fn fire_time(due_at: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
        due_at - offset
    }
}
