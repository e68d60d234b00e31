//! Notification delivery records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery status of a notification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Staged but not yet recorded (external writers may stage records
    /// before delivery).
    Pending,
    /// The delivery attempt has been recorded.
    Recorded,
}

impl DeliveryStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Recorded => "recorded",
        }
    }
}

/// One recorded notification delivery attempt.
///
/// Invariant: at most one `recorded` record exists per `(task_id, fire_at)`
/// pair — enforced by the conditional insert in
/// [`NotificationStore`](crate::ports::NotificationStore), not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Record identifier.
    pub id: String,
    /// The task the reminder was for.
    pub task_id: i64,
    /// Owning user identifier (the query surface filters on this).
    pub owner_id: String,
    /// Scheduled fire time carried in the reminder event (dedup key half).
    pub fire_at: DateTime<Utc>,
    /// When the delivery attempt was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Delivery status.
    pub status: DeliveryStatus,
}

impl NotificationRecord {
    /// Creates a `recorded` record with a fresh id and the current time.
    pub fn recorded(task_id: i64, owner_id: impl Into<String>, fire_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id,
            owner_id: owner_id.into(),
            fire_at,
            recorded_at: Utc::now(),
            status: DeliveryStatus::Recorded,
        }
    }
}
