//! Notification recording: the reminder consumer and its query surface.
//!
//! ## Contents
//! - [`NotificationRecord`], [`DeliveryStatus`] — the durable record model
//! - [`NotificationRecorder`] — `reminder`-event handler with idempotent
//!   conditional insert and the owner/status query

mod record;
mod recorder;

pub use record::{DeliveryStatus, NotificationRecord};
pub use recorder::NotificationRecorder;
