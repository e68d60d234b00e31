//! Durable reminders: registration records and the scheduler.
//!
//! ## Contents
//! - [`ReminderRegistration`] — durable `(id, task, fire time)` record
//! - [`ReminderScheduler`] — register/cancel/sync/clear plus the firing
//!   handler invoked by the external callback capability
//! - [`FireOutcome`] — what a firing attempt did

mod registration;
mod scheduler;

pub use registration::ReminderRegistration;
pub use scheduler::{FireOutcome, ReminderScheduler};
