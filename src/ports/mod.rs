//! External capability boundaries, modeled as object-safe async traits.
//!
//! The subsystem talks to four kinds of collaborator, all abstract:
//!
//! - [`Broker`] — durable topic publish (push delivery arrives at the
//!   [`Dispatcher`](crate::Dispatcher), outside this trait)
//! - [`CallbackScheduler`] — durable fire-once timers for reminders
//! - [`TaskStore`] — the external CRUD store, at its narrow boundary
//! - [`RegistrationStore`] / [`NotificationStore`] — durable state this
//!   subsystem owns
//!
//! Reference in-memory implementations live in
//! [`adapters::memory`](crate::adapters::memory).

mod broker;
mod callbacks;
mod state;
mod store;

pub use broker::Broker;
pub use callbacks::CallbackScheduler;
pub use state::{InsertOutcome, NotificationStore, RegistrationStore};
pub use store::{CreateOutcome, NewOccurrence, TaskStore};
