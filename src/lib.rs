//! # taskpulse
//!
//! **taskpulse** is the event-driven lifecycle subsystem for a task manager:
//! it publishes task state-change events, regenerates recurring tasks when
//! occurrences complete, schedules durable reminders, and records
//! notification deliveries idempotently.
//!
//! The crate is transport-agnostic: the broker, the durable timer service
//! and the task store are abstract port traits. Deployment tooling binds
//! them and wires broker push-routes onto the [`Dispatcher`].
//!
//! ## Architecture
//! ```text
//!  task mutation (external CRUD store)
//!        │
//!        ▼
//!  ┌────────────┐   envelope    ┌──────────────────────────────┐
//!  │ Publisher  ├──────────────►│ Broker (abstract, durable)   │
//!  │ (never     │               │  topic: task-events          │
//!  │  blocks    │               │  topic: reminders            │
//!  │  caller)   │               └──────┬───────────────────────┘
//!  └────────────┘                      │ push (at-least-once)
//!        ▲                             ▼
//!        │                      ┌─────────────────┐
//!        │                      │   Dispatcher    │ parse → route → ack
//!        │                      └──┬───────────┬──┘
//!        │              completed  │           │  reminder
//!        │                         ▼           ▼
//!        │              ┌──────────────────┐ ┌──────────────────────┐
//!        │              │ RecurrenceEngine │ │ NotificationRecorder │
//!        │              │ (next occurrence,│ │ (insert-if-absent on │
//!        │              │  insert-if-      │ │  task id + fire time)│
//!        │              │  absent on       │ └──────────────────────┘
//!        │              │  parent link)    │
//!        │              └────────┬─────────┘
//!        │       created event   │
//!        └───────────────────────┘
//!
//!  ReminderScheduler (outside the event flow):
//!    register(task, due, offset) ──► RegistrationStore + CallbackScheduler
//!    fire(registration_id)       ──► checks → Publisher(reminder)
//!
//!  ReconcileSweep (periodic): completed recurring tasks without a
//!  successor ──► RecurrenceEngine::spawn_next (idempotent replay)
//! ```
//!
//! ## Guarantees
//! | Concern              | Approach                                                              |
//! |----------------------|-----------------------------------------------------------------------|
//! | **Delivery**         | At-least-once from the broker; consumers deduplicate                  |
//! | **Idempotency**      | Atomic conditional inserts against durable storage, never locks       |
//! | **Cadence**          | Next occurrence from the task's own due timestamp, never "now"        |
//! | **Mutation safety**  | Publish failures are logged and dropped, never surfaced to the caller |
//! | **Restart safety**   | No in-process timers or caches; all state behind durable ports        |
//! | **Poison messages**  | Malformed envelopes acknowledged and dropped, never retried           |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskpulse::adapters::memory::{MemoryBroker, MemoryNotifications, MemoryTaskStore};
//! use taskpulse::{
//!     Config, Dispatcher, EventType, NotificationRecorder, Publisher, RecurrenceEngine,
//!     TaskSnapshot, Topic,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = Config::default();
//!     let broker = Arc::new(MemoryBroker::new());
//!     let store = Arc::new(MemoryTaskStore::new());
//!     let publisher = Publisher::new(broker.clone(), cfg.clone());
//!
//!     // Static route table, built once at startup.
//!     let dispatcher = Dispatcher::builder()
//!         .on(
//!             EventType::Completed,
//!             Arc::new(RecurrenceEngine::new(store.clone(), publisher.clone())),
//!         )
//!         .on(
//!             EventType::Reminder,
//!             Arc::new(NotificationRecorder::new(Arc::new(MemoryNotifications::new()))),
//!         )
//!         .build();
//!
//!     // A mutation happened elsewhere; publish its event.
//!     let task = TaskSnapshot::new(1, "user-1", "Standup");
//!     publisher.publish(EventType::Created, task, "user-1").await;
//!
//!     // The broker pushes payloads back at the receive surface.
//!     for (_topic, envelope) in broker.take() {
//!         dispatcher
//!             .receive(Topic::TaskEvents, &envelope.to_json().unwrap())
//!             .await;
//!     }
//! }
//! ```

mod config;
mod error;
mod publisher;

pub mod adapters;
pub mod dispatch;
pub mod events;
pub mod notifications;
pub mod ports;
pub mod recurrence;
pub mod reminders;

// ---- Public re-exports ----

pub use config::Config;
pub use dispatch::{Ack, Dispatcher, DispatcherBuilder, Disposition, Handle};
pub use error::{
    CallbackError, HandlerError, PatternError, PublishError, ScheduleError, StoreError,
};
pub use events::{Envelope, EventType, TaskSnapshot, Topic};
pub use notifications::{DeliveryStatus, NotificationRecord, NotificationRecorder};
pub use publisher::{PublishOutcome, Publisher};
pub use recurrence::{ReconcileSweep, RecurrenceEngine, RecurrencePattern};
pub use reminders::{FireOutcome, ReminderRegistration, ReminderScheduler};
