//! # Reminder scheduler: durable registration and the firing handler.
//!
//! [`ReminderScheduler`] owns the reminder lifecycle:
//!
//! ```text
//! register(task, due, offset) ──► RegistrationStore.put ──► CallbackScheduler.schedule
//!                                                                │
//!                                            (external timer, survives restarts)
//!                                                                │
//! fire(registration_id) ◄────────────────────────────────────────┘
//!     ├─ registration unknown          → no-op (stale callback)
//!     ├─ task gone / completed         → no-op, registration dropped
//!     ├─ due moved beyond drift window → no-op, registration dropped
//!     └─ checks pass → Publisher.publish(reminder, current snapshot)
//!                      registration removed (fire-once)
//! ```
//!
//! ## Rules
//! - **No retroactive reminders**: a computed fire time at or before "now"
//!   rejects the registration outright.
//! - **Durable, not in-memory**: there is no timer heap here; a crash between
//!   registration and firing loses nothing because both the registration and
//!   the timer live outside the process.
//! - **Re-registration replaces**: any due/offset change cancels the prior
//!   registration and creates a new one. If the old callback still fires, its
//!   registration lookup fails and the firing is a no-op.
//! - **Current state wins**: the firing path reloads the task and publishes
//!   the *current* snapshot, not the one seen at registration time.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ScheduleError;
use crate::events::{Envelope, EventType, TaskSnapshot};
use crate::ports::{CallbackScheduler, RegistrationStore, TaskStore};
use crate::publisher::Publisher;
use crate::reminders::ReminderRegistration;

/// Outcome of a firing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Checks passed; a `reminder` event was published.
    Fired,
    /// The firing was a no-op; the label says why.
    Skipped(&'static str),
}

/// Registers, cancels and fires durable reminders.
pub struct ReminderScheduler {
    callbacks: Arc<dyn CallbackScheduler>,
    registrations: Arc<dyn RegistrationStore>,
    store: Arc<dyn TaskStore>,
    publisher: Publisher,
    cfg: Config,
}

impl ReminderScheduler {
    /// Creates a scheduler over the given capabilities.
    pub fn new(
        callbacks: Arc<dyn CallbackScheduler>,
        registrations: Arc<dyn RegistrationStore>,
        store: Arc<dyn TaskStore>,
        publisher: Publisher,
        cfg: Config,
    ) -> Self {
        Self {
            callbacks,
            registrations,
            store,
            publisher,
            cfg,
        }
    }

    /// Registers a durable reminder firing at `due_at − offset`.
    ///
    /// Rejects fire times at or before "now" with
    /// [`ScheduleError::FireTimeInPast`] — no retroactive reminders, and no
    /// registration is left behind on rejection.
    pub async fn register(
        &self,
        task_id: i64,
        due_at: chrono::DateTime<Utc>,
        offset: Duration,
    ) -> Result<String, ScheduleError> {
        let fire_at = ReminderRegistration::fire_time(due_at, offset);
        if fire_at <= Utc::now() {
            return Err(ScheduleError::FireTimeInPast { fire_at });
        }

        let registration = ReminderRegistration::new(task_id, fire_at);
        let id = registration.id.clone();

        // Durable record first, then the external timer: a crash in between
        // leaves a registration the sweep of stale records can reap, whereas
        // the reverse order could fire a callback with no registration to
        // honor it.
        self.registrations.put(registration).await?;
        if let Err(e) = self.callbacks.schedule(&id, fire_at).await {
            self.registrations.remove(&id).await?;
            return Err(e.into());
        }

        info!(task_id, registration_id = %id, fire_at = %fire_at, "reminder registered");
        Ok(id)
    }

    /// Cancels a registration by id.
    pub async fn cancel(&self, registration_id: &str) -> Result<(), ScheduleError> {
        self.callbacks.cancel(registration_id).await?;
        self.registrations.remove(registration_id).await?;
        debug!(registration_id, "reminder canceled");
        Ok(())
    }

    /// Reconciles the registration for a task against its current snapshot.
    ///
    /// Cancels any prior registration, then re-registers when the task is
    /// incomplete and has both a due timestamp and a reminder offset. A fire
    /// time already in the past yields no registration but is not an error —
    /// the task is simply too close to (or past) its due time.
    ///
    /// Returns the new registration id, if one was created.
    pub async fn sync(&self, task: &TaskSnapshot) -> Result<Option<String>, ScheduleError> {
        self.clear(task.id).await?;

        if task.completed {
            return Ok(None);
        }
        let (Some(due_at), Some(offset)) = (task.due_at, task.reminder_offset()) else {
            return Ok(None);
        };

        match self.register(task.id, due_at, offset).await {
            Ok(id) => Ok(Some(id)),
            Err(ScheduleError::FireTimeInPast { fire_at }) => {
                debug!(task_id = task.id, fire_at = %fire_at, "fire time already past, not registering");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Drops the registration for a task, if any (deletion, completion of a
    /// non-recurring task).
    pub async fn clear(&self, task_id: i64) -> Result<(), ScheduleError> {
        if let Some(prior) = self.registrations.by_task(task_id).await? {
            self.cancel(&prior.id).await?;
        }
        Ok(())
    }

    /// Firing handler, invoked by the external callback capability when the
    /// registered time arrives.
    ///
    /// Reloads the task's current state and verifies it still exists, is not
    /// completed, and that its due timestamp still agrees with the
    /// registration within [`Config::due_drift`]. Any failed check makes the
    /// firing a no-op. On success, publishes a `reminder` event carrying the
    /// current snapshot and the scheduled fire time, then consumes the
    /// registration.
    pub async fn fire(&self, registration_id: &str) -> Result<FireOutcome, ScheduleError> {
        let Some(registration) = self.registrations.get(registration_id).await? else {
            debug!(registration_id, "unknown registration, stale callback ignored");
            return Ok(FireOutcome::Skipped("unknown_registration"));
        };

        let Some(task) = self.store.get_task(registration.task_id).await? else {
            self.registrations.remove(registration_id).await?;
            debug!(registration_id, task_id = registration.task_id, "task gone, reminder dropped");
            return Ok(FireOutcome::Skipped("task_missing"));
        };

        if task.completed {
            self.registrations.remove(registration_id).await?;
            debug!(registration_id, task_id = task.id, "task completed, reminder dropped");
            return Ok(FireOutcome::Skipped("task_completed"));
        }

        if !self.due_still_matches(&task, &registration) {
            self.registrations.remove(registration_id).await?;
            warn!(
                registration_id,
                task_id = task.id,
                "due timestamp moved since registration, stale reminder dropped"
            );
            return Ok(FireOutcome::Skipped("due_moved"));
        }

        let owner = task.owner_id.clone();
        let envelope = Envelope::new(EventType::Reminder, task, owner)
            .with_remind_at(registration.fire_at);
        self.publisher.publish_envelope(envelope).await;

        // Fire-once: the registration is consumed even if the publish was
        // dropped. Reminders are best-effort.
        self.registrations.remove(registration_id).await?;
        Ok(FireOutcome::Fired)
    }

    /// Recomputes the fire time from the task's current due timestamp and
    /// offset, tolerating [`Config::due_drift`] of disagreement.
    fn due_still_matches(&self, task: &TaskSnapshot, registration: &ReminderRegistration) -> bool {
        let (Some(due_at), Some(offset)) = (task.due_at, task.reminder_offset()) else {
            return false;
        };
        let expected = ReminderRegistration::fire_time(due_at, offset);
        let drift = Duration::from_std(self.cfg.due_drift).unwrap_or_else(|_| Duration::zero());
        (expected - registration.fire_at).abs() <= drift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::adapters::memory::{
        MemoryBroker, MemoryCallbacks, MemoryRegistrations, MemoryTaskStore,
    };

    struct Fixture {
        scheduler: ReminderScheduler,
        callbacks: Arc<MemoryCallbacks>,
        registrations: Arc<MemoryRegistrations>,
        store: Arc<MemoryTaskStore>,
        broker: Arc<MemoryBroker>,
    }

    fn fixture() -> Fixture {
        let callbacks = Arc::new(MemoryCallbacks::new());
        let registrations = Arc::new(MemoryRegistrations::new());
        let store = Arc::new(MemoryTaskStore::new());
        let broker = Arc::new(MemoryBroker::new());
        let publisher = Publisher::new(broker.clone(), Config::default());
        let scheduler = ReminderScheduler::new(
            callbacks.clone(),
            registrations.clone(),
            store.clone(),
            publisher,
            Config::default(),
        );
        Fixture {
            scheduler,
            callbacks,
            registrations,
            store,
            broker,
        }
    }

    fn soon(minutes: i64) -> DateTime<Utc> {
        Utc::now() + Duration::minutes(minutes)
    }

    fn task_due_in(id: i64, minutes: i64, offset_secs: i64) -> TaskSnapshot {
        TaskSnapshot::new(id, "user-1", "Standup")
            .with_due_at(soon(minutes))
            .with_reminder_offset_seconds(offset_secs)
    }

    #[tokio::test]
    async fn registration_is_durable_and_scheduled() {
        let f = fixture();
        let due = soon(120);
        let id = f
            .scheduler
            .register(1, due, Duration::minutes(60))
            .await
            .unwrap();

        let reg = f.registrations.get(&id).await.unwrap().unwrap();
        assert_eq!(reg.task_id, 1);
        assert_eq!(reg.fire_at, due - Duration::minutes(60));
        assert_eq!(f.callbacks.scheduled_for(&id), Some(reg.fire_at));
    }

    #[tokio::test]
    async fn past_fire_time_is_rejected_without_registration() {
        let f = fixture();
        let due = soon(10);
        let err = f
            .scheduler
            .register(1, due, Duration::minutes(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleError::FireTimeInPast { .. }));
        assert!(f.registrations.by_task(1).await.unwrap().is_none());
        assert!(f.callbacks.is_empty());
    }

    #[tokio::test]
    async fn sync_replaces_prior_registration() {
        let f = fixture();
        let task = task_due_in(1, 180, 3600);
        f.store.insert(task.clone());

        let first = f.scheduler.sync(&task).await.unwrap().unwrap();

        // Due time moves; a new registration replaces the old one.
        let moved = task.clone().with_due_at(soon(300));
        f.store.insert(moved.clone());
        let second = f.scheduler.sync(&moved).await.unwrap().unwrap();

        assert_ne!(first, second);
        assert!(f.registrations.get(&first).await.unwrap().is_none());
        assert!(f.callbacks.scheduled_for(&first).is_none());
        assert!(f.registrations.get(&second).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sync_without_due_or_offset_registers_nothing() {
        let f = fixture();
        let no_offset = TaskSnapshot::new(1, "u", "t").with_due_at(soon(120));
        assert!(f.scheduler.sync(&no_offset).await.unwrap().is_none());

        let no_due = TaskSnapshot::new(2, "u", "t").with_reminder_offset_seconds(600);
        assert!(f.scheduler.sync(&no_due).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn firing_publishes_current_snapshot_with_fire_time() {
        let f = fixture();
        let task = task_due_in(1, 120, 60);
        f.store.insert(task.clone());
        let id = f.scheduler.sync(&task).await.unwrap().unwrap();

        // Title changed between registration and firing; the event must
        // carry the current state.
        let mut renamed = task.clone();
        renamed.title = "Standup (moved rooms)".to_string();
        f.store.insert(renamed);

        let outcome = f.scheduler.fire(&id).await.unwrap();
        assert_eq!(outcome, FireOutcome::Fired);

        let published = f.broker.take();
        assert_eq!(published.len(), 1);
        let (topic, env) = &published[0];
        assert_eq!(topic, "reminders");
        assert_eq!(env.event_type, EventType::Reminder);
        assert_eq!(env.task.title, "Standup (moved rooms)");
        assert!(env.remind_at.is_some());

        // Fire-once: the registration is gone, a second callback is a no-op.
        let again = f.scheduler.fire(&id).await.unwrap();
        assert_eq!(again, FireOutcome::Skipped("unknown_registration"));
        assert!(f.broker.take().is_empty());
    }

    #[tokio::test]
    async fn firing_for_missing_or_completed_task_is_a_no_op() {
        let f = fixture();
        let task = task_due_in(1, 120, 60);
        f.store.insert(task.clone());
        let id = f.scheduler.sync(&task).await.unwrap().unwrap();

        f.store.remove(1);
        assert_eq!(
            f.scheduler.fire(&id).await.unwrap(),
            FireOutcome::Skipped("task_missing")
        );

        let done = task_due_in(2, 120, 60);
        f.store.insert(done.clone());
        let id = f.scheduler.sync(&done).await.unwrap().unwrap();
        let mut completed = done.clone();
        completed.completed = true;
        f.store.insert(completed);
        assert_eq!(
            f.scheduler.fire(&id).await.unwrap(),
            FireOutcome::Skipped("task_completed")
        );
        assert!(f.broker.take().is_empty());
    }

    #[tokio::test]
    async fn firing_after_due_moved_is_a_no_op() {
        let f = fixture();
        let task = task_due_in(1, 120, 60);
        f.store.insert(task.clone());
        let id = f.scheduler.sync(&task).await.unwrap().unwrap();

        // Due moved by two hours without re-registration (e.g. the old
        // callback out-raced a cancel that partially failed).
        let moved = task.clone().with_due_at(soon(240));
        f.store.insert(moved);

        assert_eq!(
            f.scheduler.fire(&id).await.unwrap(),
            FireOutcome::Skipped("due_moved")
        );
        assert!(f.broker.take().is_empty());
    }

    #[tokio::test]
    async fn clear_drops_the_task_registration() {
        let f = fixture();
        let task = task_due_in(1, 120, 60);
        f.store.insert(task.clone());
        f.scheduler.sync(&task).await.unwrap().unwrap();

        f.scheduler.clear(1).await.unwrap();
        assert!(f.registrations.by_task(1).await.unwrap().is_none());
        assert!(f.callbacks.is_empty());

        // Clearing again is harmless.
        f.scheduler.clear(1).await.unwrap();
    }
}
