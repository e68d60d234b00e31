//! # Subsystem configuration.
//!
//! Provides [`Config`] — centralized settings for topics, timeouts and the
//! reconciliation sweep cadence.
//!
//! Config is used in three places:
//! 1. **Publisher**: topic names and the broker push timeout.
//! 2. **Reminder scheduler**: the due-drift tolerance applied on firing.
//! 3. **Reconcile sweep**: the sweep interval.
//!
//! Deployment tooling owns the actual values; [`Config::from_env`] reads the
//! conventional environment variables and falls back to defaults for anything
//! unset or unparseable.

use std::time::Duration;

use crate::events::Topic;

/// Global configuration for the event subsystem.
///
/// ## Field semantics
/// - `task_events_topic`: broker topic for `created/updated/completed/deleted`
/// - `reminders_topic`: broker topic for `reminder` events
/// - `publish_timeout`: upper bound on a single broker push
/// - `due_drift`: tolerated distance between a registration's fire time and
///   the fire time recomputed from the task's current due timestamp
/// - `sweep_interval`: cadence of the missed-occurrence reconciliation sweep
#[derive(Clone, Debug)]
pub struct Config {
    /// Topic carrying task state-change events.
    pub task_events_topic: String,

    /// Topic carrying reminder events.
    pub reminders_topic: String,

    /// Maximum time to wait for a single broker push before dropping the envelope.
    pub publish_timeout: Duration,

    /// Tolerated drift between registered and recomputed reminder fire times.
    ///
    /// A firing whose registration disagrees with the task's current due
    /// timestamp by more than this is treated as stale and skipped.
    pub due_drift: Duration,

    /// Interval between reconciliation sweep passes.
    pub sweep_interval: Duration,
}

impl Config {
    /// Returns the configured name for the given topic.
    #[inline]
    pub fn topic_name(&self, topic: Topic) -> &str {
        match topic {
            Topic::TaskEvents => &self.task_events_topic,
            Topic::Reminders => &self.reminders_topic,
        }
    }

    /// Builds a config from environment variables, using defaults for
    /// anything unset or unparseable.
    ///
    /// ## Variables
    /// - `TASKPULSE_TASK_EVENTS_TOPIC`
    /// - `TASKPULSE_REMINDERS_TOPIC`
    /// - `TASKPULSE_PUBLISH_TIMEOUT_MS`
    /// - `TASKPULSE_DUE_DRIFT_SECS`
    /// - `TASKPULSE_SWEEP_INTERVAL_SECS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("TASKPULSE_TASK_EVENTS_TOPIC") {
            if !v.is_empty() {
                cfg.task_events_topic = v;
            }
        }
        if let Ok(v) = std::env::var("TASKPULSE_REMINDERS_TOPIC") {
            if !v.is_empty() {
                cfg.reminders_topic = v;
            }
        }
        if let Some(ms) = env_u64("TASKPULSE_PUBLISH_TIMEOUT_MS") {
            cfg.publish_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("TASKPULSE_DUE_DRIFT_SECS") {
            cfg.due_drift = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("TASKPULSE_SWEEP_INTERVAL_SECS") {
            cfg.sweep_interval = Duration::from_secs(secs);
        }
        cfg
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `task_events_topic = "task-events"`
    /// - `reminders_topic = "reminders"`
    /// - `publish_timeout = 5s`
    /// - `due_drift = 60s`
    /// - `sweep_interval = 300s`
    fn default() -> Self {
        Self {
            task_events_topic: "task-events".to_string(),
            reminders_topic: "reminders".to_string(),
            publish_timeout: Duration::from_secs(5),
            due_drift: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(300),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.topic_name(Topic::TaskEvents), "task-events");
        assert_eq!(cfg.topic_name(Topic::Reminders), "reminders");
        assert_eq!(cfg.publish_timeout, Duration::from_secs(5));
    }
}
