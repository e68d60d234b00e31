//! Error types used across the taskpulse subsystem.
//!
//! Each boundary gets its own enum:
//!
//! - [`PublishError`] — broker push failures (absorbed by the [`Publisher`](crate::Publisher)).
//! - [`StoreError`] — durable storage failures behind the port traits.
//! - [`CallbackError`] — scheduled-callback capability failures.
//! - [`HandlerError`] — failures inside event handlers (logged, still acknowledged).
//! - [`ScheduleError`] — reminder registration/firing failures.
//! - [`PatternError`] — unparseable recurrence patterns.
//!
//! All types provide `as_label()` returning a short stable snake_case label
//! for logs and metrics.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// # Errors produced while pushing an envelope to the broker.
///
/// These never reach the caller that triggered the underlying task mutation;
/// the [`Publisher`](crate::Publisher) catches them, logs, and reports the
/// envelope as dropped.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PublishError {
    /// Broker endpoint unreachable or rejected the push.
    #[error("broker transport failure: {reason}")]
    Transport {
        /// Human-readable transport failure description.
        reason: String,
    },

    /// Broker push did not complete within the configured timeout.
    #[error("broker push timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Envelope could not be serialized to JSON.
    #[error("envelope encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::Transport { .. } => "publish_transport",
            PublishError::Timeout { .. } => "publish_timeout",
            PublishError::Encode(_) => "publish_encode",
        }
    }
}

/// # Errors produced by durable storage ports.
///
/// Raised by [`TaskStore`](crate::ports::TaskStore),
/// [`RegistrationStore`](crate::ports::RegistrationStore) and
/// [`NotificationStore`](crate::ports::NotificationStore) implementations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing store unreachable or the operation timed out.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Human-readable failure description.
        reason: String,
    },

    /// A write precondition failed in a way the caller cannot resolve.
    #[error("store conflict: {reason}")]
    Conflict {
        /// Human-readable conflict description.
        reason: String,
    },
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "store_unavailable",
            StoreError::Conflict { .. } => "store_conflict",
        }
    }
}

/// # Errors produced by the external scheduled-callback capability.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CallbackError {
    /// Callback endpoint unreachable or rejected the request.
    #[error("callback scheduler unavailable: {reason}")]
    Unavailable {
        /// Human-readable failure description.
        reason: String,
    },
}

impl CallbackError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Unavailable { .. } => "callback_unavailable",
        }
    }
}

/// # Errors produced by event handlers.
///
/// A handler error is logged by the [`Dispatcher`](crate::Dispatcher) and the
/// message is acknowledged anyway; recovery for missed work belongs to the
/// reconciliation sweep, not to broker redelivery.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Durable storage failed while the handler was doing its work.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The envelope parsed but its task snapshot violates an invariant
    /// the handler depends on (e.g. reminder event without a fire time).
    #[error("invalid task snapshot: {reason}")]
    InvalidSnapshot {
        /// Which invariant was violated.
        reason: String,
    },
}

impl HandlerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Store(e) => e.as_label(),
            HandlerError::InvalidSnapshot { .. } => "handler_invalid_snapshot",
        }
    }
}

/// # Errors produced by reminder registration and firing.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Computed fire time is not in the future; no retroactive reminders.
    #[error("fire time {fire_at} is in the past")]
    FireTimeInPast {
        /// The rejected fire time.
        fire_at: DateTime<Utc>,
    },

    /// Scheduled-callback capability failed.
    #[error(transparent)]
    Callback(#[from] CallbackError),

    /// Registration store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ScheduleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ScheduleError::FireTimeInPast { .. } => "schedule_fire_in_past",
            ScheduleError::Callback(e) => e.as_label(),
            ScheduleError::Store(e) => e.as_label(),
        }
    }
}

/// # Errors produced while parsing a recurrence pattern.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Not a fixed keyword and not a valid cron expression.
    #[error("unrecognized recurrence pattern {pattern:?}: {reason}")]
    Unrecognized {
        /// The offending pattern string.
        pattern: String,
        /// Why the cron fallback rejected it.
        reason: String,
    },
}

impl PatternError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PatternError::Unrecognized { .. } => "pattern_unrecognized",
        }
    }
}
