//! Recurring tasks: pattern math, the completion handler, and reconciliation.
//!
//! ## Contents
//! - [`RecurrencePattern`] — `daily`/`weekly`/`biweekly`/`monthly`/cron parsing
//!   and next-occurrence computation anchored on the due timestamp
//! - [`RecurrenceEngine`] — `completed`-event handler that spawns successors
//! - [`ReconcileSweep`] — periodic recovery of occurrences lost to handler
//!   failures

mod engine;
mod pattern;
mod sweep;

pub use engine::RecurrenceEngine;
pub use pattern::RecurrencePattern;
pub use sweep::ReconcileSweep;
