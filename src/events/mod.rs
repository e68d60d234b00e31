//! Event schema: envelopes, event types, topics.
//!
//! The shared data contracts for every message in the subsystem. This module
//! is a leaf — every other component depends on it, it depends on nothing.
//!
//! ## Contents
//! - [`EventType`], [`TaskSnapshot`], [`Envelope`] — classification, payload, wrapper
//! - [`Topic`] — the two broker topics and their static event-type mapping

mod envelope;
mod topic;

pub use envelope::{Envelope, EventType, TaskSnapshot};
pub use topic::Topic;
