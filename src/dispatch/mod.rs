//! Event dispatch: receive surface, static routing, handler contract.
//!
//! ## Contents
//! - [`Handle`] — the consumer trait routed to by event type
//! - [`Dispatcher`], [`DispatcherBuilder`] — the per-topic receive surface
//! - [`Ack`], [`Disposition`] — the always-acknowledge response contract

mod dispatcher;
mod handler;

pub use dispatcher::{Ack, Dispatcher, DispatcherBuilder, Disposition};
pub use handler::Handle;
