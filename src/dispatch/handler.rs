//! # Core handler trait
//!
//! `Handle` is the extension point for topic consumers. The
//! [`Dispatcher`](crate::Dispatcher) invokes one handler per
//! `(topic, event type)` route; handlers for different messages may run
//! concurrently on different dispatcher instances with no shared in-memory
//! state.
//!
//! ## Contract
//! - A returned `Err` is logged and the message is **acknowledged anyway** —
//!   handlers own their recovery (idempotent replay via the reconciliation
//!   sweep), not the broker's redelivery loop.
//! - Handlers must be idempotent under at-least-once delivery: the same
//!   envelope (same `event_id`) may arrive any number of times.

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::events::Envelope;

/// Contract for event handlers.
///
/// Called from the dispatcher's receive path. Implementations should avoid
/// caching results across invocations — all cross-invocation state belongs
/// in durable storage.
#[async_trait]
pub trait Handle: Send + Sync + 'static {
    /// Handles a single envelope.
    ///
    /// # Parameters
    /// - `envelope`: Reference to the parsed envelope (does not transfer ownership)
    async fn on_event(&self, envelope: &Envelope) -> Result<(), HandlerError>;

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
