//! # Broker port: durable publish/subscribe transport.
//!
//! The subsystem assumes only an abstract broker capability: named durable
//! topics, publish, and push delivery with at-least-once semantics. The
//! concrete product (Kafka behind a sidecar, NATS, anything with durable
//! topics) lives behind this trait.
//!
//! Push delivery is *not* part of the trait — the broker side of the
//! deployment calls [`Dispatcher::receive`](crate::Dispatcher::receive) with
//! the raw payload, one route per topic.

use async_trait::async_trait;

use crate::error::PublishError;
use crate::events::Envelope;

/// Durable publish capability.
///
/// Implementations are called from the [`Publisher`](crate::Publisher) with a
/// timeout already applied around the whole call; they should not retry
/// internally beyond what their transport needs.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Pushes one envelope to the named topic.
    async fn publish(&self, topic: &str, envelope: &Envelope) -> Result<(), PublishError>;
}
