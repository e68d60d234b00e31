//! # Event dispatcher: stable receive surface with static routing.
//!
//! [`Dispatcher`] is the push-receive endpoint for broker delivery: one call
//! per topic, accepting the raw JSON envelope. Routing is a static table
//! `(topic, event type) → handler` built once at startup by
//! [`DispatcherBuilder`] — no dynamically registered listener objects, no
//! global mutable registries.
//!
//! ## Message lifecycle
//! ```text
//! received ──► parsed ──► dispatched ──► acknowledged
//!     │           │            │
//!     │           │            └─ handler Err/panic → log, ack anyway
//!     │           └─ no route for (topic, type) → log, ack anyway
//!     └─ malformed JSON → warn, ack anyway (drop, never retry)
//! ```
//!
//! There is no `retried` state at this level: retry policy, if any, belongs
//! to the broker layer. A handler failure must never hold an ack hostage,
//! and a malformed payload must never loop back as a poison message.
//!
//! ## Panic isolation
//! Handler futures run under `catch_unwind`; a panicking handler is reported
//! like a failed one and the dispatcher keeps serving.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, warn};

use crate::dispatch::Handle;
use crate::events::{Envelope, EventType, Topic};

/// How the dispatcher disposed of a received message.
///
/// Every disposition is acknowledged to the broker; the distinction exists
/// for logs, metrics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Parsed, routed, and the handler returned `Ok`.
    Handled,
    /// Payload was not a structurally valid envelope; dropped without retry.
    DroppedMalformed,
    /// No handler is routed for this `(topic, event type)` pair.
    NoRoute,
    /// The handler returned `Err` or panicked; logged, still acknowledged.
    HandlerFailed,
}

/// Acknowledgement returned to the broker for every received message.
///
/// Always a success acknowledgement — the receive surface never asks the
/// broker to redeliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// What happened to the message before it was acknowledged.
    pub disposition: Disposition,
}

impl Ack {
    #[inline]
    fn of(disposition: Disposition) -> Self {
        Self { disposition }
    }

    /// Returns true if a handler ran and succeeded.
    #[inline]
    pub fn is_handled(&self) -> bool {
        self.disposition == Disposition::Handled
    }
}

/// Builder for the static route table.
///
/// Construct once at startup; duplicate routes replace earlier ones.
#[derive(Default)]
pub struct DispatcherBuilder {
    routes: HashMap<(Topic, EventType), Arc<dyn Handle>>,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes `event_type` on `topic` to `handler`.
    pub fn route(
        mut self,
        topic: Topic,
        event_type: EventType,
        handler: Arc<dyn Handle>,
    ) -> Self {
        self.routes.insert((topic, event_type), handler);
        self
    }

    /// Routes `event_type` on its natural topic (see [`EventType::topic`]).
    pub fn on(self, event_type: EventType, handler: Arc<dyn Handle>) -> Self {
        let topic = event_type.topic();
        self.route(topic, event_type, handler)
    }

    /// Builds the dispatcher.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            routes: self.routes,
        }
    }
}

/// Push-receive surface: parses, routes, invokes, acknowledges.
pub struct Dispatcher {
    routes: HashMap<(Topic, EventType), Arc<dyn Handle>>,
}

impl Dispatcher {
    /// Starts building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Receives one pushed message for `topic`.
    ///
    /// Fail-closed: any structural problem acknowledges and drops. Handler
    /// failures acknowledge and log. The returned [`Ack`] is always a
    /// success acknowledgement from the broker's point of view.
    pub async fn receive(&self, topic: Topic, payload: &[u8]) -> Ack {
        let envelope = match Envelope::from_json(payload) {
            Ok(env) => env,
            Err(err) => {
                warn!(
                    topic = %topic,
                    error = %err,
                    "malformed envelope dropped without retry"
                );
                return Ack::of(Disposition::DroppedMalformed);
            }
        };

        let Some(handler) = self.routes.get(&(topic, envelope.event_type)) else {
            debug!(
                topic = %topic,
                event_type = %envelope.event_type,
                event_id = %envelope.event_id,
                "no route for event, acknowledged"
            );
            return Ack::of(Disposition::NoRoute);
        };

        let outcome = std::panic::AssertUnwindSafe(handler.on_event(&envelope))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {
                debug!(
                    topic = %topic,
                    event_type = %envelope.event_type,
                    event_id = %envelope.event_id,
                    handler = handler.name(),
                    "event dispatched"
                );
                Ack::of(Disposition::Handled)
            }
            Ok(Err(err)) => {
                error!(
                    topic = %topic,
                    event_type = %envelope.event_type,
                    event_id = %envelope.event_id,
                    handler = handler.name(),
                    error = %err,
                    label = err.as_label(),
                    "handler failed, message acknowledged"
                );
                Ack::of(Disposition::HandlerFailed)
            }
            Err(panic_err) => {
                let info = panic_message(&panic_err);
                error!(
                    topic = %topic,
                    event_type = %envelope.event_type,
                    event_id = %envelope.event_id,
                    handler = handler.name(),
                    panic = %info,
                    "handler panicked, message acknowledged"
                );
                Ack::of(Disposition::HandlerFailed)
            }
        }
    }
}

fn panic_message(panic_err: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic_err.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic_err.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::HandlerError;
    use crate::events::TaskSnapshot;

    struct Counting {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Handle for Counting {
        async fn on_event(&self, _envelope: &Envelope) -> Result<(), HandlerError> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Failing;

    #[async_trait]
    impl Handle for Failing {
        async fn on_event(&self, _envelope: &Envelope) -> Result<(), HandlerError> {
            Err(HandlerError::InvalidSnapshot {
                reason: "boom".into(),
            })
        }
        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct Panicking;

    #[async_trait]
    impl Handle for Panicking {
        async fn on_event(&self, _envelope: &Envelope) -> Result<(), HandlerError> {
            panic!("handler exploded");
        }
        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn completed_payload() -> Vec<u8> {
        Envelope::new(
            EventType::Completed,
            TaskSnapshot::new(1, "u", "t"),
            "u",
        )
        .to_json()
        .unwrap()
    }

    #[tokio::test]
    async fn routes_by_topic_and_event_type() {
        let counting = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::builder()
            .on(EventType::Completed, counting.clone())
            .build();

        let ack = dispatcher
            .receive(Topic::TaskEvents, &completed_payload())
            .await;
        assert!(ack.is_handled());
        assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_acked_and_dropped() {
        let dispatcher = Dispatcher::builder().build();
        let ack = dispatcher
            .receive(Topic::TaskEvents, b"{ not json")
            .await;
        assert_eq!(ack.disposition, Disposition::DroppedMalformed);
    }

    #[tokio::test]
    async fn unrouted_event_is_acked() {
        let dispatcher = Dispatcher::builder().build();
        let ack = dispatcher
            .receive(Topic::TaskEvents, &completed_payload())
            .await;
        assert_eq!(ack.disposition, Disposition::NoRoute);
    }

    #[tokio::test]
    async fn handler_error_is_acked_not_retried() {
        let dispatcher = Dispatcher::builder()
            .on(EventType::Completed, Arc::new(Failing))
            .build();
        let ack = dispatcher
            .receive(Topic::TaskEvents, &completed_payload())
            .await;
        assert_eq!(ack.disposition, Disposition::HandlerFailed);
    }

    #[tokio::test]
    async fn handler_panic_is_isolated() {
        let counting = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::builder()
            .on(EventType::Completed, Arc::new(Panicking))
            .on(EventType::Created, counting.clone())
            .build();

        let ack = dispatcher
            .receive(Topic::TaskEvents, &completed_payload())
            .await;
        assert_eq!(ack.disposition, Disposition::HandlerFailed);

        // Dispatcher still serves other routes after a panic.
        let created = Envelope::new(EventType::Created, TaskSnapshot::new(2, "u", "t"), "u")
            .to_json()
            .unwrap();
        let ack = dispatcher.receive(Topic::TaskEvents, &created).await;
        assert!(ack.is_handled());
        assert_eq!(counting.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reminder_events_do_not_cross_topics() {
        let counting = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        let dispatcher = Dispatcher::builder()
            .on(EventType::Reminder, counting.clone())
            .build();

        let reminder = Envelope::new(EventType::Reminder, TaskSnapshot::new(3, "u", "t"), "u")
            .to_json()
            .unwrap();

        // Same payload on the wrong topic has no route.
        let ack = dispatcher.receive(Topic::TaskEvents, &reminder).await;
        assert_eq!(ack.disposition, Disposition::NoRoute);

        let ack = dispatcher.receive(Topic::Reminders, &reminder).await;
        assert!(ack.is_handled());
    }
}
