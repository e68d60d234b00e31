//! Broker topics carrying subsystem events.
//!
//! Two topics exist: task state changes and reminders. The mapping from
//! event type to topic is static; the *names* of the topics are deployment
//! configuration ([`Config::topic_name`](crate::Config::topic_name)).

/// Logical broker topic.
///
/// The receive surface is keyed by this enum — deployment tooling maps one
/// push route per topic onto [`Dispatcher::receive`](crate::Dispatcher::receive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `created` / `updated` / `completed` / `deleted` events.
    TaskEvents,
    /// `reminder` events.
    Reminders,
}

impl Topic {
    /// Returns the default topic name (snake-case wire convention).
    pub fn default_name(&self) -> &'static str {
        match self {
            Topic::TaskEvents => "task-events",
            Topic::Reminders => "reminders",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}
