//! Observability events for aerochat
//!
//! Every lifecycle point worth a log line has a typed event here. The event
//! name goes into the `event` field of the tracing record.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Process startup begins
    ServerStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Listener bound, ready to accept sessions
    Serving,
    /// Shutdown initiated
    ShutdownStart,
    /// Shutdown complete
    ShutdownComplete,

    // Sessions
    /// A session joined a channel
    SessionJoined,
    /// A session left a channel
    SessionLeft,
    /// A transport error ended a session
    SessionTransportError,

    // Messages
    /// A chat message was stamped and broadcast
    MessageAccepted,
    /// A request was refused
    MessageRejected,
    /// A sink was already closed when an event was pushed to it
    DeliveryDropped,

    // Invariants
    /// Clock or registry invariant broken (FATAL)
    InvariantViolation,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ServerStart => "AEROCHAT_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::Serving => "AEROCHAT_SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::SessionJoined => "SESSION_JOINED",
            Event::SessionLeft => "SESSION_LEFT",
            Event::SessionTransportError => "SESSION_TRANSPORT_ERROR",

            Event::MessageAccepted => "MESSAGE_ACCEPTED",
            Event::MessageRejected => "MESSAGE_REJECTED",
            Event::DeliveryDropped => "DELIVERY_DROPPED",

            Event::InvariantViolation => "INVARIANT_VIOLATION",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::InvariantViolation)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
