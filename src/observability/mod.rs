//! Observability subsystem for aerochat
//!
//! - Structured logging through `tracing`
//! - Typed lifecycle events
//! - Atomic counters
//!
//! # Usage
//!
//! ```ignore
//! use aerochat::observability::{init_logging, log_event, Event, LogFormat};
//!
//! init_logging(LogFormat::Json, "info")?;
//! log_event(Event::ServerStart);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{init_logging, LogFormat};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use thiserror::Error;

/// Observability error
///
/// Never fatal: a service that cannot log keeps serving.
#[derive(Debug, Clone, Error)]
#[error("AEROCHAT_OBSERVABILITY_FAILED: {message}")]
pub struct ObservabilityError {
    message: String,
}

impl ObservabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    if event.is_fatal() {
        tracing::error!(event = %event, "fatal");
    } else {
        tracing::info!(event = %event);
    }
}
