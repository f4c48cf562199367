//! # Chat Service
//!
//! The two verbs the transport layer calls into:
//!
//! - `join_channel`: open a session and its event stream
//! - `send_message`: stamp and broadcast one chat message, answer with one ack

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::dispatcher::{DispatchReport, Dispatcher, DispatcherStats};
use super::errors::RealtimeResult;
use super::event::EventDraft;
use super::session::{JoinedSession, Session};
use crate::clock::{LamportClock, Timestamp};
use crate::observability::{Event, MetricsRegistry};

/// A chat message submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub channel: String,
    pub sender: String,
    pub text: String,
    /// Greatest timestamp the sender has observed
    #[serde(default)]
    pub timestamp: Timestamp,
}

/// Status of an acknowledged request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    /// Stamped and broadcast
    Accepted,
    /// The sending session has already left
    Closed,
}

/// The single response to a send, addressed to the sender only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub status: AckStatus,
    /// Timestamp assigned to the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Subscribers the message was pushed to
    #[serde(default)]
    pub recipients: usize,
}

impl Ack {
    pub fn accepted(report: &DispatchReport) -> Self {
        Self {
            status: AckStatus::Accepted,
            timestamp: Some(report.timestamp()),
            recipients: report.delivered,
        }
    }

    pub fn closed() -> Self {
        Self {
            status: AckStatus::Closed,
            timestamp: None,
            recipients: 0,
        }
    }
}

/// Entry point for transports
#[derive(Debug, Clone)]
pub struct ChatService {
    dispatcher: Arc<Dispatcher>,
}

impl Default for ChatService {
    fn default() -> Self {
        Self::new(Arc::new(MetricsRegistry::new()))
    }
}

impl ChatService {
    /// Create a service with a fresh clock
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self::with_dispatcher(Arc::new(Dispatcher::with_metrics(LamportClock::new(), metrics)))
    }

    /// Create a service over an existing dispatcher
    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Join `channel` as `sender`.
    ///
    /// The returned stream starts with this session's own `Joined` event and
    /// ends when the session leaves.
    pub fn join_channel(&self, channel: &str, sender: &str) -> RealtimeResult<JoinedSession> {
        Session::join(Arc::clone(&self.dispatcher), channel, sender)
    }

    /// Broadcast one chat message.
    ///
    /// Sending to a channel nobody has joined is accepted with zero recipients.
    pub fn send_message(&self, message: SendMessage) -> RealtimeResult<Ack> {
        let report = self.dispatcher.dispatch(EventDraft::chat(
            message.channel,
            message.sender,
            message.text,
            message.timestamp,
        ))?;
        self.dispatcher.metrics().increment_messages_accepted();

        debug!(
            event = %Event::MessageAccepted,
            channel = report.event.channel(),
            timestamp = report.timestamp().value(),
            recipients = report.delivered,
            "message accepted"
        );
        Ok(Ack::accepted(&report))
    }

    /// Clock value and channel membership counts
    pub fn stats(&self) -> RealtimeResult<DispatcherStats> {
        self.dispatcher.stats()
    }
}
