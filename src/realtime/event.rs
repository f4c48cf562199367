//! # Real-Time Events
//!
//! Chat and membership events. An `EventDraft` is what a session or client
//! hands to the dispatcher; a `ChatEvent` is what comes out the other side,
//! stamped and read-only. The only way to turn a draft into an event is
//! `EventDraft::stamp`, which is crate-private and called by the dispatcher
//! under its lock.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;

/// Kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Text message from a member
    Chat,
    /// Member joined the channel
    Joined,
    /// Member left the channel
    Left,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Chat => write!(f, "chat"),
            EventKind::Joined => write!(f, "joined"),
            EventKind::Left => write!(f, "left"),
        }
    }
}

/// An event that has not been stamped yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    kind: EventKind,
    sender: String,
    channel: String,
    text: String,
    candidate: Timestamp,
}

impl EventDraft {
    /// A chat message carrying the sender's last observed timestamp
    pub fn chat(
        channel: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
        candidate: Timestamp,
    ) -> Self {
        Self {
            kind: EventKind::Chat,
            sender: sender.into(),
            channel: channel.into(),
            text: text.into(),
            candidate,
        }
    }

    /// A synthesized join announcement
    pub fn joined(channel: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Joined,
            sender: sender.into(),
            channel: channel.into(),
            text: String::new(),
            candidate: Timestamp::ZERO,
        }
    }

    /// A synthesized leave announcement
    pub fn left(channel: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Left,
            sender: sender.into(),
            channel: channel.into(),
            text: String::new(),
            candidate: Timestamp::ZERO,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn candidate(&self) -> Timestamp {
        self.candidate
    }

    /// Freeze the draft with its assigned timestamp
    pub(crate) fn stamp(self, timestamp: Timestamp) -> ChatEvent {
        ChatEvent {
            kind: self.kind,
            sender: self.sender,
            channel: self.channel,
            text: self.text,
            timestamp,
        }
    }
}

/// A stamped event.
///
/// Fields are private and there are no setters: once stamped, the same
/// `Arc<ChatEvent>` is shared by every sink it is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    kind: EventKind,
    sender: String,
    channel: String,
    /// Empty for joined/left
    text: String,
    timestamp: Timestamp,
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Display for ChatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            EventKind::Chat => write!(
                f,
                "[{}] #{} {}: {}",
                self.timestamp, self.channel, self.sender, self.text
            ),
            EventKind::Joined | EventKind::Left => write!(
                f,
                "[{}] #{} {} {}",
                self.timestamp, self.channel, self.sender, self.kind
            ),
        }
    }
}
