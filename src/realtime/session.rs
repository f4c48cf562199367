//! # Session Lifecycle
//!
//! One client's membership in one channel: Joining -> Active -> Left.
//!
//! Transitions take the session's state lock before the dispatcher lock, and
//! `send` holds the state lock across its dispatch. A chat from this session
//! therefore can never be stamped after this session's `Left` event.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info};
use uuid::Uuid;

use super::dispatcher::{DispatchReport, Dispatcher};
use super::errors::{RealtimeError, RealtimeResult};
use super::event::EventDraft;
use super::registry::{EventReceiver, SubscriptionHandle};
use super::service::Ack;
use crate::clock::Timestamp;
use crate::observability::Event;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet subscribed
    Joining,
    /// Subscribed under the given handle
    Active(SubscriptionHandle),
    /// Terminal
    Left,
}

/// A client's membership in one channel.
///
/// Dropping an active session leaves the channel.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    channel: String,
    sender: String,
    state: Mutex<SessionState>,
    dispatcher: Arc<Dispatcher>,
}

/// A session together with its delivery stream
#[derive(Debug)]
pub struct JoinedSession {
    pub session: Session,
    pub events: EventReceiver,
}

impl Session {
    /// Create a session in `Joining`
    pub fn new(dispatcher: Arc<Dispatcher>, channel: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            sender: sender.into(),
            state: Mutex::new(SessionState::Joining),
            dispatcher,
        }
    }

    /// Create a session and join it in one step
    pub fn join(
        dispatcher: Arc<Dispatcher>,
        channel: impl Into<String>,
        sender: impl Into<String>,
    ) -> RealtimeResult<JoinedSession> {
        let session = Self::new(dispatcher, channel, sender);
        let events = session.activate()?;
        Ok(JoinedSession { session, events })
    }

    /// Joining -> Active: subscribe and announce.
    ///
    /// A failed join moves the session straight to `Left`.
    pub fn activate(&self) -> RealtimeResult<EventReceiver> {
        let mut state = self.lock_state()?;
        if *state != SessionState::Joining {
            return Err(RealtimeError::SessionClosed(self.channel.clone()));
        }

        match self.dispatcher.join(&self.channel, &self.sender) {
            Ok(joined) => {
                *state = SessionState::Active(joined.handle);
                info!(
                    event = %Event::SessionJoined,
                    session_id = %self.id,
                    channel = %self.channel,
                    sender = %self.sender,
                    timestamp = joined.report.timestamp().value(),
                    "session joined"
                );
                Ok(joined.events)
            }
            Err(e) => {
                *state = SessionState::Left;
                Err(e)
            }
        }
    }

    /// Forward a chat message from this session.
    ///
    /// Refused with a closed ack once the session is no longer active.
    pub fn send(&self, text: impl Into<String>, candidate: Timestamp) -> RealtimeResult<Ack> {
        let state = self.lock_state()?;
        if !matches!(*state, SessionState::Active(_)) {
            return Ok(Ack::closed());
        }

        let report = self
            .dispatcher
            .dispatch(EventDraft::chat(&self.channel, &self.sender, text, candidate))?;
        self.dispatcher.metrics().increment_messages_accepted();
        Ok(Ack::accepted(&report))
    }

    /// Active -> Left: unsubscribe and announce.
    ///
    /// Safe to call any number of times from any number of termination paths;
    /// only the first call has an effect.
    pub fn leave(&self) -> RealtimeResult<Option<DispatchReport>> {
        let mut state = self.lock_state()?;
        let previous = std::mem::replace(&mut *state, SessionState::Left);

        let SessionState::Active(handle) = previous else {
            return Ok(None);
        };

        let report = self.dispatcher.leave(&self.channel, handle)?;
        info!(
            event = %Event::SessionLeft,
            session_id = %self.id,
            channel = %self.channel,
            sender = %self.sender,
            timestamp = report.as_ref().map(|r| r.timestamp().value()),
            "session left"
        );
        Ok(report)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Current state.
    ///
    /// A poisoned state lock reads as `Left`: the session can no longer send
    /// or leave through this handle.
    pub fn state(&self) -> SessionState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(_) => {
                error!(
                    event = %Event::InvariantViolation,
                    session_id = %self.id,
                    channel = %self.channel,
                    "session state lock poisoned"
                );
                SessionState::Left
            }
        }
    }

    fn lock_state(&self) -> RealtimeResult<MutexGuard<'_, SessionState>> {
        self.state.lock().map_err(|_| {
            error!(event = %Event::InvariantViolation, session_id = %self.id, "session state lock poisoned");
            RealtimeError::Internal(format!("session {} state lock poisoned", self.id))
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            error!(session_id = %self.id, error = %e, "failed to leave channel on drop");
        }
    }
}
