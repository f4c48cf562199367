//! # aerochat Real-Time Module
//!
//! Ordering and broadcast engine for channel chat.
//!
//! ## Architecture
//!
//! - **Registry**: channel -> subscribers, pure bookkeeping
//! - **Dispatcher**: stamps events with the Lamport clock and fans them out
//! - **Session**: per-client Joining -> Active -> Left lifecycle
//! - **Service**: the join/send verbs transports call into

pub mod dispatcher;
pub mod errors;
pub mod event;
pub mod registry;
pub mod service;
pub mod session;

pub use dispatcher::{DispatchReport, Dispatcher, DispatcherStats, Joined};
pub use errors::{RealtimeError, RealtimeResult};
pub use event::{ChatEvent, EventDraft, EventKind};
pub use registry::{ChannelRegistry, ChannelStats, EventReceiver, EventSender, SubscriptionHandle};
pub use service::{Ack, AckStatus, ChatService, SendMessage};
pub use session::{JoinedSession, Session, SessionState};
