//! # Channel Registry
//!
//! Channel name -> subscribers. Pure bookkeeping with no locking of its own;
//! the dispatcher owns the registry and serializes every call to it together
//! with the clock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::event::ChatEvent;

/// Event sink for one subscriber
pub type EventSender = mpsc::UnboundedSender<Arc<ChatEvent>>;

/// Receiving end of a subscriber's sink
pub type EventReceiver = mpsc::UnboundedReceiver<Arc<ChatEvent>>;

/// Identifies one subscriber for later removal.
///
/// Handles are issued from a registry-wide counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One member of one channel
#[derive(Debug)]
pub struct Subscriber {
    /// Removal handle
    pub handle: SubscriptionHandle,

    /// Display name of the member
    pub sender: String,

    /// Delivery sink
    sink: EventSender,
}

impl Subscriber {
    /// Clone of the delivery sink
    pub fn sink(&self) -> EventSender {
        self.sink.clone()
    }
}

/// Per-channel subscriber count
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelStats {
    pub name: String,
    pub subscribers: usize,
}

/// Registry of channels and their subscribers
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Subscribers by channel name, in insertion order
    channels: HashMap<String, Vec<Subscriber>>,

    /// Next handle to issue
    next_handle: u64,
}

impl ChannelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber, creating the channel on first use
    pub fn subscribe(&mut self, channel: &str, sender: &str, sink: EventSender) -> SubscriptionHandle {
        self.next_handle += 1;
        let handle = SubscriptionHandle(self.next_handle);

        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(Subscriber {
                handle,
                sender: sender.to_string(),
                sink,
            });

        handle
    }

    /// Remove exactly the subscriber with `handle`.
    ///
    /// Returns `None` if it was already removed. Channels left empty are pruned.
    pub fn unsubscribe(&mut self, channel: &str, handle: SubscriptionHandle) -> Option<Subscriber> {
        let subscribers = self.channels.get_mut(channel)?;
        let position = subscribers.iter().position(|s| s.handle == handle)?;
        let removed = subscribers.remove(position);

        if subscribers.is_empty() {
            self.channels.remove(channel);
        }

        Some(removed)
    }

    /// Snapshot of the channel's sinks. Empty for unknown channels.
    pub fn list(&self, channel: &str) -> Vec<EventSender> {
        self.channels
            .get(channel)
            .map(|subs| subs.iter().map(Subscriber::sink).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the channel's member names
    pub fn members(&self, channel: &str) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|subs| subs.iter().map(|s| s.sender.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether `handle` is still subscribed to `channel`
    pub fn contains(&self, channel: &str, handle: SubscriptionHandle) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|subs| subs.iter().any(|s| s.handle == handle))
    }

    /// Subscriber counts for every non-empty channel, sorted by name
    pub fn channels(&self) -> Vec<ChannelStats> {
        let mut stats: Vec<ChannelStats> = self
            .channels
            .iter()
            .map(|(name, subs)| ChannelStats {
                name: name.clone(),
                subscribers: subs.len(),
            })
            .collect();
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }

    /// Total subscribers across all channels
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> (EventSender, EventReceiver) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn test_subscribe_creates_channel() {
        let mut registry = ChannelRegistry::new();
        assert!(registry.list("lobby").is_empty());

        let (tx, _rx) = sink();
        registry.subscribe("lobby", "alice", tx);

        assert_eq!(registry.list("lobby").len(), 1);
        assert_eq!(registry.members("lobby"), vec!["alice"]);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut registry = ChannelRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();

        let h1 = registry.subscribe("lobby", "alice", tx1);
        let h2 = registry.subscribe("lobby", "alice", tx2);
        assert_ne!(h1, h2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unsubscribe_removes_exactly_one() {
        let mut registry = ChannelRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();

        let h1 = registry.subscribe("lobby", "alice", tx1);
        let h2 = registry.subscribe("lobby", "bob", tx2);

        let removed = registry.unsubscribe("lobby", h1).unwrap();
        assert_eq!(removed.sender, "alice");
        assert!(!registry.contains("lobby", h1));
        assert!(registry.contains("lobby", h2));
        assert_eq!(registry.members("lobby"), vec!["bob"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut registry = ChannelRegistry::new();
        let (tx, _rx) = sink();
        let handle = registry.subscribe("lobby", "alice", tx);

        assert!(registry.unsubscribe("lobby", handle).is_some());
        assert!(registry.unsubscribe("lobby", handle).is_none());
        assert!(registry.unsubscribe("nowhere", handle).is_none());
    }

    #[test]
    fn test_empty_channel_is_pruned() {
        let mut registry = ChannelRegistry::new();
        let (tx, _rx) = sink();
        let handle = registry.subscribe("lobby", "alice", tx);

        registry.unsubscribe("lobby", handle);
        assert!(registry.is_empty());
        assert!(registry.list("lobby").is_empty());
        assert!(registry.channels().is_empty());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut registry = ChannelRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();

        registry.subscribe("lobby", "alice", tx1);
        let snapshot = registry.list("lobby");
        registry.subscribe("lobby", "bob", tx2);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.list("lobby").len(), 2);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut registry = ChannelRegistry::new();
        let (tx1, _rx1) = sink();
        let (tx2, _rx2) = sink();

        registry.subscribe("x", "alice", tx1);
        registry.subscribe("y", "bob", tx2);

        assert_eq!(
            registry.channels(),
            vec![
                ChannelStats { name: "x".into(), subscribers: 1 },
                ChannelStats { name: "y".into(), subscribers: 1 },
            ]
        );
        assert_eq!(registry.members("x"), vec!["alice"]);
    }
}
