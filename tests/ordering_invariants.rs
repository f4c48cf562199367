//! Ordering Invariant Tests
//!
//! Tests for the broadcast engine's core guarantees:
//! - Lamport stamps are strictly increasing and causal
//! - Every subscriber sees the same event at the same timestamp
//! - Per-subscriber delivery order is timestamp order
//! - Channels are isolated from each other

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use aerochat::clock::{LamportClock, ObservedClock, Timestamp};
use aerochat::realtime::{
    ChatEvent, ChatService, Dispatcher, EventDraft, EventKind, EventReceiver, SendMessage,
};

fn drain(rx: &mut EventReceiver) -> Vec<Arc<ChatEvent>> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

fn chat(channel: &str, sender: &str, text: &str, ts: Timestamp) -> SendMessage {
    SendMessage {
        channel: channel.to_string(),
        sender: sender.to_string(),
        text: text.to_string(),
        timestamp: ts,
    }
}

// =============================================================================
// Clock Tests
// =============================================================================

/// The Lamport merge rule, case by case.
#[test]
fn test_lamport_merge_rule() {
    let mut clock = LamportClock::new();

    // candidate > counter: counter = candidate + 1
    assert_eq!(clock.stamp(Timestamp::new(5)), Timestamp::new(6));
    // candidate <= counter: counter + 1
    assert_eq!(clock.stamp(Timestamp::new(6)), Timestamp::new(7));
    assert_eq!(clock.stamp(Timestamp::new(0)), Timestamp::new(8));
    assert_eq!(clock.current(), Timestamp::new(8));
}

/// A message sent after observing an event is stamped after it,
/// even across channels.
#[test]
fn test_causal_order_across_channels() {
    let service = ChatService::default();
    let mut reader = service.join_channel("x", "reader").unwrap();

    for i in 0..10 {
        service
            .send_message(chat("x", "writer", &format!("m{}", i), Timestamp::ZERO))
            .unwrap();
    }

    let mut observed = ObservedClock::new();
    for event in drain(&mut reader.events) {
        observed.observe(event.timestamp());
    }

    let ack = service
        .send_message(chat("y", "reader", "reply", observed.candidate()))
        .unwrap();
    assert!(ack.timestamp.unwrap() > observed.candidate());
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Two members in one channel, one message, one departure.
#[test]
fn test_lobby_scenario() {
    let service = ChatService::default();

    let mut a = service.join_channel("lobby", "A").unwrap();
    let a_joined = drain(&mut a.events);
    assert_eq!(a_joined.len(), 1);
    assert_eq!(a_joined[0].kind(), EventKind::Joined);
    assert_eq!(a_joined[0].timestamp(), Timestamp::new(1));

    let mut b = service.join_channel("lobby", "B").unwrap();
    let a_saw = drain(&mut a.events);
    let b_saw = drain(&mut b.events);
    assert_eq!(a_saw.len(), 1);
    assert_eq!(b_saw.len(), 1);
    assert_eq!(a_saw[0].timestamp(), Timestamp::new(2));
    assert_eq!(a_saw[0], b_saw[0]);
    assert_eq!(b_saw[0].sender(), "B");

    let ack = a.session.send("hi", Timestamp::new(1)).unwrap();
    assert_eq!(ack.timestamp, Some(Timestamp::new(3)));
    let a_saw = drain(&mut a.events);
    let b_saw = drain(&mut b.events);
    assert_eq!(a_saw, b_saw);
    assert_eq!(a_saw[0].text(), "hi");
    assert_eq!(a_saw[0].timestamp(), Timestamp::new(3));

    // B disconnects
    drop(b);
    let a_saw = drain(&mut a.events);
    assert_eq!(a_saw.len(), 1);
    assert_eq!(a_saw[0].kind(), EventKind::Left);
    assert_eq!(a_saw[0].sender(), "B");
    assert_eq!(a_saw[0].timestamp(), Timestamp::new(4));
}

/// Events dispatched to one channel are never seen on another.
#[test]
fn test_channel_isolation() {
    let service = ChatService::default();
    let mut x = service.join_channel("x", "alice").unwrap();
    let mut y = service.join_channel("y", "bob").unwrap();
    drain(&mut x.events);
    drain(&mut y.events);

    service.send_message(chat("x", "alice", "only x", Timestamp::ZERO)).unwrap();

    assert_eq!(drain(&mut x.events).len(), 1);
    assert!(drain(&mut y.events).is_empty());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// Many concurrent senders: every subscriber sees every message once, in
/// strictly increasing timestamp order, and all see the same sequence.
#[test]
fn test_concurrent_senders_single_order() {
    const SENDERS: usize = 8;
    const PER_SENDER: usize = 200;

    let dispatcher = Arc::new(Dispatcher::default());
    let mut watchers: Vec<EventReceiver> = (0..3)
        .map(|i| dispatcher.join("room", &format!("watcher-{}", i)).unwrap().events)
        .collect();
    for rx in &mut watchers {
        drain(rx);
    }

    let handles: Vec<_> = (0..SENDERS)
        .map(|s| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for i in 0..PER_SENDER {
                    dispatcher
                        .dispatch(EventDraft::chat(
                            "room",
                            format!("sender-{}", s),
                            format!("{}", i),
                            Timestamp::ZERO,
                        ))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let sequences: Vec<Vec<Timestamp>> = watchers
        .iter_mut()
        .map(|rx| drain(rx).iter().map(|e| e.timestamp()).collect())
        .collect();

    for seq in &sequences {
        assert_eq!(seq.len(), SENDERS * PER_SENDER);
        assert!(seq.windows(2).all(|w| w[0] < w[1]));
    }
    assert_eq!(sequences[0], sequences[1]);
    assert_eq!(sequences[1], sequences[2]);
}

/// Joins and leaves racing with dispatches: no sink ever gets a duplicate or
/// an out-of-order event, and no two events share a timestamp.
#[test]
fn test_membership_churn_during_dispatch() {
    let dispatcher = Arc::new(Dispatcher::default());
    let mut anchor = dispatcher.join("room", "anchor").unwrap();

    let churn = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || {
            let mut seen = Vec::new();
            for i in 0..200 {
                let mut joined = dispatcher.join("room", &format!("guest-{}", i)).unwrap();
                dispatcher.leave("room", joined.handle).unwrap();
                seen.push(drain(&mut joined.events));
            }
            seen
        })
    };

    let sender = {
        let dispatcher = Arc::clone(&dispatcher);
        thread::spawn(move || {
            for i in 0..500 {
                dispatcher
                    .dispatch(EventDraft::chat("room", "anchor", format!("{}", i), Timestamp::ZERO))
                    .unwrap();
            }
        })
    };

    let guest_views = churn.join().unwrap();
    sender.join().unwrap();

    let anchor_view = drain(&mut anchor.events);
    let stamps: Vec<Timestamp> = anchor_view.iter().map(|e| e.timestamp()).collect();
    assert!(stamps.windows(2).all(|w| w[0] < w[1]));

    // anchor saw its own join, 500 chats, 200 joins and 200 leaves
    assert_eq!(anchor_view.len(), 1 + 500 + 200 + 200);

    let unique: HashSet<Timestamp> = stamps.iter().copied().collect();
    assert_eq!(unique.len(), stamps.len());

    for view in guest_views {
        // Each guest saw its own join first, and nothing after its leave
        assert_eq!(view[0].kind(), EventKind::Joined);
        assert!(view.iter().all(|e| e.kind() != EventKind::Left));
        assert!(view.windows(2).all(|w| w[0].timestamp() < w[1].timestamp()));
    }
}
