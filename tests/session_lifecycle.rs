//! Session Lifecycle Tests
//!
//! Racing termination paths against each other and against sends:
//! - Exactly one `Left` per session, whichever path gets there first
//! - No chat from a session is stamped after its `Left`

use std::sync::Arc;
use std::thread;

use aerochat::clock::Timestamp;
use aerochat::realtime::{AckStatus, ChatEvent, Dispatcher, EventKind, EventReceiver, Session, SessionState};

fn drain(rx: &mut EventReceiver) -> Vec<Arc<ChatEvent>> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

#[test]
fn test_concurrent_leave_emits_one_left() {
    let dispatcher = Arc::new(Dispatcher::default());
    let mut watcher = Session::join(Arc::clone(&dispatcher), "room", "watcher").unwrap();

    for round in 0..50 {
        let joined = Session::join(Arc::clone(&dispatcher), "room", format!("guest-{}", round)).unwrap();
        let session = Arc::new(joined.session);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = Arc::clone(&session);
                thread::spawn(move || session.leave().unwrap().is_some())
            })
            .collect();

        let effective = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|left| *left)
            .count();
        assert_eq!(effective, 1);
        assert_eq!(session.state(), SessionState::Left);
    }

    let lefts = drain(&mut watcher.events)
        .into_iter()
        .filter(|e| e.kind() == EventKind::Left)
        .count();
    assert_eq!(lefts, 50);
    assert_eq!(dispatcher.members("room").unwrap(), vec!["watcher"]);
}

#[test]
fn test_no_chat_after_left() {
    let dispatcher = Arc::new(Dispatcher::default());
    let mut watcher = Session::join(Arc::clone(&dispatcher), "room", "watcher").unwrap();

    let chatty = Session::join(Arc::clone(&dispatcher), "room", "chatty").unwrap();
    let session = Arc::new(chatty.session);

    let sender = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            let mut closed = 0;
            for i in 0..1_000 {
                let ack = session.send(format!("{}", i), Timestamp::ZERO).unwrap();
                if ack.status == AckStatus::Closed {
                    closed += 1;
                }
            }
            closed
        })
    };

    thread::yield_now();
    session.leave().unwrap();
    let closed = sender.join().unwrap();

    let events: Vec<_> = drain(&mut watcher.events)
        .into_iter()
        .filter(|e| e.sender() == "chatty")
        .collect();

    let left_at = events
        .iter()
        .position(|e| e.kind() == EventKind::Left)
        .expect("chatty never left");
    assert_eq!(left_at, events.len() - 1);

    // joined + accepted chats + left
    let chats = events.iter().filter(|e| e.kind() == EventKind::Chat).count();
    assert_eq!(chats + closed, 1_000);
}

#[test]
fn test_drop_is_a_termination_path() {
    let dispatcher = Arc::new(Dispatcher::default());
    let mut watcher = Session::join(Arc::clone(&dispatcher), "room", "watcher").unwrap();

    {
        let guest = Session::join(Arc::clone(&dispatcher), "room", "guest").unwrap();
        guest.session.leave().unwrap();
        // dropped here after an explicit leave
    }

    let lefts: Vec<_> = drain(&mut watcher.events)
        .into_iter()
        .filter(|e| e.kind() == EventKind::Left)
        .collect();
    assert_eq!(lefts.len(), 1);
    assert_eq!(lefts[0].sender(), "guest");
    assert_eq!(dispatcher.metrics().active_sessions(), 1);
}

#[test]
fn test_leave_before_join_is_noop() {
    let dispatcher = Arc::new(Dispatcher::default());
    let session = Session::new(Arc::clone(&dispatcher), "room", "ghost");

    assert!(session.leave().unwrap().is_none());
    assert_eq!(session.state(), SessionState::Left);
    assert!(session.activate().is_err());
    assert_eq!(dispatcher.stats().unwrap().clock, Timestamp::ZERO);
}
