//! Lamport clocks
//!
//! `LamportClock` is the single server-side counter that stamps every event.
//! It is a plain value with no interior locking: the dispatcher owns it and
//! serializes every call to `stamp` under its own lock.
//!
//! `ObservedClock` is the client-side half. A client feeds it every timestamp
//! it receives and sends `candidate()` along with its next message, which is
//! what makes the server's stamp causally ordered after everything the client
//! has seen.

use super::timestamp::Timestamp;

/// The server's logical clock.
///
/// Starts at 0, is never reset, and only `stamp` mutates it.
#[derive(Debug, Default)]
pub struct LamportClock {
    counter: u64,
}

impl LamportClock {
    /// Create a clock at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a candidate timestamp and advance.
    ///
    /// If `candidate` is ahead of the counter the counter jumps to
    /// `candidate + 1`, otherwise it advances by one. The returned value is
    /// the new counter, which is also the timestamp assigned to the event.
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow `u64`. A clock that cannot advance
    /// can no longer order events, so there is nothing to recover to.
    pub fn stamp(&mut self, candidate: Timestamp) -> Timestamp {
        match self.try_stamp(candidate) {
            Some(ts) => ts,
            None => panic!("lamport clock overflow at {}", self.counter.max(candidate.value())),
        }
    }

    /// Like `stamp`, but returns `None` instead of panicking on overflow.
    ///
    /// The counter is left untouched when the merge would overflow.
    pub fn try_stamp(&mut self, candidate: Timestamp) -> Option<Timestamp> {
        let next = self.counter.max(candidate.value()).checked_add(1)?;
        self.counter = next;
        Some(Timestamp::new(next))
    }

    /// Current counter value, without advancing.
    pub fn current(&self) -> Timestamp {
        Timestamp::new(self.counter)
    }
}

/// Greatest timestamp a client has observed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObservedClock {
    max_seen: Timestamp,
}

impl ObservedClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received timestamp. Older values are ignored.
    pub fn observe(&mut self, ts: Timestamp) {
        if ts > self.max_seen {
            self.max_seen = ts;
        }
    }

    /// Candidate to attach to the next outgoing message.
    pub fn candidate(&self) -> Timestamp {
        self.max_seen
    }
}
