//! # Event Dispatcher
//!
//! Stamps events and fans them out to every current subscriber of a channel.
//!
//! ## Ordering
//!
//! The clock and the registry live behind one mutex. Stamping, taking the
//! subscriber snapshot and pushing into each sink all happen in the same
//! critical section. Sinks are unbounded, so a push never waits on a slow
//! reader, and every sink receives events in stamp order.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error};

use super::errors::{RealtimeError, RealtimeResult};
use super::event::{ChatEvent, EventDraft};
use super::registry::{ChannelRegistry, ChannelStats, EventReceiver, SubscriptionHandle};
use crate::clock::{LamportClock, Timestamp};
use crate::observability::{Event, MetricsRegistry};

/// State guarded by the dispatcher lock
#[derive(Debug)]
struct Core {
    clock: LamportClock,
    registry: ChannelRegistry,
}

impl Core {
    /// Stamp `draft` and push it to every sink subscribed right now.
    ///
    /// Runs under the dispatcher lock, so an exhausted clock is returned as an
    /// error rather than a panic that would poison the lock.
    fn fan_out(&mut self, draft: EventDraft) -> RealtimeResult<DispatchReport> {
        let timestamp = self.clock.try_stamp(draft.candidate()).ok_or_else(|| {
            error!(
                event = %Event::InvariantViolation,
                clock = self.clock.current().value(),
                candidate = draft.candidate().value(),
                "lamport clock exhausted"
            );
            RealtimeError::Internal("lamport clock exhausted".into())
        })?;
        let event = Arc::new(draft.stamp(timestamp));
        let sinks = self.registry.list(event.channel());

        let mut report = DispatchReport {
            event: Arc::clone(&event),
            recipients: sinks.len(),
            delivered: 0,
            dropped: 0,
        };

        for sink in sinks {
            // A closed sink belongs to a session that is on its way out
            match sink.send(Arc::clone(&event)) {
                Ok(()) => report.delivered += 1,
                Err(_) => report.dropped += 1,
            }
        }

        Ok(report)
    }
}

/// Result of dispatching one event
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// The stamped event as delivered
    pub event: Arc<ChatEvent>,
    /// Subscribers in the snapshot
    pub recipients: usize,
    /// Sinks that accepted the event
    pub delivered: usize,
    /// Sinks already closed
    pub dropped: usize,
}

impl DispatchReport {
    /// Timestamp assigned to the event
    pub fn timestamp(&self) -> Timestamp {
        self.event.timestamp()
    }
}

/// Outcome of a successful join
#[derive(Debug)]
pub struct Joined {
    /// Handle for the later leave
    pub handle: SubscriptionHandle,
    /// The new subscriber's delivery stream
    pub events: EventReceiver,
    /// Dispatch of the `Joined` announcement
    pub report: DispatchReport,
}

/// Clock and membership overview
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatcherStats {
    /// Current clock value
    pub clock: Timestamp,
    /// Non-empty channels
    pub channels: Vec<ChannelStats>,
}

/// Stamps and fans out events
#[derive(Debug)]
pub struct Dispatcher {
    core: Mutex<Core>,
    metrics: Arc<MetricsRegistry>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(LamportClock::new())
    }
}

impl Dispatcher {
    /// Create a dispatcher that takes ownership of `clock`
    pub fn new(clock: LamportClock) -> Self {
        Self::with_metrics(clock, Arc::new(MetricsRegistry::new()))
    }

    /// Create a dispatcher reporting into a shared metrics registry
    pub fn with_metrics(clock: LamportClock, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            core: Mutex::new(Core {
                clock,
                registry: ChannelRegistry::new(),
            }),
            metrics,
        }
    }

    /// Metrics this dispatcher reports into
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    fn lock(&self) -> RealtimeResult<MutexGuard<'_, Core>> {
        self.core.lock().map_err(|_| {
            error!("dispatcher lock poisoned; clock and registry are no longer trustworthy");
            RealtimeError::Internal("Lock poisoned".into())
        })
    }

    /// Stamp `draft` and deliver it to every current subscriber of its channel.
    ///
    /// A channel nobody has joined is a no-op broadcast, not an error. The
    /// draft is checked before the lock is taken: blank names and candidates
    /// above `Timestamp::MAX_CANDIDATE` are refused and nothing is stamped.
    pub fn dispatch(&self, draft: EventDraft) -> RealtimeResult<DispatchReport> {
        validate_name(draft.channel()).map_err(RealtimeError::InvalidChannel)?;
        validate_name(draft.sender()).map_err(RealtimeError::InvalidSender)?;
        validate_candidate(draft.candidate())?;

        let report = self.lock()?.fan_out(draft)?;
        self.record(&report);
        Ok(report)
    }

    /// Subscribe `sender` to `channel` and announce it.
    ///
    /// The subscribe and the `Joined` dispatch happen under one lock, so the
    /// new member is in the snapshot for its own announcement and no other
    /// event can be stamped in between.
    pub fn join(&self, channel: &str, sender: &str) -> RealtimeResult<Joined> {
        validate_name(channel).map_err(RealtimeError::InvalidChannel)?;
        validate_name(sender).map_err(RealtimeError::InvalidSender)?;

        let (tx, events) = tokio::sync::mpsc::unbounded_channel();
        let (handle, report) = {
            let mut core = self.lock()?;
            let handle = core.registry.subscribe(channel, sender, tx);
            match core.fan_out(EventDraft::joined(channel, sender)) {
                Ok(report) => (handle, report),
                Err(e) => {
                    core.registry.unsubscribe(channel, handle);
                    return Err(e);
                }
            }
        };

        self.metrics.increment_sessions_joined();
        self.record(&report);
        Ok(Joined {
            handle,
            events,
            report,
        })
    }

    /// Unsubscribe `handle` and announce the departure to the remaining members.
    ///
    /// Returns `None` when the handle was already removed: no event is stamped.
    pub fn leave(&self, channel: &str, handle: SubscriptionHandle) -> RealtimeResult<Option<DispatchReport>> {
        let report = {
            let mut core = self.lock()?;
            match core.registry.unsubscribe(channel, handle) {
                Some(subscriber) => Some(core.fan_out(EventDraft::left(channel, subscriber.sender))?),
                None => None,
            }
        };

        if let Some(report) = &report {
            self.metrics.increment_sessions_left();
            self.record(report);
        }
        Ok(report)
    }

    /// Member names of `channel`
    pub fn members(&self, channel: &str) -> RealtimeResult<Vec<String>> {
        Ok(self.lock()?.registry.members(channel))
    }

    /// Whether `handle` is still a member of `channel`
    pub fn is_subscribed(&self, channel: &str, handle: SubscriptionHandle) -> RealtimeResult<bool> {
        Ok(self.lock()?.registry.contains(channel, handle))
    }

    /// Clock value and per-channel counts, read at one instant
    pub fn stats(&self) -> RealtimeResult<DispatcherStats> {
        let core = self.lock()?;
        Ok(DispatcherStats {
            clock: core.clock.current(),
            channels: core.registry.channels(),
        })
    }

    fn record(&self, report: &DispatchReport) {
        self.metrics.increment_events_stamped();
        self.metrics.add_deliveries(report.delivered as u64);
        self.metrics.add_deliveries_dropped(report.dropped as u64);

        if report.dropped > 0 {
            debug!(
                event = %Event::DeliveryDropped,
                channel = report.event.channel(),
                timestamp = report.timestamp().value(),
                dropped = report.dropped,
                "sinks already closed"
            );
        }

        debug!(
            channel = report.event.channel(),
            sender = report.event.sender(),
            kind = %report.event.kind(),
            timestamp = report.timestamp().value(),
            recipients = report.recipients,
            dropped = report.dropped,
            "dispatched event"
        );
    }
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        Err(name.to_string())
    } else {
        Ok(())
    }
}

fn validate_candidate(candidate: Timestamp) -> RealtimeResult<()> {
    if candidate > Timestamp::MAX_CANDIDATE {
        return Err(RealtimeError::InvalidMessage(format!(
            "timestamp {} exceeds the largest accepted candidate {}",
            candidate,
            Timestamp::MAX_CANDIDATE
        )));
    }
    Ok(())
}
