//! Subscriber plumbing for the full-state stream.
//!
//! The hub is the replay cache of the pipeline: it multicasts every emitted
//! state to all live subscribers and caches exactly the latest one, so a
//! subscriber attaching at any point receives the current state on its first
//! poll, without waiting for a new update.
//!
//! # Single-writer invariant
//!
//! Only the reducer driver publishes. The hub lock is held for the duration
//! of a publish, so a concurrent subscribe observes either the state before
//! the publish or after it, never a gap or a duplicate.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::store::State;

/// Unique identifier for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// A stream of deduplicated state snapshots.
///
/// The latest state is delivered on the first poll; subsequent states arrive
/// as the reducer emits them. The stream ends when the store's pipeline
/// terminates.
pub struct StateStream {
    inner: UnboundedReceiverStream<State>,
}

impl StateStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<State>) -> Self {
        Self {
            inner: UnboundedReceiverStream::new(rx),
        }
    }
}

impl Stream for StateStream {
    type Item = State;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<State>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

struct HubInner {
    latest: State,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<State>)>,
    closed: bool,
}

/// Multicast hub with a last-value cache.
pub(crate) struct SubscriberHub {
    inner: Mutex<HubInner>,
}

impl SubscriberHub {
    /// Create a hub caching `initial` as the latest state.
    pub(crate) fn new(initial: State) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                latest: initial,
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// The latest emitted state.
    pub(crate) fn latest(&self) -> State {
        self.inner.lock().latest.clone()
    }

    /// Attach a subscriber.
    ///
    /// The cached state is pushed into the subscriber's channel before it
    /// becomes visible to publishes, so replay always precedes live states.
    /// On a closed hub the stream yields the cached state and then ends.
    pub(crate) fn subscribe(&self) -> StateStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        let _ = tx.send(inner.latest.clone());
        if !inner.closed {
            let id = SubscriberId::new();
            tracing::trace!(subscriber = id.0, "state subscriber attached");
            inner.subscribers.push((id, tx));
        }

        StateStream::new(rx)
    }

    /// Publish a new state: update the cache, fan out to subscribers, and
    /// prune the ones whose stream has been dropped.
    pub(crate) fn publish(&self, next: State) {
        let mut inner = self.inner.lock();
        inner.latest = next.clone();
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(next.clone()).is_ok());
    }

    /// Number of live subscribers.
    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Close the hub: drop every subscriber channel so their streams end.
    ///
    /// The cached state is kept; late subscribers still get it, followed by
    /// end-of-stream.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.subscribers.clear();
    }
}
