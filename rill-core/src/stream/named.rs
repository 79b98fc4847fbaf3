//! Named updater channels.
//!
//! Every time the reducer processes an updater that carries a name, it
//! publishes the resulting state on the channel registered for exactly that
//! name, before the state is emitted downstream and whether or not the
//! state actually changed.
//!
//! Named channels do not replay: a subscriber observes updaters processed
//! after it subscribed.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::store::State;

/// A stream of the states produced by updaters sharing one name.
///
/// Ends when the store's pipeline terminates.
pub struct NamedStream {
    inner: UnboundedReceiverStream<State>,
}

impl Stream for NamedStream {
    type Item = State;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<State>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Registry of named updater channels.
///
/// Subscribers touch the map from caller threads while the reducer driver
/// publishes, hence the concurrent map.
pub(crate) struct NamedChannels {
    channels: DashMap<Arc<str>, Vec<mpsc::UnboundedSender<State>>>,
    closed: AtomicBool,
}

impl NamedChannels {
    pub(crate) fn new() -> Self {
        Self {
            channels: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Register a subscriber for `name`.
    ///
    /// On a closed registry the sender is dropped immediately and the
    /// returned stream ends on its first poll.
    pub(crate) fn subscribe(&self, name: &str) -> NamedStream {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.closed.load(Ordering::Acquire) {
            self.channels.entry(Arc::from(name)).or_default().push(tx);
        }
        NamedStream {
            inner: UnboundedReceiverStream::new(rx),
        }
    }

    /// Publish the state produced by an updater named `name`, pruning
    /// subscribers whose stream has been dropped.
    pub(crate) fn publish(&self, name: &str, state: &State) {
        if let Some(mut senders) = self.channels.get_mut(name) {
            senders.retain(|tx| tx.send(state.clone()).is_ok());
        }
    }

    /// Drop every channel so all named streams end.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.channels.clear();
    }
}
