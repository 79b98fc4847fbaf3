//! The store: ingress queue, reducer driver, and the public handle.
//!
//! # How It Works
//!
//! 1. [`Store::dispatch`] pushes updaters onto an unbounded channel (the
//!    ingress queue). Sends never block, so an updater is free to dispatch
//!    further updaters through a cloned handle; they line up behind whatever
//!    is already queued (mailbox semantics, no recursion).
//!
//! 2. A single driver task owns the state and applies one updater at a
//!    time: named-channel publish first, then the change-detection gate,
//!    then the emit through the subscriber hub.
//!
//! 3. The hub caches the latest emitted state. That cache backs
//!    [`Store::value`] and the synchronous replay every new subscriber
//!    receives.
//!
//! 4. A panicking updater or a failed workflow terminates the driver: all
//!    streams end, the error handler runs once, and the store accepts no
//!    further transitions.
//!
//! # Concurrency
//!
//! The driver is the only writer of state and of the replay cache; every
//! other component reads cloned snapshots. Workflows may be driven by real
//! concurrency; the ingress queue is where that concurrency collapses into
//! one ordered delivery sequence.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::error::{panic_message, StoreError};
use super::updater::Updater;
use crate::stream::{
    spawn_forwarder, NamedChannels, NamedStream, Path, SelectStream, StateStream, SubscriberHub,
    Workflow, WorkflowHandle,
};

/// The state value: an arbitrarily nested JSON tree.
///
/// Deep structural equality on this type is the comparison semantics used
/// throughout the pipeline.
pub type State = serde_json::Value;

/// Messages accepted by the reducer driver.
pub(crate) enum Ingress {
    /// Apply an updater to the current state.
    Apply(Updater),
    /// Terminate the pipeline with a workflow failure.
    Fail(StoreError),
}

/// Parts shared between store handles and the driver.
struct Shared {
    hub: SubscriberHub,
    named: NamedChannels,
}

/// A reactive state container.
///
/// One authoritative state value, advanced only by pure updaters, observed
/// through streams that replay the latest state to new subscribers.
///
/// Handles are cheap to clone and all point at the same pipeline. The driver
/// exits when every handle is dropped and the queue drains, or when the
/// pipeline fails.
///
/// # Example
///
/// ```rust,ignore
/// use rill_core::{Store, Updater};
/// use serde_json::json;
///
/// let store = Store::new(json!({ "foo": { "bar": "foobar" }, "baz": 42 }));
///
/// let update_baz = Updater::factory("updateBaz", |value: i64, mut state| {
///     state["baz"] = value.into();
///     state
/// });
///
/// store.dispatch(update_baz(7));
/// ```
#[derive(Clone)]
pub struct Store {
    ingress: mpsc::UnboundedSender<Ingress>,
    shared: Arc<Shared>,
}

impl Store {
    /// Create a store with `initial` as the current state.
    ///
    /// Pipeline failures are logged through `tracing`; use
    /// [`Store::with_error_handler`] to observe them programmatically.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime: the reducer driver is
    /// spawned at construction.
    pub fn new(initial: State) -> Self {
        Self::with_error_handler(initial, |err| {
            tracing::error!(error = %err, "state pipeline terminated");
        })
    }

    /// Create a store with a handler invoked at most once, if the pipeline
    /// terminates with an error.
    ///
    /// The handler observes the failure; it cannot resurrect the store.
    pub fn with_error_handler<H>(initial: State, on_error: H) -> Self
    where
        H: Fn(StoreError) + Send + 'static,
    {
        let (ingress, mailbox) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            hub: SubscriberHub::new(initial.clone()),
            named: NamedChannels::new(),
        });
        tokio::spawn(drive(initial, mailbox, Arc::clone(&shared), on_error));
        Self { ingress, shared }
    }

    /// The current state, read synchronously from the replay cache.
    pub fn value(&self) -> State {
        self.shared.hub.latest()
    }

    /// Subscribe to the full state.
    ///
    /// The stream delivers the latest state on its first poll, then every
    /// subsequent state with consecutive structural duplicates removed.
    pub fn subscribe(&self) -> StateStream {
        self.shared.hub.subscribe()
    }

    /// Derive a deduplicated stream of the value at `path`, compared with
    /// deep structural equality.
    ///
    /// A path that does not exist resolves to `Value::Null`; it never fails.
    pub fn select(&self, path: impl Into<Path>) -> SelectStream {
        self.select_with(path, |a: &State, b: &State| a == b)
    }

    /// Like [`Store::select`], with a caller-chosen equality predicate used
    /// to suppress duplicate emissions.
    pub fn select_with<C>(&self, path: impl Into<Path>, compare: C) -> SelectStream
    where
        C: Fn(&State, &State) -> bool + Send + Sync + 'static,
    {
        SelectStream::new(self.subscribe(), path.into(), Arc::new(compare))
    }

    /// Submit one updater to the ingress queue.
    ///
    /// Never blocks. Once the pipeline has terminated the updater is dropped
    /// and a debug event is logged.
    pub fn dispatch(&self, updater: Updater) {
        if self.ingress.send(Ingress::Apply(updater)).is_err() {
            tracing::debug!("dispatch after pipeline termination; updater dropped");
        }
    }

    /// Stream of the states produced by updaters named exactly `name`.
    ///
    /// Emits every time such an updater is processed, whether or not the
    /// state changed. No replay: processing is observed from subscription
    /// time onward.
    pub fn updaters(&self, name: &str) -> NamedStream {
        self.shared.named.subscribe(name)
    }

    /// Merge `workflows` and feed their updaters into the ingress queue.
    ///
    /// Returns without blocking on delivery. Each call adds an independent
    /// merged subscription; workflows from different calls are ordered
    /// relative to each other only by the ingress queue.
    pub fn combine_workflows<I>(&self, workflows: I) -> WorkflowHandle
    where
        I: IntoIterator<Item = Workflow>,
    {
        spawn_forwarder(workflows.into_iter().collect(), self.ingress.clone())
    }

    /// Number of live full-state subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.hub.subscriber_count()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.value())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// The reducer driver: folds updaters over the owned state until the queue
/// closes or the pipeline fails.
async fn drive<H>(
    mut state: State,
    mut mailbox: mpsc::UnboundedReceiver<Ingress>,
    shared: Arc<Shared>,
    on_error: H,
) where
    H: Fn(StoreError) + Send + 'static,
{
    while let Some(message) = mailbox.recv().await {
        let updater = match message {
            Ingress::Apply(updater) => updater,
            Ingress::Fail(err) => {
                terminate(&shared, &on_error, err);
                return;
            }
        };

        let name = updater.name_arc();
        let next = match panic::catch_unwind(AssertUnwindSafe(|| updater.apply(state.clone()))) {
            Ok(next) => next,
            Err(payload) => {
                let err = StoreError::UpdaterPanic {
                    name,
                    message: panic_message(payload.as_ref()),
                };
                terminate(&shared, &on_error, err);
                return;
            }
        };

        // Named observers see the result of their updater before the
        // downstream emit, independent of change detection.
        if let Some(name) = &name {
            shared.named.publish(name, &next);
        }

        if next != state {
            tracing::trace!(
                updater = name.as_deref().unwrap_or("<anonymous>"),
                "state emitted"
            );
            state = next;
            shared.hub.publish(state.clone());
        } else {
            tracing::trace!(
                updater = name.as_deref().unwrap_or("<anonymous>"),
                "state unchanged; emission suppressed"
            );
        }
    }
}

/// Shut the pipeline down: end every stream, then surface the error once.
fn terminate<H: Fn(StoreError)>(shared: &Shared, on_error: &H, err: StoreError) {
    tracing::debug!(error = %err, "terminating state pipeline");
    shared.hub.close();
    shared.named.close();
    on_error(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{FutureExt, StreamExt};
    use serde_json::json;

    #[tokio::test]
    async fn value_returns_the_initial_state_immediately() {
        let store = Store::new(json!({ "foo": { "bar": "foobar" }, "baz": 42 }));
        assert_eq!(store.value(), json!({ "foo": { "bar": "foobar" }, "baz": 42 }));
    }

    #[tokio::test]
    async fn dispatch_advances_the_state() {
        let store = Store::new(json!({ "count": 0 }));
        let mut stream = store.subscribe();
        assert_eq!(
            stream.next().now_or_never().flatten(),
            Some(json!({ "count": 0 }))
        );

        store.dispatch(Updater::new(|mut state| {
            state["count"] = 1.into();
            state
        }));

        assert_eq!(stream.next().await, Some(json!({ "count": 1 })));
        assert_eq!(store.value(), json!({ "count": 1 }));
    }

    #[tokio::test]
    async fn clones_share_the_pipeline() {
        let store = Store::new(json!(0));
        let clone = store.clone();

        let mut stream = store.subscribe();
        assert_eq!(stream.next().await, Some(json!(0)));

        clone.dispatch(Updater::new(|_| json!(1)));
        assert_eq!(stream.next().await, Some(json!(1)));
        assert_eq!(store.value(), json!(1));
    }

    #[tokio::test]
    async fn subscriber_count_tracks_live_streams() {
        let store = Store::new(json!(0));
        assert_eq!(store.subscriber_count(), 0);

        let a = store.subscribe();
        let b = store.subscribe();
        assert_eq!(store.subscriber_count(), 2);

        drop(b);
        // Pruning happens on the next publish.
        store.dispatch(Updater::new(|_| json!(1)));
        let mut a = a;
        assert_eq!(a.next().await, Some(json!(0)));
        assert_eq!(a.next().await, Some(json!(1)));
        assert_eq!(store.subscriber_count(), 1);
    }
}
