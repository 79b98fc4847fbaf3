//! Selector streams.
//!
//! A selector narrows the full-state stream to the value at one key path and
//! suppresses consecutive duplicates under an equality of the caller's
//! choosing. Deduplication is applied to the *selected* value, so a change
//! elsewhere in the state tree never re-triggers an unrelated selector.
//!
//! The default equality is deep structural equality. A custom predicate can
//! widen it, for example to treat floating-point jitter below some epsilon
//! as "no change".

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::Value;

use super::path::Path;
use super::subscriber::StateStream;
use crate::store::State;

/// Equality predicate used to suppress duplicate selector emissions.
///
/// Returns `true` when the two values should be considered equal.
pub type CompareFn = Arc<dyn Fn(&State, &State) -> bool + Send + Sync>;

/// A deduplicated stream of the values found at one path of the state.
///
/// The first item is resolved from the replayed current state, so a selector
/// always starts with a value. A path that does not exist in a given state
/// resolves to `Value::Null` rather than failing. The stream ends when the
/// store's pipeline terminates.
pub struct SelectStream {
    source: StateStream,
    path: Path,
    compare: CompareFn,
    last: Option<State>,
}

impl SelectStream {
    pub(crate) fn new(source: StateStream, path: Path, compare: CompareFn) -> Self {
        Self {
            source,
            path,
            compare,
            last: None,
        }
    }

    /// The path this selector resolves.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Stream for SelectStream {
    type Item = State;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<State>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Ready(Some(state)) => {
                    let value = this.path.resolve(&state).cloned().unwrap_or(Value::Null);
                    let changed = match &this.last {
                        Some(previous) => !(this.compare)(previous, &value),
                        None => true,
                    };
                    if changed {
                        this.last = Some(value.clone());
                        return Poll::Ready(Some(value));
                    }
                    // Equal under the selector's equality; keep draining.
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::subscriber::SubscriberHub;
    use futures_util::{FutureExt, StreamExt};
    use serde_json::json;

    fn deep_equality() -> CompareFn {
        Arc::new(|a: &State, b: &State| a == b)
    }

    fn select(hub: &SubscriberHub, path: impl Into<Path>) -> SelectStream {
        SelectStream::new(hub.subscribe(), path.into(), deep_equality())
    }

    #[test]
    fn first_item_is_resolved_from_the_replayed_state() {
        let hub = SubscriberHub::new(json!({ "foo": { "bar": "foobar" } }));
        let mut stream = select(&hub, ["foo", "bar"]);
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!("foobar")));
    }

    #[test]
    fn unrelated_changes_are_suppressed() {
        let hub = SubscriberHub::new(json!({ "foo": { "bar": "foobar" }, "baz": 42 }));
        let mut stream = select(&hub, ["foo", "bar"]);
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!("foobar")));

        // Only `baz` changes: nothing to emit for foo.bar.
        hub.publish(json!({ "foo": { "bar": "foobar" }, "baz": 0 }));
        assert_eq!(stream.next().now_or_never(), None);

        hub.publish(json!({ "foo": { "bar": "changed" }, "baz": 0 }));
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!("changed")));
    }

    #[test]
    fn missing_path_resolves_to_null() {
        let hub = SubscriberHub::new(json!({ "foo": 1 }));
        let mut stream = select(&hub, ["nope", "deep"]);
        assert_eq!(stream.next().now_or_never().flatten(), Some(Value::Null));

        // The path coming into existence is a change away from null.
        hub.publish(json!({ "nope": { "deep": 5 } }));
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!(5)));
    }

    #[test]
    fn custom_equality_widens_deduplication() {
        let hub = SubscriberHub::new(json!({ "jitter": 1.0 }));
        let compare: CompareFn = Arc::new(|a: &State, b: &State| {
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => (a - b).abs() < 0.5,
                _ => a == b,
            }
        });
        let mut stream = SelectStream::new(hub.subscribe(), Path::from("jitter"), compare);

        assert_eq!(stream.next().now_or_never().flatten(), Some(json!(1.0)));

        hub.publish(json!({ "jitter": 1.2 }));
        assert_eq!(stream.next().now_or_never(), None);

        hub.publish(json!({ "jitter": 2.0 }));
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!(2.0)));
    }

    #[test]
    fn stream_ends_with_the_hub() {
        let hub = SubscriberHub::new(json!(0));
        let mut stream = select(&hub, Path::new());
        assert_eq!(stream.next().now_or_never().flatten(), Some(json!(0)));

        hub.close();
        assert_eq!(stream.next().now_or_never(), Some(None));
    }
}
