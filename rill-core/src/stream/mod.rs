//! Observer-side streams.
//!
//! Everything downstream of the reducer lives here:
//!
//! - [`StateStream`]: the full state, replayed to late subscribers.
//! - [`SelectStream`]: a deduplicated view of one subtree ([`Path`]).
//! - [`NamedStream`]: the results of updaters sharing one name.
//! - [`Workflow`] / [`WorkflowHandle`]: asynchronous updater producers
//!   merged into the store's ingress queue.
//!
//! Streams are torn down by dropping them; the engine prunes closed
//! subscribers on the next publish. Every stream ends when the store's
//! pipeline terminates.

mod named;
mod path;
mod select;
mod subscriber;
mod workflow;

pub use named::NamedStream;
pub use path::Path;
pub use select::{CompareFn, SelectStream};
pub use subscriber::{StateStream, SubscriberId};
pub use workflow::{Workflow, WorkflowHandle};

pub(crate) use named::NamedChannels;
pub(crate) use subscriber::SubscriberHub;
pub(crate) use workflow::spawn_forwarder;
