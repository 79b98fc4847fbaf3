//! Rill Core
//!
//! This crate provides the engine for the Rill reactive state container:
//! a single authoritative state value, advanced only by pure updater
//! functions, exposed to observers as streams that always replay the latest
//! state to new subscribers.
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `store`: state ownership - the ingress queue, the reducer driver,
//!   updater construction, and the error taxonomy
//! - `stream`: everything observer-side - full-state subscriptions,
//!   selectors, named updater channels, and workflow combination
//!
//! Updaters dispatched from anywhere are serialized through an unbounded
//! ingress queue into a single driver task, which owns the state, suppresses
//! structurally-equal transitions, and multicasts the rest through a
//! last-value replay hub.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use rill_core::{Store, Updater};
//! use serde_json::json;
//!
//! let store = Store::new(json!({ "foo": { "bar": "foobar" }, "baz": 42 }));
//!
//! let update_baz = Updater::factory("updateBaz", |value: i64, mut state| {
//!     state["baz"] = value.into();
//!     state
//! });
//!
//! let mut baz = store.select("baz");
//! store.dispatch(update_baz(7));
//!
//! // baz yields 42 (replayed), then 7.
//! ```
//!
//! Constructing a [`Store`] spawns its driver task and therefore requires a
//! running Tokio runtime.

pub mod store;
pub mod stream;

pub use store::{State, Store, StoreError, Updater};
pub use stream::{
    CompareFn, NamedStream, Path, SelectStream, StateStream, Workflow, WorkflowHandle,
};
