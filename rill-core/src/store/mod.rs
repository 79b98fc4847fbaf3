//! The store: state ownership, updaters, and the update pipeline.
//!
//! # Concepts
//!
//! ## State
//!
//! A single JSON-like value ([`State`]) owned by the store's reducer driver.
//! It only changes by applying updaters; everything outside the driver reads
//! cloned snapshots.
//!
//! ## Updaters
//!
//! Pure transformations `State -> State` ([`Updater`]), optionally named for
//! correlation and optionally curried through [`Updater::factory`].
//!
//! ## Pipeline
//!
//! Dispatched updaters travel through an unbounded ingress queue into the
//! reducer, through the change-detection gate, and out via the replay hub to
//! every observer. Failures on that path terminate the pipeline (see
//! [`StoreError`]).

mod error;
mod store;
mod updater;

pub use error::StoreError;
pub use store::{State, Store};
pub use updater::Updater;

pub(crate) use store::Ingress;
