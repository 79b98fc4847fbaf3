//! Error types for the update pipeline.
//!
//! Every reducer-path failure is fatal to the store instance that produced
//! it: the driver stops, all live streams terminate, and the error is handed
//! to the store's error handler exactly once. There is no rollback of state;
//! recovery means constructing a new store.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

/// Errors that terminate a store's update pipeline.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// An updater panicked while the reducer was applying it.
    #[error("updater `{}` panicked: {message}", .name.as_deref().unwrap_or("<anonymous>"))]
    UpdaterPanic {
        /// Name of the offending updater, if it carried one.
        name: Option<Arc<str>>,
        /// Panic payload rendered as text.
        message: String,
    },

    /// A workflow produced an error item.
    ///
    /// The failure is serialized through the ingress queue, so updaters the
    /// workflow emitted before failing are still applied first.
    #[error("workflow failed: {message}")]
    Workflow {
        /// Failure description supplied by the workflow.
        message: String,
    },
}

impl StoreError {
    /// Build a [`StoreError::Workflow`] from any displayable error.
    pub fn workflow(err: impl std::fmt::Display) -> Self {
        Self::Workflow {
            message: err.to_string(),
        }
    }
}

/// Render a panic payload into a message, best effort.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
