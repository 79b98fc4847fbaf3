//! Workflow combination.
//!
//! A workflow is an asynchronous, potentially infinite producer of updaters.
//! All side effects of an application live inside workflows; the updaters
//! they emit stay pure.
//!
//! Combining workflows merges them into one stream (each workflow's own
//! ordering is preserved, arrival order decides the interleave across
//! workflows) and a spawned task forwards every item into the store's
//! ingress queue. The caller never blocks on delivery.

use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::store::{Ingress, StoreError, Updater};

/// An asynchronous producer of updaters.
///
/// An `Err` item carries a workflow failure into the pipeline: once merged
/// it terminates the reducer in queue order, behind the updaters emitted
/// before it (see [`StoreError::Workflow`]).
pub type Workflow = BoxStream<'static, Result<Updater, StoreError>>;

/// Handle to one `combine_workflows` forwarding task.
///
/// Dropping the handle detaches the task; the merged workflows keep feeding
/// the store. [`abort`](WorkflowHandle::abort) cancels it, cutting those
/// workflows off from the ingress queue without affecting the store or other
/// combinations.
pub struct WorkflowHandle {
    task: JoinHandle<()>,
}

impl WorkflowHandle {
    /// Stop forwarding from the merged workflows.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the forwarding task has finished (all workflows exhausted,
    /// the store dropped, or the handle aborted).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Merge `workflows` and spawn the task forwarding their items into
/// `ingress`.
///
/// The task stops at the first workflow error (after forwarding it), when
/// every workflow is exhausted, or when the store side of the channel is
/// gone.
pub(crate) fn spawn_forwarder(
    workflows: Vec<Workflow>,
    ingress: mpsc::UnboundedSender<Ingress>,
) -> WorkflowHandle {
    let mut merged = stream::select_all(workflows);
    let task = tokio::spawn(async move {
        while let Some(item) = merged.next().await {
            match item {
                Ok(updater) => {
                    if ingress.send(Ingress::Apply(updater)).is_err() {
                        tracing::debug!("store dropped; workflow forwarding stopped");
                        break;
                    }
                }
                Err(err) => {
                    let _ = ingress.send(Ingress::Fail(err));
                    break;
                }
            }
        }
    });
    WorkflowHandle { task }
}
