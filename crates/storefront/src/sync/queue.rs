//! Per-owner mutation queue.
//!
//! A single worker task drains an unbounded channel and runs each job to
//! completion before starting the next, so remote mutations reach the backend
//! in issuance order. Jobs are never cancelled: dropping a [`Confirmation`]
//! only stops the caller from hearing the outcome.

use std::future::Future;
use std::pin::Pin;

use maison_core::OwnerId;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, debug_span, info_span};
use uuid::Uuid;

use crate::api::StoreError;
use crate::error::SyncError;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle to the worker task of one cache.
pub(crate) struct MutationQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl MutationQueue {
    /// Start the worker task.
    ///
    /// The worker exits once every sender is dropped and the queue is drained.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub(crate) fn spawn(collection: &'static str, owner: &OwnerId) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let span = info_span!("mutation_queue", collection, owner = %owner);

        tokio::spawn(
            async move {
                while let Some(job) = rx.recv().await {
                    job.await;
                }
                debug!("Mutation queue closed");
            }
            .instrument(span),
        );

        Self { tx }
    }

    /// Enqueue a job and return a handle resolving with its outcome.
    pub(crate) fn submit<T, F>(&self, job: F) -> Result<Confirmation<T>, SyncError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let (done_tx, done_rx) = oneshot::channel();

        let job = async move {
            let outcome = job.await;
            // The caller may have dropped its confirmation; the job still ran.
            let _ = done_tx.send(outcome);
        }
        .instrument(debug_span!("mutation", %id));

        self.tx
            .send(Box::pin(job))
            .map_err(|_| SyncError::QueueClosed)?;

        Ok(Confirmation { id, rx: done_rx })
    }
}

/// Resolves when a queued mutation has been confirmed or rolled back.
#[derive(Debug)]
#[must_use = "dropping a confirmation does not cancel the mutation, but its outcome is lost"]
pub struct Confirmation<T = ()> {
    id: Uuid,
    rx: oneshot::Receiver<Result<T, StoreError>>,
}

impl<T> Confirmation<T> {
    /// Correlation id of the mutation, as logged by the queue.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the remote call.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Store` if the remote call failed (the local change
    /// has already been rolled back by then), or `SyncError::QueueClosed` if
    /// the worker stopped before running the job.
    pub async fn wait(self) -> Result<T, SyncError> {
        self.rx.await.map_err(|_| SyncError::QueueClosed)?.map_err(SyncError::from)
    }
}
