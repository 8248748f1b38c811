//! Module `bridge`
//!
//! Runs a blocking storage call as an awaitable unit of work.
//!
//! A [`BlockingCall`] checks its cancellation token once, when it is built,
//! and captures the ambient tokio runtime if there is one. Awaiting it either
//! runs the job inline (no runtime) or hands it to the runtime's blocking
//! pool. Once started, the job runs to completion.

use std::future::{Future, IntoFuture};
use std::pin::Pin;

use log::debug;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::error::{EntryError, EntryResult};

type Job<T> = Box<dyn FnOnce() -> EntryResult<T> + Send + 'static>;

/// A blocking job waiting to be awaited.
pub struct BlockingCall<T> {
    job: Job<T>,
    scheduler: Option<Handle>,
}

impl<T: Send + 'static> BlockingCall<T> {
    /// Fails with [`EntryError::Cancelled`] if `cancel` has already fired.
    pub fn new<F>(cancel: &CancellationToken, job: F) -> EntryResult<Self>
    where
        F: FnOnce() -> EntryResult<T> + Send + 'static,
    {
        if cancel.is_cancelled() {
            debug!("Blocking call cancelled before scheduling");
            return Err(EntryError::Cancelled);
        }
        Ok(Self {
            job: Box::new(job),
            scheduler: Handle::try_current().ok(),
        })
    }

    /// Whether awaiting will run the job on the calling thread.
    pub fn is_inline(&self) -> bool {
        self.scheduler.is_none()
    }

    async fn run(self) -> EntryResult<T> {
        match self.scheduler {
            None => (self.job)(),
            Some(handle) => handle
                .spawn_blocking(self.job)
                .await
                .map_err(|e| EntryError::TaskFailed(e.to_string()))?,
        }
    }
}

impl<T: Send + 'static> IntoFuture for BlockingCall<T> {
    type Output = EntryResult<T>;
    type IntoFuture = Pin<Box<dyn Future<Output = EntryResult<T>> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

/// Build a [`BlockingCall`] for `job` and await it.
pub async fn run_blocking<T, F>(cancel: &CancellationToken, job: F) -> EntryResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> EntryResult<T> + Send + 'static,
{
    BlockingCall::new(cancel, job)?.await
}
