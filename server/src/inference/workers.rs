//! Bounded worker pools for CPU-bound jobs.
//!
//! A pool is a semaphore in front of tokio's blocking thread pool: at most
//! `size` jobs from one pool run at once, the rest wait for a slot in
//! submission order. Submitting never blocks the caller; the returned
//! [`WorkHandle`] is awaited explicitly.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker pool '{0}' needs at least one slot")]
    ZeroSize(String),

    #[error("worker pool '{0}' must be created inside a tokio runtime")]
    NoRuntime(String),

    #[error("worker pool '{0}' is closed")]
    Closed(String),

    #[error("job on worker pool '{pool}' panicked: {message}")]
    Panicked { pool: String, message: String },

    #[error("job on worker pool '{0}' was cancelled")]
    Cancelled(String),
}

impl WorkerError {
    fn from_join(pool: &str, err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            WorkerError::Panicked {
                pool: pool.to_string(),
                message,
            }
        } else {
            WorkerError::Cancelled(pool.to_string())
        }
    }
}

#[derive(Clone)]
pub struct WorkerPool {
    name: Arc<str>,
    size: usize,
    slots: Arc<Semaphore>,
    runtime: Handle,
}

impl WorkerPool {
    /// Create a pool bound to the current tokio runtime.
    pub fn new(name: &str, size: usize) -> Result<Self, WorkerError> {
        if size == 0 {
            return Err(WorkerError::ZeroSize(name.to_string()));
        }
        let runtime = Handle::try_current().map_err(|_| WorkerError::NoRuntime(name.to_string()))?;

        Ok(Self {
            name: Arc::from(name),
            size,
            slots: Arc::new(Semaphore::new(size)),
            runtime,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held by a running job
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// Queue `job` for a slot. The slot stays taken until `job` returns,
    /// even if the handle is dropped.
    pub fn submit<F, R>(&self, job: F) -> WorkHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let slots = Arc::clone(&self.slots);
        let name = Arc::clone(&self.name);

        let inner = self.runtime.spawn(async move {
            let _slot = slots
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::Closed(name.to_string()))?;

            tokio::task::spawn_blocking(job).await.map_err(|e| {
                let err = WorkerError::from_join(&name, e);
                error!("{}", err);
                err
            })
        });

        WorkHandle {
            pool: Arc::clone(&self.name),
            inner,
        }
    }

    /// Run a future on the runtime this pool is bound to
    pub fn spawn<Fut>(&self, fut: Fut) -> JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.runtime.spawn(fut)
    }
}

/// Pending result of a submitted job
pub struct WorkHandle<R> {
    pool: Arc<str>,
    inner: JoinHandle<Result<R, WorkerError>>,
}

impl<R> WorkHandle<R> {
    /// Wait for the job to finish
    pub async fn join(self) -> Result<R, WorkerError> {
        match self.inner.await {
            Ok(result) => result,
            Err(e) => Err(WorkerError::from_join(&self.pool, e)),
        }
    }
}
