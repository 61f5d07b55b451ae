//! Background dispatch
//!
//! Event publishing and master-sync notification run after the request that
//! triggered them has been answered. Jobs go through a bounded queue drained by
//! a single worker task; a full queue drops the job with a warning instead of
//! blocking the caller.

use std::{
    error::Error,
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, error, warn};

/// Default number of queued jobs.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Boxed error returned by background jobs.
pub type BoxError = Box<dyn Error + Send + Sync>;

type JobFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;

enum Job {
    Work { label: String, work: JobFuture },
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time view of the dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Handle used to queue background jobs.
#[derive(Clone)]
pub struct Dispatcher {
    sender: mpsc::Sender<Job>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// Queue consumer. Run it with [`DispatchWorker::run`].
pub struct DispatchWorker {
    receiver: mpsc::Receiver<Job>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Create a dispatcher and its not yet running worker.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, DispatchWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let counters = Arc::new(Counters::default());

        (
            Self {
                sender,
                counters: Arc::clone(&counters),
            },
            DispatchWorker { receiver, counters },
        )
    }

    /// Create a dispatcher with its worker running on the current runtime.
    #[must_use]
    pub fn spawn(capacity: usize) -> (Self, JoinHandle<()>) {
        let (dispatcher, worker) = Self::new(capacity);

        (dispatcher, tokio::spawn(worker.run()))
    }

    /// Queue `work` without waiting for it.
    pub fn dispatch<F>(&self, label: impl Into<String>, work: F)
    where
        F: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let job = Job::Work {
            label: label.into(),
            work: Box::pin(work),
        };

        match self.sender.try_send(job) {
            Ok(()) => {
                self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(job) | TrySendError::Closed(job)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);

                if let Job::Work { label, .. } = job {
                    warn!(job = %label, "background queue unavailable, dropping job");
                }
            }
        }
    }

    /// Wait until every job queued before this call has finished.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();

        if self.sender.send(Job::Flush(done)).await.is_err() {
            return;
        }

        if finished.await.is_err() {
            warn!("background worker stopped before flush completed");
        }
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

impl DispatchWorker {
    /// Drain the queue until every [`Dispatcher`] handle is dropped.
    ///
    /// Each job runs in its own task so a panicking job is counted as failed
    /// instead of stopping the worker.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            match job {
                Job::Work { label, work } => match tokio::spawn(work).await {
                    Ok(Ok(())) => {
                        self.counters.completed.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Err(error)) => {
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                        error!(job = %label, "background job failed: {error}");
                    }
                    Err(error) => {
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                        error!(job = %label, "background job panicked: {error}");
                    }
                },
                Job::Flush(done) => {
                    if done.send(()).is_err() {
                        debug!("flush requester went away");
                    }
                }
            }
        }

        debug!("background dispatcher stopped");
    }
}
