//! Bounded task queue for outbound hosting work.
//!
//! [`TaskQueue`] runs at most `concurrency` tasks at once and holds at most
//! `max_depth` more waiting for a slot. Excess submissions are rejected with
//! [`GitOpsError::QueueFull`] without being started. Waiting tasks are
//! admitted into free slots strictly in submission order; completion order
//! follows task latency.
//!
//! The queue is an explicit value. Cloning it shares the same slots and
//! waiting list, so independently configured queues can coexist.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::github::error::GitOpsError;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Point-in-time queue occupancy, for health reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Tasks currently running.
    pub active: usize,
    /// Tasks waiting for a slot.
    pub queued: usize,
    /// Maximum simultaneously running tasks.
    pub concurrency: usize,
}

#[derive(Default)]
struct QueueState {
    active: usize,
    waiting: VecDeque<Job>,
}

struct QueueInner {
    concurrency: usize,
    max_depth: usize,
    state: Mutex<QueueState>,
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Concurrency-capped, depth-bounded FIFO task queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<QueueInner>,
}

/// Receives the result of a submitted task.
///
/// Dropping the handle detaches the task: it still runs, and a failure is
/// logged instead of delivered.
#[derive(Debug)]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T, GitOpsError>>,
}

impl<T> TaskHandle<T> {
    /// Waits for the task to finish.
    ///
    /// # Errors
    ///
    /// Returns the task's own failure, or `GitOpsError::TaskAborted` when the
    /// task panicked before producing a result.
    pub async fn outcome(self) -> Result<T, GitOpsError> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(GitOpsError::TaskAborted {
                message: "task ended without producing a result".to_owned(),
            }))
    }
}

impl TaskQueue {
    /// Creates a queue.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::Configuration` when `concurrency` is zero.
    pub fn new(concurrency: usize, max_depth: usize) -> Result<Self, GitOpsError> {
        if concurrency == 0 {
            return Err(GitOpsError::Configuration {
                message: "queue concurrency must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            inner: Arc::new(QueueInner {
                concurrency,
                max_depth,
                state: Mutex::new(QueueState::default()),
            }),
        })
    }

    /// Admits `task` or rejects it immediately, without waiting for it to
    /// run.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::QueueFull` when every slot is busy and the
    /// waiting list already holds `max_depth` tasks. A rejected task is
    /// never started.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>, GitOpsError>
    where
        F: Future<Output = Result<T, GitOpsError>> + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let job: Job = Box::pin(async move {
            let result = task.await;
            if let Err(Err(error)) = sender.send(result) {
                tracing::warn!(error = %error, kind = ?error.kind(), "detached task failed");
            }
        });

        {
            let mut state = self.inner.lock();
            if state.active >= self.inner.concurrency && state.waiting.len() >= self.inner.max_depth
            {
                tracing::debug!(
                    queued = state.waiting.len(),
                    max_depth = self.inner.max_depth,
                    "rejecting task, queue full"
                );
                return Err(GitOpsError::QueueFull {
                    max_depth: self.inner.max_depth,
                });
            }
            state.waiting.push_back(job);
        }

        drain(&self.inner);
        Ok(TaskHandle { receiver })
    }

    /// Admits `task` and waits for its result.
    ///
    /// # Errors
    ///
    /// Returns `GitOpsError::QueueFull` on rejection, otherwise whatever
    /// [`TaskHandle::outcome`] returns.
    pub async fn enqueue<F, T>(&self, task: F) -> Result<T, GitOpsError>
    where
        F: Future<Output = Result<T, GitOpsError>> + Send + 'static,
        T: Send + 'static,
    {
        self.submit(task)?.outcome().await
    }

    /// Current occupancy.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.lock();
        QueueStats {
            active: state.active,
            queued: state.waiting.len(),
            concurrency: self.inner.concurrency,
        }
    }
}

/// Starts waiting jobs, oldest first, while slots are free.
///
/// Each job runs in its own task so a panic cannot leak its slot; the slot is
/// released and the queue drained again in one place whatever the outcome.
fn drain(inner: &Arc<QueueInner>) {
    let ready: Vec<Job> = {
        let mut state = inner.lock();
        let mut ready = Vec::new();
        while state.active < inner.concurrency {
            let Some(job) = state.waiting.pop_front() else {
                break;
            };
            state.active += 1;
            ready.push(job);
        }
        ready
    };

    for job in ready {
        let queue = Arc::clone(inner);
        tokio::spawn(async move {
            if let Err(error) = tokio::spawn(job).await {
                tracing::error!(error = %error, "queued task did not complete");
            }
            {
                let mut state = queue.lock();
                state.active = state.active.saturating_sub(1);
            }
            drain(&queue);
        });
    }
}
