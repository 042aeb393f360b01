//! Detached job execution with single-flight slots.
//!
//! Request handlers claim a [`JobSlot`] for `(kind, project)` before they
//! charge for the work, then hand the slot and the job future to
//! [`JobExecutor::dispatch`]. The slot is released when the job finishes,
//! whatever the outcome. Failed and panicked jobs are reported to the
//! failure handler given at construction.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lasy_core::types::DbId;
use tokio_util::task::TaskTracker;

use crate::error::JobError;

/// The two kinds of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Generation,
    Deployment,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Deployment => "deployment",
        }
    }
}

/// Identity of an in-flight job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub kind: JobKind,
    pub project_id: DbId,
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} job for project {}", self.kind.as_str(), self.project_id)
    }
}

type InFlight = Arc<Mutex<HashSet<JobKey>>>;

/// Called with every job that ends in an error, panics included.
pub type FailureHandler = Arc<dyn Fn(JobKey, &JobError) + Send + Sync>;

/// Exclusive right to run one job for a `(kind, project)` pair.
///
/// Dropping the slot releases it.
#[derive(Debug)]
pub struct JobSlot {
    key: JobKey,
    in_flight: InFlight,
}

impl JobSlot {
    pub fn key(&self) -> JobKey {
        self.key
    }
}

impl Drop for JobSlot {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Runs jobs outside the request that triggered them.
pub struct JobExecutor {
    tracker: TaskTracker,
    in_flight: InFlight,
    on_failure: FailureHandler,
}

impl JobExecutor {
    pub fn new<F>(on_failure: F) -> Self
    where
        F: Fn(JobKey, &JobError) + Send + Sync + 'static,
    {
        Self {
            tracker: TaskTracker::new(),
            in_flight: Arc::default(),
            on_failure: Arc::new(on_failure),
        }
    }

    /// Executor whose failure handler logs at `error` level.
    pub fn logging() -> Self {
        Self::new(|key, err| {
            tracing::error!(
                job = key.kind.as_str(),
                project_id = key.project_id,
                error = %err,
                "Background job failed"
            );
        })
    }

    /// Claim the slot for `(kind, project_id)`, or `None` if a job of that
    /// kind is already in flight for the project.
    pub fn try_claim(&self, kind: JobKind, project_id: DbId) -> Option<JobSlot> {
        let key = JobKey { kind, project_id };
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then(|| JobSlot {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, kind: JobKind, project_id: DbId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&JobKey { kind, project_id })
    }

    /// Number of claimed slots, dispatched or not.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run `job` in the background, holding `slot` until it completes.
    ///
    /// The job runs in its own task so a panic is caught here and reported
    /// instead of unwinding through the executor.
    pub fn dispatch<F>(&self, slot: JobSlot, job: F)
    where
        F: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        let key = slot.key;
        let on_failure = Arc::clone(&self.on_failure);

        tracing::debug!(job = key.kind.as_str(), project_id = key.project_id, "Job dispatched");

        self.tracker.spawn(async move {
            let _slot = slot;
            let outcome = match tokio::spawn(job).await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(JobError::Panicked(panic_message(e.into_panic()))),
                Err(e) => Err(JobError::Panicked(e.to_string())),
            };

            match outcome {
                Ok(()) => {
                    tracing::debug!(
                        job = key.kind.as_str(),
                        project_id = key.project_id,
                        "Job finished"
                    );
                }
                Err(err) => on_failure(key, &err),
            }
        });
    }

    /// Wait up to `timeout` for running jobs. Call once the server has
    /// stopped taking requests.
    ///
    /// Returns `true` when every job finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for background jobs");
        }
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
