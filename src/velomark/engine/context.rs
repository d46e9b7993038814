//! Execution contexts
//!
//! An [`ExecutionContext`] runs submitted jobs and reports how they ended.
//! The harness only ever talks to this trait, so a real engine can be plugged
//! in by implementing it. [`TokioExecutionContext`] runs each job as a tokio
//! task.
//!
//! A [`JobHandle`] owns its job: dropping the handle aborts the job, so a
//! runner that unwinds or is cancelled never leaves work behind.

use super::progress::ProgressTracker;
use crate::velomark::error::{EngineError, EngineResult, HarnessError, HarnessResult};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

/// A unit of work handed to a context
pub struct Job {
    pub name: String,
    pub progress: ProgressTracker,
    pub future: BoxFuture<'static, EngineResult<()>>,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("progress", &self.progress.snapshot())
            .finish()
    }
}

/// How a job ended, as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job future returned successfully
    Completed,
    /// The job is still running but its output is complete
    Quiescent,
    /// The job returned an error or panicked
    Failed(String),
    /// The job was aborted before it finished
    Cancelled,
}

/// Caller-side handle of a submitted job
#[derive(Debug)]
pub struct JobHandle {
    id: Uuid,
    name: String,
    progress: ProgressTracker,
    task: Option<JoinHandle<EngineResult<()>>>,
    finished: Option<JobOutcome>,
}

impl JobHandle {
    /// Handle backed by a tokio task
    pub fn from_task(
        name: impl Into<String>,
        progress: ProgressTracker,
        task: JoinHandle<EngineResult<()>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            progress,
            task: Some(task),
            finished: None,
        }
    }

    /// Handle for a job the context drives itself
    pub fn detached(name: impl Into<String>, progress: ProgressTracker) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            progress,
            task: None,
            finished: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    /// Outcome recorded by a previous await, if any
    pub fn outcome(&self) -> Option<&JobOutcome> {
        self.finished.as_ref()
    }

    pub fn set_outcome(&mut self, outcome: JobOutcome) {
        self.finished = Some(outcome);
    }

    pub fn task_mut(&mut self) -> Option<&mut JoinHandle<EngineResult<()>>> {
        self.task.as_mut()
    }

    pub fn take_task(&mut self) -> Option<JoinHandle<EngineResult<()>>> {
        self.task.take()
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                log::debug!("Aborting job '{}' ({}) on drop", self.name, self.id);
            }
            task.abort();
        }
    }
}

/// Runtime that executes jobs
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    fn name(&self) -> &str;

    fn submit(&self, job: Job) -> HarnessResult<JobHandle>;

    /// Wait until the job stops running
    async fn await_completion(&self, handle: &mut JobHandle) -> JobOutcome;

    /// Wait until the job's output is complete, or it stops running
    async fn await_quiescence(&self, handle: &mut JobHandle) -> JobOutcome {
        let progress = handle.progress().clone();
        tokio::select! {
            _ = progress.wait_quiescent() => JobOutcome::Quiescent,
            outcome = self.await_completion(handle) => outcome,
        }
    }

    /// Abort the job and wait until it has been released
    async fn cancel(&self, handle: JobHandle);

    /// Jobs submitted and not yet released
    fn active_jobs(&self) -> usize;
}

/// Creates a fresh context per scenario
pub trait ContextFactory: Send + Sync {
    fn create(&self, scenario: &str) -> Arc<dyn ExecutionContext>;
}

/// Decrements the active job count when the job future is dropped
struct ActiveJobGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveJobGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs every job as a tokio task on the current runtime
#[derive(Debug, Clone)]
pub struct TokioExecutionContext {
    name: String,
    active: Arc<AtomicUsize>,
}

impl TokioExecutionContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl ExecutionContext for TokioExecutionContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, job: Job) -> HarnessResult<JobHandle> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| HarnessError::EngineFailure {
                message: "no tokio runtime available to run the job".to_string(),
                query_name: job.name.clone(),
                source: Some(e.to_string()),
            })?;

        self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveJobGuard {
            active: Arc::clone(&self.active),
        };
        let future = job.future;
        let task = runtime.spawn(async move {
            let _guard = guard;
            future.await
        });

        log::debug!("Context '{}' submitted job '{}'", self.name, job.name);
        Ok(JobHandle::from_task(job.name, job.progress, task))
    }

    async fn await_completion(&self, handle: &mut JobHandle) -> JobOutcome {
        if let Some(outcome) = handle.outcome() {
            return outcome.clone();
        }

        let name = handle.name().to_string();
        let outcome = match handle.task_mut() {
            Some(task) => match task.await {
                Ok(Ok(())) => JobOutcome::Completed,
                Ok(Err(e)) => JobOutcome::Failed(e.to_string()),
                Err(e) => join_error_outcome(e),
            },
            None => JobOutcome::Failed(format!("job '{}' has no running task", name)),
        };

        handle.take_task();
        handle.set_outcome(outcome.clone());
        outcome
    }

    async fn cancel(&self, mut handle: JobHandle) {
        if let Some(task) = handle.take_task() {
            task.abort();
            // Resolves once the future has been dropped
            let _ = task.await;
        }
        log::debug!(
            "Context '{}' released job '{}' ({} active)",
            self.name,
            handle.name(),
            self.active_jobs()
        );
    }

    fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Hands out one [`TokioExecutionContext`] per scenario
#[derive(Debug, Clone, Default)]
pub struct TokioContextFactory;

impl ContextFactory for TokioContextFactory {
    fn create(&self, scenario: &str) -> Arc<dyn ExecutionContext> {
        Arc::new(TokioExecutionContext::new(scenario))
    }
}

fn join_error_outcome(error: JoinError) -> JobOutcome {
    if error.is_cancelled() {
        return JobOutcome::Cancelled;
    }
    match error.try_into_panic() {
        Ok(payload) => JobOutcome::Failed(EngineError::Panicked(panic_message(&*payload)).to_string()),
        Err(e) => JobOutcome::Failed(e.to_string()),
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
