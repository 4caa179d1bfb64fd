//! Work-submission surfaces.

use super::job::{Job, TaskHandle};
use crate::error::TaskError;
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Fire-and-forget submission.
pub trait Executor: Send + Sync {
    /// Hand a job to the pool. Errors only when the pool refuses the job.
    fn execute(&self, job: Job) -> Result<(), TaskError>;

    /// True for boundary-crossing executors.
    fn is_decorated(&self) -> bool {
        false
    }
}

/// An executor with a lifecycle.
pub trait ExecutorService: Executor {
    /// Stop accepting new jobs.
    fn shutdown(&self);

    fn is_shutdown(&self) -> bool;
}

/// An executor that can run jobs after a delay.
pub trait ScheduledExecutor: ExecutorService {
    /// Register `job` to run once `delay` has elapsed. Must not block.
    fn schedule(&self, delay: Duration, job: Job) -> Result<(), TaskError>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        (**self).execute(job)
    }

    fn is_decorated(&self) -> bool {
        (**self).is_decorated()
    }
}

impl<E: ExecutorService + ?Sized> ExecutorService for Arc<E> {
    fn shutdown(&self) {
        (**self).shutdown()
    }

    fn is_shutdown(&self) -> bool {
        (**self).is_shutdown()
    }
}

impl<E: ScheduledExecutor + ?Sized> ScheduledExecutor for Arc<E> {
    fn schedule(&self, delay: Duration, job: Job) -> Result<(), TaskError> {
        (**self).schedule(delay, job)
    }
}

/// Future-returning submission on top of [`Executor::execute`].
pub trait ExecutorServiceExt: Executor {
    fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (job, handle) = Job::with_handle(task);
        self.execute(job)?;
        Ok(handle)
    }

    /// Submit every task and resolve once all of them have, in input order.
    fn invoke_all<T, F, I>(&self, tasks: I) -> Result<BoxFuture<'static, Vec<Result<T, TaskError>>>, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
        I: IntoIterator<Item = F>,
    {
        let handles = tasks
            .into_iter()
            .map(|task| self.submit(task))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(future::join_all(handles).boxed())
    }

    /// Submit every task and resolve with the first success.
    ///
    /// Fails with the last failure when every task fails.
    fn invoke_any<T, F, I>(&self, tasks: I) -> Result<BoxFuture<'static, Result<T, TaskError>>, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
        I: IntoIterator<Item = F>,
    {
        let handles = tasks
            .into_iter()
            .map(|task| self.submit(task))
            .collect::<Result<Vec<_>, _>>()?;
        if handles.is_empty() {
            return Err(TaskError::rejected("invoke_any requires at least one task"));
        }
        Ok(future::select_ok(handles)
            .map(|outcome| outcome.map(|(value, _pending)| value))
            .boxed())
    }
}

impl<E: Executor + ?Sized> ExecutorServiceExt for E {}

pub trait ScheduledExecutorExt: ScheduledExecutor {
    fn schedule_task<T, F>(&self, delay: Duration, task: F) -> Result<TaskHandle<T>, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (job, handle) = Job::with_handle(task);
        self.schedule(delay, job)?;
        Ok(handle)
    }
}

impl<E: ScheduledExecutor + ?Sized> ScheduledExecutorExt for E {}

/// Runs every job inline on the submitting thread.
#[derive(Debug, Default)]
pub struct DirectExecutor {
    shutdown: AtomicBool,
}

impl DirectExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Executor for DirectExecutor {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        if self.is_shutdown() {
            return Err(TaskError::rejected("direct executor is shut down"));
        }
        job.run();
        Ok(())
    }
}

impl ExecutorService for DirectExecutor {
    fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}
