//! Asynchronous retry orchestration.

use super::policy::RetryPolicy;
use crate::error::TaskError;
use crate::executor::{Completer, Executor, Job, ScheduledExecutor, TaskHandle};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides that a failure must never be retried.
pub type AbortPredicate = Arc<dyn Fn(&TaskError) -> bool + Send + Sync>;

/// Runs work until it succeeds, is aborted, or the policy gives up.
///
/// The first attempt runs on the primary executor. Every retry waits on the
/// scheduler's timer and then runs on the retry executor, so no worker thread
/// sleeps between attempts.
///
/// Each failure is unwrapped of its [`TaskError::Completion`] envelope and
/// then checked in order:
/// 1. panics abort immediately;
/// 2. failures accepted by the abort predicate abort;
/// 3. the policy is asked for a delay with the failed attempt's number, and
///    no delay means the retries are exhausted.
#[derive(Clone)]
pub struct AsyncRetryExecutor {
    scheduler: Arc<dyn ScheduledExecutor>,
    primary: Arc<dyn Executor>,
    retry: Arc<dyn Executor>,
    policy: Arc<dyn RetryPolicy>,
    abort_predicate: AbortPredicate,
}

impl AsyncRetryExecutor {
    /// Orchestrator running every attempt on the scheduler itself.
    pub fn new(scheduler: Arc<dyn ScheduledExecutor>, policy: Arc<dyn RetryPolicy>) -> Self {
        let pool: Arc<dyn Executor> = Arc::new(Arc::clone(&scheduler));
        Self::with_executors(scheduler, Arc::clone(&pool), pool, policy)
    }

    pub fn with_executors(
        scheduler: Arc<dyn ScheduledExecutor>,
        primary: Arc<dyn Executor>,
        retry: Arc<dyn Executor>,
        policy: Arc<dyn RetryPolicy>,
    ) -> Self {
        Self {
            scheduler,
            primary,
            retry,
            policy,
            abort_predicate: Arc::new(|_| false),
        }
    }

    pub fn with_abort_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TaskError) -> bool + Send + Sync + 'static,
    {
        self.abort_predicate = Arc::new(predicate);
        self
    }

    /// Start running `work`. The handle resolves to its value,
    /// [`TaskError::Aborted`] or [`TaskError::Exhausted`].
    ///
    /// `work` is invoked again for every retry and must be safe to repeat.
    pub fn execute<T, F>(&self, work: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: Fn() -> Result<T, TaskError> + Send + Sync + 'static,
    {
        let (completer, handle) = TaskHandle::channel();
        let run = Arc::new(RetryRun {
            orchestrator: self.clone(),
            work,
            completer,
        });
        run.attempt(1);
        handle
    }
}

impl fmt::Debug for AsyncRetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncRetryExecutor").finish_non_exhaustive()
    }
}

/// State of one `execute` call, shared by its attempts and timers.
struct RetryRun<T, F> {
    orchestrator: AsyncRetryExecutor,
    work: F,
    completer: Completer<T>,
}

impl<T, F> RetryRun<T, F>
where
    T: Send + 'static,
    F: Fn() -> Result<T, TaskError> + Send + Sync + 'static,
{
    fn attempt(self: Arc<Self>, attempt: u32) {
        let executor = if attempt == 1 {
            Arc::clone(&self.orchestrator.primary)
        } else {
            Arc::clone(&self.orchestrator.retry)
        };

        let run = Arc::clone(&self);
        let outcome_run = Arc::clone(&self);
        let job = Job::producing(
            move || (run.work)(),
            move |outcome| match outcome {
                Ok(value) => {
                    debug!(attempt, "Attempt succeeded");
                    outcome_run.completer.complete(Ok(value));
                }
                Err(e) => outcome_run.handle_failure(attempt, e),
            },
        );

        if let Err(e) = executor.execute(job) {
            warn!(attempt, error = %e, "Attempt could not be submitted");
            self.give_up(attempt - 1, e);
        }
    }

    /// Resolve with a dispatch failure after `invocations` completed attempts.
    fn give_up(&self, invocations: u32, error: TaskError) {
        let outcome = if invocations == 0 {
            TaskError::aborted(error)
        } else {
            TaskError::exhausted(invocations, error)
        };
        self.completer.complete(Err(outcome));
    }

    fn handle_failure(self: Arc<Self>, attempt: u32, error: TaskError) {
        let cause = error.into_cause();

        if cause.is_fatal() {
            warn!(attempt, error = %cause, "Fatal failure, aborting retries");
            self.completer.complete(Err(TaskError::aborted(cause)));
            return;
        }

        if (self.orchestrator.abort_predicate)(&cause) {
            warn!(attempt, error = %cause, "Abort condition met, not retrying");
            self.completer.complete(Err(TaskError::aborted(cause)));
            return;
        }

        let Some(delay) = self.orchestrator.policy.wait_time(attempt) else {
            warn!(attempts = attempt, error = %cause, "Retries exhausted");
            self.completer.complete(Err(TaskError::exhausted(attempt, cause)));
            return;
        };

        debug!(
            attempt,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %cause,
            "Attempt failed, scheduling retry"
        );

        let run = Arc::clone(&self);
        let next = attempt.saturating_add(1);
        let timer = Job::from_fn(move || run.attempt(next));
        if let Err(e) = self.orchestrator.scheduler.schedule(delay, timer) {
            warn!(attempt, error = %e, "Retry could not be scheduled");
            self.give_up(attempt, e);
        }
    }
}
