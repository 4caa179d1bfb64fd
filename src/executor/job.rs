//! Units of work and their single-resolution result handles.

use super::decorator::TaskDecorator;
use crate::error::TaskError;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Type-erased body of a [`Job`].
pub type TaskBody = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;

type Callback = Box<dyn FnOnce(Result<(), TaskError>) + Send + 'static>;

/// A unit of work handed to an [`Executor`](super::Executor).
///
/// The body runs at most once. Panics are caught and reported as
/// [`TaskError::Panicked`]. The outcome goes to the completion callback when
/// one is attached; otherwise failures are logged.
pub struct Job {
    body: TaskBody,
    on_complete: Option<Callback>,
    decorated: bool,
}

impl Job {
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        Self {
            body: Box::new(body),
            on_complete: None,
            decorated: false,
        }
    }

    /// Job from a closure that cannot fail (a runnable).
    pub fn from_fn<F>(body: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(move || {
            body();
            Ok(())
        })
    }

    /// Job producing a value, paired with the handle that receives it.
    ///
    /// Failures raised on the worker reach the handle inside
    /// [`TaskError::Completion`]. The handle resolves only once the whole
    /// body, decorations included, has returned.
    pub fn with_handle<T, F>(task: F) -> (Self, TaskHandle<T>)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let (completer, handle) = TaskHandle::channel();
        let job = Self::producing(task, move |outcome| {
            completer.complete(outcome.map_err(|e| TaskError::Completion(Box::new(e))));
        });
        (job, handle)
    }

    /// Job whose value or failure is handed to `callback` after the body,
    /// decorations included, has returned.
    pub(crate) fn producing<T, F, C>(task: F, callback: C) -> Self
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
        C: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let produced = Arc::clone(&slot);

        Self::new(move || {
            *produced.lock() = Some(task()?);
            Ok(())
        })
        .on_complete(move |outcome| {
            let outcome = outcome.and_then(|()| {
                slot.lock()
                    .take()
                    .ok_or_else(|| TaskError::failed("task finished without a value"))
            });
            callback(outcome);
        })
    }

    /// Attach a callback receiving the job's outcome.
    pub fn on_complete<C>(mut self, callback: C) -> Self
    where
        C: FnOnce(Result<(), TaskError>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Whether a boundary-crossing executor already decorated this job.
    pub fn is_decorated(&self) -> bool {
        self.decorated
    }

    /// Pass the body through `decorator`, once.
    pub(crate) fn decorate(mut self, decorator: &dyn TaskDecorator) -> Result<Self, TaskError> {
        if self.decorated {
            debug!("Job already decorated, skipping");
            return Ok(self);
        }
        self.body = decorator.decorate(self.body)?;
        self.decorated = true;
        Ok(self)
    }

    /// Run the job on the current thread.
    pub fn run(self) {
        let Job {
            body, on_complete, ..
        } = self;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(result) => result,
            Err(payload) => Err(TaskError::from_panic(payload)),
        };

        match on_complete {
            Some(callback) => callback(outcome),
            None => {
                if let Err(e) = outcome {
                    warn!(error = %e, "Fire-and-forget task failed");
                }
            }
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("decorated", &self.decorated)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

/// Future resolving to the outcome of a submitted task.
///
/// If the task is dropped without running (for example by a pool that shut
/// down) the handle resolves to [`TaskError::Cancelled`].
#[must_use = "a task handle does nothing unless awaited"]
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn channel() -> (Completer<T>, TaskHandle<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Completer {
                sender: Arc::new(Mutex::new(Some(tx))),
            },
            TaskHandle { receiver: rx },
        )
    }

    /// Block the current thread until the task resolves.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_wait(self) -> Result<T, TaskError> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(TaskError::Cancelled))
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(TaskError::Cancelled)))
    }
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle").finish_non_exhaustive()
    }
}

/// Sending half of a [`TaskHandle`]. Only the first completion is delivered.
pub(crate) struct Completer<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T, TaskError>>>>>,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> Completer<T> {
    /// Returns false if the handle was already resolved.
    pub(crate) fn complete(&self, outcome: Result<T, TaskError>) -> bool {
        match self.sender.lock().take() {
            // A dropped receiver means nobody is waiting.
            Some(sender) => {
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }
}
