//! Boundary-crossing executors.
//!
//! Each wrapper decorates every job at submission time, on the submitting
//! thread, and then hands it to the delegate. They expose the same surface as
//! the executor they wrap, so they can stand in for it anywhere.

use super::decorator::TaskDecorator;
use super::job::Job;
use super::pool::{Executor, ExecutorService, ScheduledExecutor};
use crate::error::TaskError;
use std::sync::Arc;
use std::time::Duration;

fn decorate(decorator: &Arc<dyn TaskDecorator>, job: Job) -> Result<Job, TaskError> {
    job.decorate(decorator.as_ref())
}

pub struct DelegatedExecutor<E> {
    delegate: E,
    decorator: Arc<dyn TaskDecorator>,
}

impl<E: Executor> DelegatedExecutor<E> {
    pub fn new(delegate: E, decorator: Arc<dyn TaskDecorator>) -> Self {
        Self {
            delegate,
            decorator,
        }
    }

    pub fn delegate(&self) -> &E {
        &self.delegate
    }
}

impl<E: Executor> Executor for DelegatedExecutor<E> {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        self.delegate.execute(decorate(&self.decorator, job)?)
    }

    fn is_decorated(&self) -> bool {
        true
    }
}

pub struct DelegatedExecutorService<E> {
    delegate: E,
    decorator: Arc<dyn TaskDecorator>,
}

impl<E: ExecutorService> DelegatedExecutorService<E> {
    pub fn new(delegate: E, decorator: Arc<dyn TaskDecorator>) -> Self {
        Self {
            delegate,
            decorator,
        }
    }

    pub fn delegate(&self) -> &E {
        &self.delegate
    }
}

impl<E: ExecutorService> Executor for DelegatedExecutorService<E> {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        self.delegate.execute(decorate(&self.decorator, job)?)
    }

    fn is_decorated(&self) -> bool {
        true
    }
}

impl<E: ExecutorService> ExecutorService for DelegatedExecutorService<E> {
    fn shutdown(&self) {
        self.delegate.shutdown()
    }

    fn is_shutdown(&self) -> bool {
        self.delegate.is_shutdown()
    }
}

pub struct DelegatedScheduledExecutor<E> {
    delegate: E,
    decorator: Arc<dyn TaskDecorator>,
}

impl<E: ScheduledExecutor> DelegatedScheduledExecutor<E> {
    pub fn new(delegate: E, decorator: Arc<dyn TaskDecorator>) -> Self {
        Self {
            delegate,
            decorator,
        }
    }

    pub fn delegate(&self) -> &E {
        &self.delegate
    }
}

impl<E: ScheduledExecutor> Executor for DelegatedScheduledExecutor<E> {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        self.delegate.execute(decorate(&self.decorator, job)?)
    }

    fn is_decorated(&self) -> bool {
        true
    }
}

impl<E: ScheduledExecutor> ExecutorService for DelegatedScheduledExecutor<E> {
    fn shutdown(&self) {
        self.delegate.shutdown()
    }

    fn is_shutdown(&self) -> bool {
        self.delegate.is_shutdown()
    }
}

impl<E: ScheduledExecutor> ScheduledExecutor for DelegatedScheduledExecutor<E> {
    fn schedule(&self, delay: Duration, job: Job) -> Result<(), TaskError> {
        self.delegate.schedule(delay, decorate(&self.decorator, job)?)
    }
}
