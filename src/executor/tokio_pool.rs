//! Adapter exposing a tokio runtime as a scheduled executor.

use super::job::Job;
use super::pool::{Executor, ExecutorService, ScheduledExecutor};
use crate::error::TaskError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

/// Runs jobs on the blocking pool of a caller-owned tokio runtime.
///
/// Delays are waited on the runtime timer, so no worker thread is parked while
/// a scheduled job is pending. Shutting the adapter down only stops it from
/// accepting jobs; the runtime itself belongs to the caller.
#[derive(Clone)]
pub struct TokioPool {
    handle: Handle,
    name: String,
    shutdown: Arc<AtomicBool>,
}

impl TokioPool {
    pub fn new(handle: Handle, name: impl Into<String>) -> Self {
        Self {
            handle,
            name: name.into(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Adapter over the runtime the caller is running in.
    pub fn current(name: impl Into<String>) -> Result<Self, TaskError> {
        let handle = Handle::try_current()
            .map_err(|e| TaskError::rejected(format!("no tokio runtime available: {}", e)))?;
        Ok(Self::new(handle, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_running(&self) -> Result<(), TaskError> {
        if self.is_shutdown() {
            return Err(TaskError::rejected(format!("pool '{}' is shut down", self.name)));
        }
        Ok(())
    }
}

impl Executor for TokioPool {
    fn execute(&self, job: Job) -> Result<(), TaskError> {
        self.ensure_running()?;
        self.handle.spawn_blocking(move || job.run());
        Ok(())
    }
}

impl ExecutorService for TokioPool {
    fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            debug!(pool = %self.name, "Pool shut down");
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

impl ScheduledExecutor for TokioPool {
    fn schedule(&self, delay: Duration, job: Job) -> Result<(), TaskError> {
        self.ensure_running()?;
        let handle = self.handle.clone();
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            handle.spawn_blocking(move || job.run());
        });
        Ok(())
    }
}

impl std::fmt::Debug for TokioPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioPool")
            .field("name", &self.name)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}
