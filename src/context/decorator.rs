//! Snapshot-driven task decorator.

use super::{ContextSnapshot, ContextSource};
use crate::error::TaskError;
use crate::executor::{TaskBody, TaskDecorator};
use std::sync::Arc;
use tracing::warn;

/// Captures context when a task is decorated and transplants it around the
/// task body when it runs.
///
/// Cleanup runs after the body whether it returns, fails or panics. If the
/// snapshot cannot be restored the body never runs and the restore failure is
/// the task's outcome.
#[derive(Clone)]
pub struct ContextDecorator {
    source: Arc<dyn ContextSource>,
}

impl ContextDecorator {
    pub fn new<S>(source: S) -> Self
    where
        S: ContextSource + 'static,
    {
        Self {
            source: Arc::new(source),
        }
    }

    pub fn from_arc(source: Arc<dyn ContextSource>) -> Self {
        Self { source }
    }
}

impl TaskDecorator for ContextDecorator {
    fn decorate(&self, body: TaskBody) -> Result<TaskBody, TaskError> {
        let mut snapshot = self.source.save()?;

        Ok(Box::new(move || {
            snapshot.restore()?;
            let _guard = CleanupGuard { snapshot };
            body()
        }))
    }
}

struct CleanupGuard {
    snapshot: Box<dyn ContextSnapshot>,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Err(e) = self.snapshot.cleanup() {
            warn!(error = %e, "Context cleanup failed after task");
        }
    }
}
