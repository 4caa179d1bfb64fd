//! Error types for context propagation, task execution and retries.

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Failures raised while moving captured state between threads
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    #[error("Failed to capture '{name}' context: {reason}")]
    Capture { name: String, reason: String },

    #[error("Failed to restore '{name}' context: {reason}")]
    Restore { name: String, reason: String },

    #[error("Failed to clean up '{name}' context: {reason}")]
    Cleanup { name: String, reason: String },
}

impl ContextError {
    pub fn capture(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ContextError::Capture {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn restore(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ContextError::Restore {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn cleanup(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ContextError::Cleanup {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a unit of work that did not produce a value
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Task failed: {0}")]
    Failed(Arc<anyhow::Error>),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task rejected: {0}")]
    Rejected(String),

    #[error("Task was dropped before completion")]
    Cancelled,

    /// Envelope added when a failure is delivered through an asynchronous handle
    #[error("Asynchronous task failed: {0}")]
    Completion(Box<TaskError>),

    #[error("Retry aborted: {cause}")]
    Aborted { cause: Box<TaskError> },

    #[error("Failed after {attempts} attempts: {cause}")]
    Exhausted { attempts: u32, cause: Box<TaskError> },
}

impl TaskError {
    /// Build a work failure from any displayable message.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        TaskError::Failed(Arc::new(anyhow::anyhow!("{}", message)))
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        TaskError::Rejected(reason.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked(message)
    }

    pub fn aborted(cause: TaskError) -> Self {
        TaskError::Aborted {
            cause: Box::new(cause),
        }
    }

    pub fn exhausted(attempts: u32, cause: TaskError) -> Self {
        TaskError::Exhausted {
            attempts,
            cause: Box::new(cause),
        }
    }

    /// Non-recoverable faults that are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }

    /// Strip one asynchronous envelope, if present.
    pub fn into_cause(self) -> TaskError {
        match self {
            TaskError::Completion(cause) => *cause,
            other => other,
        }
    }

    /// The failure carried by an envelope or a terminal retry outcome.
    pub fn cause(&self) -> Option<&TaskError> {
        match self {
            TaskError::Completion(cause)
            | TaskError::Aborted { cause }
            | TaskError::Exhausted { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        TaskError::Failed(Arc::new(err))
    }
}

/// Configuration and setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
