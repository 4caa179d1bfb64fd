//! Threadstate: Context Propagation Across Execution Boundaries
//!
//! Per-thread state such as correlation ids does not follow work handed to a
//! pooled worker or to a retry scheduled for later. This crate captures that
//! state where work is submitted, installs it where the work runs, and clears
//! it afterwards. It also provides an asynchronous retry orchestrator that
//! re-runs failed work under a retry policy without blocking threads.

pub mod cli;
pub mod concurrent;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod retry;

pub use context::{ContextDecorator, ContextSnapshot, ContextSource, ContextSourceExt};
pub use error::{ConfigError, ContextError, TaskError};
pub use executor::{
    Executor, ExecutorService, ExecutorServiceExt, Job, ScheduledExecutor, TaskDecorator,
    TaskHandle,
};
pub use retry::{AsyncRetryExecutor, RetryPolicy, RetryPolicyExt};
