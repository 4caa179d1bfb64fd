//! Executors
//!
//! The work-submission surface ([`Executor`], [`ExecutorService`],
//! [`ScheduledExecutor`]), the [`Job`] and [`TaskHandle`] that travel through
//! it, task decorators, and the boundary-crossing executors that apply a
//! decorator to every submitted job.

mod capability;
mod decorator;
mod delegated;
mod job;
mod pool;
mod tokio_pool;

pub use capability::{ExecutorCapability, ExecutorSelector, ExecutorWrapper};
pub use decorator::{DecoratedTask, DecoratorChain, TaskDecorator, TaskDecoratorExt};
pub use delegated::{DelegatedExecutor, DelegatedExecutorService, DelegatedScheduledExecutor};
pub use job::{Job, TaskBody, TaskHandle};
pub use pool::{
    DirectExecutor, Executor, ExecutorService, ExecutorServiceExt, ScheduledExecutor,
    ScheduledExecutorExt,
};
pub use tokio_pool::TokioPool;

pub(crate) use job::Completer;
