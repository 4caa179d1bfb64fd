//! Capability-tiered wrapping of executors for host lifecycle hooks.

use super::decorator::TaskDecorator;
use super::delegated::{DelegatedExecutor, DelegatedExecutorService, DelegatedScheduledExecutor};
use super::pool::{Executor, ExecutorService, ScheduledExecutor};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// An executor together with the richest surface it offers.
#[derive(Clone)]
pub enum ExecutorCapability {
    Plain(Arc<dyn Executor>),
    Service(Arc<dyn ExecutorService>),
    Scheduled(Arc<dyn ScheduledExecutor>),
}

impl ExecutorCapability {
    pub fn tier(&self) -> &'static str {
        match self {
            ExecutorCapability::Plain(_) => "executor",
            ExecutorCapability::Service(_) => "executor-service",
            ExecutorCapability::Scheduled(_) => "scheduled-executor",
        }
    }

    pub fn is_decorated(&self) -> bool {
        match self {
            ExecutorCapability::Plain(executor) => executor.is_decorated(),
            ExecutorCapability::Service(executor) => executor.is_decorated(),
            ExecutorCapability::Scheduled(executor) => executor.is_decorated(),
        }
    }

    /// Boundary-crossing equivalent of the same tier.
    pub fn decorate(self, decorator: Arc<dyn TaskDecorator>) -> ExecutorCapability {
        match self {
            ExecutorCapability::Plain(executor) => {
                ExecutorCapability::Plain(Arc::new(DelegatedExecutor::new(executor, decorator)))
            }
            ExecutorCapability::Service(executor) => ExecutorCapability::Service(Arc::new(
                DelegatedExecutorService::new(executor, decorator),
            )),
            ExecutorCapability::Scheduled(executor) => ExecutorCapability::Scheduled(Arc::new(
                DelegatedScheduledExecutor::new(executor, decorator),
            )),
        }
    }

    /// View any tier as a plain executor.
    pub fn as_executor(&self) -> Arc<dyn Executor> {
        match self {
            ExecutorCapability::Plain(executor) => Arc::clone(executor),
            ExecutorCapability::Service(executor) => Arc::new(Arc::clone(executor)),
            ExecutorCapability::Scheduled(executor) => Arc::new(Arc::clone(executor)),
        }
    }
}

impl fmt::Debug for ExecutorCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorCapability")
            .field("tier", &self.tier())
            .field("decorated", &self.is_decorated())
            .finish()
    }
}

pub type ExecutorSelector = Box<dyn Fn(&ExecutorCapability, &str) -> bool + Send + Sync>;

/// Decides which executors a host registers get the boundary-crossing
/// treatment.
pub struct ExecutorWrapper {
    decorator: Option<Arc<dyn TaskDecorator>>,
    selector: ExecutorSelector,
}

impl ExecutorWrapper {
    /// Wrapper selecting every executor. Without a decorator it wraps nothing.
    pub fn new(decorator: Option<Arc<dyn TaskDecorator>>) -> Self {
        Self {
            decorator,
            selector: Box::new(|_, _| true),
        }
    }

    pub fn with_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&ExecutorCapability, &str) -> bool + Send + Sync + 'static,
    {
        self.selector = Box::new(selector);
        self
    }

    /// Returns `candidate` unchanged or its decorated equivalent.
    pub fn wrap(&self, candidate: ExecutorCapability, name: &str) -> ExecutorCapability {
        let Some(decorator) = &self.decorator else {
            return candidate;
        };

        if candidate.is_decorated() || !(self.selector)(&candidate, name) {
            debug!(executor = name, tier = candidate.tier(), "Skipping executor");
            return candidate;
        }

        info!(executor = name, tier = candidate.tier(), "Wrapping executor with task decorator");
        candidate.decorate(Arc::clone(decorator))
    }
}
