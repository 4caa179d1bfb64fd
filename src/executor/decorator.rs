//! Task decorators and their composition.

use super::job::TaskBody;
use crate::error::TaskError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Wraps a task body with behavior that runs around it.
///
/// `decorate` is called on the submitting thread. Anything it captures must be
/// captured there, before it returns; the returned body may run later on
/// another thread.
pub trait TaskDecorator: Send + Sync {
    fn decorate(&self, body: TaskBody) -> Result<TaskBody, TaskError>;

    /// Child decorators when this decorator is itself a chain.
    fn parts(&self) -> Option<&[Arc<dyn TaskDecorator>]> {
        None
    }
}

impl<F> TaskDecorator for F
where
    F: Fn(TaskBody) -> Result<TaskBody, TaskError> + Send + Sync,
{
    fn decorate(&self, body: TaskBody) -> Result<TaskBody, TaskError> {
        self(body)
    }
}

/// Ordered decorators; the first one is the outermost wrapper.
#[derive(Clone, Default)]
pub struct DecoratorChain {
    decorators: Vec<Arc<dyn TaskDecorator>>,
}

impl DecoratorChain {
    pub fn new(decorators: Vec<Arc<dyn TaskDecorator>>) -> Self {
        let mut flattened = Vec::with_capacity(decorators.len());
        for decorator in decorators {
            push_flattened(&mut flattened, decorator);
        }
        Self {
            decorators: flattened,
        }
    }

    pub fn and_then<D>(mut self, other: D) -> Self
    where
        D: TaskDecorator + 'static,
    {
        push_flattened(&mut self.decorators, Arc::new(other));
        self
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

fn push_flattened(decorators: &mut Vec<Arc<dyn TaskDecorator>>, decorator: Arc<dyn TaskDecorator>) {
    match decorator.parts() {
        Some(parts) => decorators.extend(parts.iter().cloned()),
        None => decorators.push(decorator),
    }
}

impl TaskDecorator for DecoratorChain {
    fn decorate(&self, body: TaskBody) -> Result<TaskBody, TaskError> {
        self.decorators
            .iter()
            .rev()
            .try_fold(body, |body, decorator| decorator.decorate(body))
    }

    fn parts(&self) -> Option<&[Arc<dyn TaskDecorator>]> {
        Some(&self.decorators)
    }
}

pub trait TaskDecoratorExt: TaskDecorator {
    /// Decorate a value-producing task.
    fn wrap<T, F>(&self, work: F) -> Result<DecoratedTask<T>, TaskError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(None));
        let output = Arc::clone(&slot);
        let body = self.decorate(Box::new(move || {
            let value = work()?;
            *output.lock() = Some(value);
            Ok(())
        }))?;
        Ok(DecoratedTask { body, slot })
    }

    /// Compose two decorators; `self` wraps `other`.
    fn and_then<D>(self, other: D) -> DecoratorChain
    where
        Self: Sized + 'static,
        D: TaskDecorator + 'static,
    {
        DecoratorChain::new(vec![Arc::new(self), Arc::new(other)])
    }
}

impl<D: TaskDecorator + ?Sized> TaskDecoratorExt for D {}

/// A decorated task ready to run on any thread.
pub struct DecoratedTask<T> {
    body: TaskBody,
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> DecoratedTask<T> {
    pub fn call(self) -> Result<T, TaskError> {
        (self.body)()?;
        self.slot.lock().take().ok_or(TaskError::Cancelled)
    }
}
