//! Context Capture and Transplant
//!
//! Per-thread state does not follow work handed to another thread. A
//! [`ContextSource`] captures that state on the submitting thread as a
//! [`ContextSnapshot`]; the snapshot installs it on the destination thread
//! and clears it once the work is done.
//!
//! Sources compose with [`ContextSourceExt::and_then`]: snapshots are restored
//! in registration order and cleaned up in reverse, like a stack unwinding.

mod composite;
mod decorator;
pub mod diagnostic;
mod thread_local;


use crate::error::ContextError;
use std::sync::Arc;

pub use composite::{CompositeContextSource, CompositeSnapshot};
pub use decorator::ContextDecorator;
pub use diagnostic::{DiagnosticContext, DiagnosticContextSource};
pub use thread_local::{ThreadLocalSlot, ThreadLocalSource};

/// A captured piece of per-thread state.
///
/// `restore` runs at most once, on the destination thread, before the work.
/// `cleanup` clears whatever state is installed on the current thread and must
/// be idempotent: calling it again has no further effect.
pub trait ContextSnapshot: Send {
    fn restore(&mut self) -> Result<(), ContextError>;

    fn cleanup(&mut self) -> Result<(), ContextError>;
}

/// Captures a fresh [`ContextSnapshot`] from the calling thread.
pub trait ContextSource: Send + Sync {
    fn save(&self) -> Result<Box<dyn ContextSnapshot>, ContextError>;

    /// Child sources when this source is itself a composite.
    fn parts(&self) -> Option<&[Arc<dyn ContextSource>]> {
        None
    }
}

impl<S: ContextSource + ?Sized> ContextSource for Arc<S> {
    fn save(&self) -> Result<Box<dyn ContextSnapshot>, ContextError> {
        (**self).save()
    }

    fn parts(&self) -> Option<&[Arc<dyn ContextSource>]> {
        (**self).parts()
    }
}

pub trait ContextSourceExt: ContextSource + Sized + 'static {
    /// Compose two sources; `self` is captured and restored first.
    fn and_then<S>(self, other: S) -> CompositeContextSource
    where
        S: ContextSource + 'static,
    {
        CompositeContextSource::from_pair(Arc::new(self), Arc::new(other))
    }
}

impl<S: ContextSource + Sized + 'static> ContextSourceExt for S {}
