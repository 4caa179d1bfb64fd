//! Ordered composition of context sources and snapshots.

use super::{ContextSnapshot, ContextSource};
use crate::error::ContextError;
use std::sync::Arc;
use tracing::warn;

/// Captures every child source in registration order.
///
/// Composing composites never nests: child lists are spliced together.
#[derive(Clone, Default)]
pub struct CompositeContextSource {
    sources: Vec<Arc<dyn ContextSource>>,
}

impl CompositeContextSource {
    pub fn new(sources: Vec<Arc<dyn ContextSource>>) -> Self {
        let mut flattened = Vec::with_capacity(sources.len());
        for source in sources {
            push_flattened(&mut flattened, source);
        }
        Self { sources: flattened }
    }

    pub(crate) fn from_pair(first: Arc<dyn ContextSource>, second: Arc<dyn ContextSource>) -> Self {
        Self::new(vec![first, second])
    }

    /// Append another source (or the children of another composite).
    pub fn and_then<S>(mut self, other: S) -> Self
    where
        S: ContextSource + 'static,
    {
        push_flattened(&mut self.sources, Arc::new(other));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn push_flattened(sources: &mut Vec<Arc<dyn ContextSource>>, source: Arc<dyn ContextSource>) {
    match source.parts() {
        Some(parts) => sources.extend(parts.iter().cloned()),
        None => sources.push(source),
    }
}

impl ContextSource for CompositeContextSource {
    fn save(&self) -> Result<Box<dyn ContextSnapshot>, ContextError> {
        let mut snapshots = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            snapshots.push(source.save()?);
        }
        Ok(Box::new(CompositeSnapshot::new(snapshots)))
    }

    fn parts(&self) -> Option<&[Arc<dyn ContextSource>]> {
        Some(&self.sources)
    }
}

/// Restores children in capture order and cleans them up in reverse, once.
pub struct CompositeSnapshot {
    snapshots: Vec<Box<dyn ContextSnapshot>>,
    cleaned: bool,
}

impl CompositeSnapshot {
    pub fn new(snapshots: Vec<Box<dyn ContextSnapshot>>) -> Self {
        Self {
            snapshots,
            cleaned: false,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Clean up the first `count` children, last first. Failures are logged.
    fn unwind(&mut self, count: usize) {
        for (index, snapshot) in self.snapshots[..count].iter_mut().enumerate().rev() {
            if let Err(e) = snapshot.cleanup() {
                warn!(
                    snapshot_index = index,
                    error = %e,
                    "Context cleanup failed, continuing with remaining snapshots"
                );
            }
        }
    }
}

impl ContextSnapshot for CompositeSnapshot {
    fn restore(&mut self) -> Result<(), ContextError> {
        for index in 0..self.snapshots.len() {
            if let Err(e) = self.snapshots[index].restore() {
                // The failing child may have installed part of its state.
                self.unwind(index + 1);
                self.cleaned = true;
                return Err(e);
            }
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), ContextError> {
        if self.cleaned {
            return Ok(());
        }
        self.cleaned = true;
        self.unwind(self.snapshots.len());
        Ok(())
    }
}
