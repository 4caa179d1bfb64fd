//! Diagnostic Context
//!
//! A per-thread string map for log correlation data such as request or
//! correlation ids. Values placed here on a request thread reach pooled worker
//! threads through [`DiagnosticContextSource`].

use super::{ContextSnapshot, ContextSource};
use crate::error::ContextError;
use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static DIAGNOSTIC_CONTEXT: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
}

/// Accessors for the current thread's diagnostic map.
pub struct DiagnosticContext;

impl DiagnosticContext {
    pub fn put(key: impl Into<String>, value: impl Into<String>) {
        DIAGNOSTIC_CONTEXT.with(|map| {
            map.borrow_mut().insert(key.into(), value.into());
        });
    }

    pub fn get(key: &str) -> Option<String> {
        DIAGNOSTIC_CONTEXT.with(|map| map.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) -> Option<String> {
        DIAGNOSTIC_CONTEXT.with(|map| map.borrow_mut().remove(key))
    }

    pub fn clear() {
        DIAGNOSTIC_CONTEXT.with(|map| map.borrow_mut().clear());
    }

    pub fn is_empty() -> bool {
        DIAGNOSTIC_CONTEXT.with(|map| map.borrow().is_empty())
    }

    pub fn copy() -> BTreeMap<String, String> {
        DIAGNOSTIC_CONTEXT.with(|map| map.borrow().clone())
    }

    /// Replace the whole map.
    pub fn replace(entries: BTreeMap<String, String>) {
        DIAGNOSTIC_CONTEXT.with(|map| *map.borrow_mut() = entries);
    }

    /// `key=value` pairs separated by spaces, in key order.
    pub fn render() -> String {
        DIAGNOSTIC_CONTEXT.with(|map| {
            map.borrow()
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }
}

/// Captures the diagnostic map of the submitting thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagnosticContextSource;

impl DiagnosticContextSource {
    pub fn new() -> Self {
        Self
    }
}

impl ContextSource for DiagnosticContextSource {
    fn save(&self) -> Result<Box<dyn ContextSnapshot>, ContextError> {
        let entries = DIAGNOSTIC_CONTEXT
            .try_with(|map| map.try_borrow().map(|map| map.clone()))
            .map_err(|e| ContextError::capture("diagnostic", e.to_string()))?
            .map_err(|e| ContextError::capture("diagnostic", e.to_string()))?;

        // An empty capture still clears whatever the worker thread carries.
        let entries = if entries.is_empty() { None } else { Some(entries) };
        Ok(Box::new(DiagnosticSnapshot { entries }))
    }
}

struct DiagnosticSnapshot {
    entries: Option<BTreeMap<String, String>>,
}

/// Overwrite the current thread's map without panicking on a held borrow or
/// a destroyed thread-local.
fn store(entries: BTreeMap<String, String>) -> Result<(), String> {
    DIAGNOSTIC_CONTEXT
        .try_with(|map| {
            map.try_borrow_mut()
                .map(|mut current| *current = entries)
                .map_err(|e| e.to_string())
        })
        .map_err(|e| e.to_string())?
}

impl ContextSnapshot for DiagnosticSnapshot {
    fn restore(&mut self) -> Result<(), ContextError> {
        store(self.entries.clone().unwrap_or_default())
            .map_err(|reason| ContextError::restore("diagnostic", reason))
    }

    fn cleanup(&mut self) -> Result<(), ContextError> {
        store(BTreeMap::new()).map_err(|reason| ContextError::cleanup("diagnostic", reason))
    }
}
