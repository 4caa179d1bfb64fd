//! Context source backed by a `thread_local!` slot.

use super::{ContextSnapshot, ContextSource};
use crate::error::ContextError;
use std::cell::RefCell;
use std::thread::LocalKey;

/// A `thread_local!` key holding an optional value.
pub type ThreadLocalSlot<T> = &'static LocalKey<RefCell<Option<T>>>;

/// Transplants the value of a thread-local slot.
///
/// ```
/// use std::cell::RefCell;
/// use threadstate::context::{ContextSnapshot, ContextSource, ThreadLocalSource};
///
/// thread_local! {
///     static TENANT: RefCell<Option<String>> = RefCell::new(None);
/// }
///
/// TENANT.with(|slot| *slot.borrow_mut() = Some("acme".to_string()));
/// let mut snapshot = ThreadLocalSource::new(&TENANT).save().unwrap();
///
/// std::thread::spawn(move || {
///     snapshot.restore().unwrap();
///     assert_eq!(TENANT.with(|slot| slot.borrow().clone()), Some("acme".to_string()));
///     snapshot.cleanup().unwrap();
///     assert_eq!(TENANT.with(|slot| slot.borrow().clone()), None);
/// })
/// .join()
/// .unwrap();
/// ```
pub struct ThreadLocalSource<T: 'static> {
    key: ThreadLocalSlot<T>,
    name: &'static str,
}

impl<T: Clone + Send + 'static> ThreadLocalSource<T> {
    pub fn new(key: ThreadLocalSlot<T>) -> Self {
        Self::named(key, "thread-local")
    }

    /// Name reported in capture, restore and cleanup errors.
    pub fn named(key: ThreadLocalSlot<T>, name: &'static str) -> Self {
        Self { key, name }
    }
}

impl<T: Clone + Send + 'static> ContextSource for ThreadLocalSource<T> {
    fn save(&self) -> Result<Box<dyn ContextSnapshot>, ContextError> {
        let value = self
            .key
            .try_with(|slot| slot.try_borrow().map(|value| value.clone()))
            .map_err(|e| ContextError::capture(self.name, e.to_string()))?
            .map_err(|e| ContextError::capture(self.name, e.to_string()))?;

        Ok(Box::new(ThreadLocalSnapshot {
            key: self.key,
            name: self.name,
            value,
        }))
    }
}

struct ThreadLocalSnapshot<T: 'static> {
    key: ThreadLocalSlot<T>,
    name: &'static str,
    value: Option<T>,
}

impl<T: Clone + Send + 'static> ThreadLocalSnapshot<T> {
    fn replace(&self, value: Option<T>) -> Result<(), String> {
        self.key
            .try_with(|slot| {
                slot.try_borrow_mut()
                    .map(|mut current| *current = value)
                    .map_err(|e| e.to_string())
            })
            .map_err(|e| e.to_string())?
    }
}

impl<T: Clone + Send + 'static> ContextSnapshot for ThreadLocalSnapshot<T> {
    fn restore(&mut self) -> Result<(), ContextError> {
        self.replace(self.value.clone())
            .map_err(|reason| ContextError::restore(self.name, reason))
    }

    fn cleanup(&mut self) -> Result<(), ContextError> {
        self.replace(None)
            .map_err(|reason| ContextError::cleanup(self.name, reason))
    }
}
