//! Ref Implementation
//!
//! A `Ref` is the simplest reactive primitive: a box holding one `Value`.
//!
//! # How Refs Work
//!
//! 1. Reading with `get()` inside a running effect subscribes that effect.
//!
//! 2. Writing with `set()` replaces the value and notifies subscribers, but
//!    only if the new value differs from the old one by `same_value`.
//!    Writing the same number twice, or the same object handle twice,
//!    notifies nobody.
//!
//! # Thread Safety
//!
//! The value is protected by a `RwLock`. Locks are never held while
//! subscribers run, so subscribers may freely read and write the ref.

use std::sync::Arc;

use parking_lot::RwLock;

use super::dep::Dep;
use super::value::Value;

struct RefInner {
    value: RwLock<Value>,
    dep: Dep,
}

/// A reactive box holding a value.
///
/// # Example
///
/// ```rust,ignore
/// let count = Ref::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (notifies subscribers)
/// count.set(5);
/// ```
#[derive(Clone)]
pub struct Ref {
    inner: Arc<RefInner>,
}

impl Ref {
    /// Create a new ref with the given initial value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            inner: Arc::new(RefInner {
                value: RwLock::new(value.into()),
                dep: Dep::new(),
            }),
        }
    }

    /// Get the current value, subscribing the running effect.
    pub fn get(&self) -> Value {
        self.inner.dep.track();
        self.get_untracked()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> Value {
        self.inner.value.read().clone()
    }

    /// Set a new value and notify subscribers if it changed.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        {
            let mut guard = self.inner.value.write();
            if guard.same_value(&value) {
                return;
            }
            *guard = value;
        }

        self.inner.dep.trigger();
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let new_value = f(&self.get_untracked());
        self.set(new_value);
    }

    /// Notify subscribers without changing the value.
    ///
    /// Useful after mutating an object held by the ref in place.
    pub fn trigger(&self) {
        self.inner.dep.trigger();
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.dep.subscriber_count()
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl std::fmt::Debug for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
