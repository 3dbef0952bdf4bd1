//! Watch Targets
//!
//! A `WatchTarget` plays the role of a component for legacy watchers: it owns
//! the reactive data that paths resolve against, a table of named methods
//! that string handlers refer to, and every watcher created on it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use crate::error::{self, WatchError};
use crate::reactive::{ReactiveObject, Value};
use crate::scheduler::JobId;

use super::options::LegacyCallback;
use super::watcher::Watcher;

struct TargetInner {
    data: ReactiveObject,
    methods: RwLock<IndexMap<String, LegacyCallback>>,
    watchers: Mutex<Vec<Arc<Watcher>>>,
    named: Mutex<IndexMap<String, Arc<Watcher>>>,
    destroyed: AtomicBool,
}

/// An object legacy watchers are created on.
#[derive(Clone)]
pub struct WatchTarget {
    inner: Arc<TargetInner>,
}

impl WatchTarget {
    /// Create a target with empty data.
    pub fn new() -> Self {
        Self::with_data(ReactiveObject::new())
    }

    /// Create a target around existing data.
    pub fn with_data(data: ReactiveObject) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                data,
                methods: RwLock::new(IndexMap::new()),
                watchers: Mutex::new(Vec::new()),
                named: Mutex::new(IndexMap::new()),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// The reactive data paths resolve against.
    pub fn data(&self) -> &ReactiveObject {
        &self.inner.data
    }

    /// Define a method that string handlers can name.
    pub fn define_method<F>(&self, name: impl Into<String>, method: F)
    where
        F: Fn(&WatchTarget, &Value, &Value) + Send + Sync + 'static,
    {
        self.inner
            .methods
            .write()
            .insert(name.into(), Arc::new(method));
    }

    /// The method registered under `name`.
    pub fn method(&self, name: &str) -> Option<LegacyCallback> {
        self.inner.methods.read().get(name).cloned()
    }

    /// The watcher currently registered under `name`.
    pub fn watcher_named(&self, name: &str) -> Option<Arc<Watcher>> {
        self.inner.named.lock().get(name).cloned()
    }

    /// Number of watchers registered under a name.
    pub fn named_watcher_count(&self) -> usize {
        self.inner.named.lock().len()
    }

    /// Number of live watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.lock().len()
    }

    /// Tear down every watcher created on the target.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let watchers = std::mem::take(&mut *self.inner.watchers.lock());
        let count = watchers.len();
        for watcher in watchers {
            watcher.teardown();
        }
        tracing::debug!(watchers = count, "watch target destroyed");
    }

    /// Whether [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn downgrade(&self) -> WeakTarget {
        WeakTarget {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn add_watcher(&self, watcher: Arc<Watcher>) {
        self.inner.watchers.lock().push(watcher);
    }

    pub(crate) fn remove_watcher(&self, id: JobId) {
        self.inner.watchers.lock().retain(|w| w.id() != id);
    }

    /// Register `watcher` under `name`. A taken name is reported and the
    /// entry replaced; the previous watcher keeps running.
    pub(crate) fn register_named(&self, name: &str, watcher: Arc<Watcher>) {
        let previous = self.inner.named.lock().insert(name.to_string(), watcher);
        if previous.is_some() {
            error::warn(WatchError::DuplicateWatcher(name.to_string()));
        }
    }
}

impl Default for WatchTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchTarget")
            .field("data", &self.inner.data)
            .field("watcher_count", &self.watcher_count())
            .field("named_watcher_count", &self.named_watcher_count())
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct WeakTarget {
    inner: Weak<TargetInner>,
}

impl WeakTarget {
    pub(crate) fn upgrade(&self) -> Option<WatchTarget> {
        self.inner.upgrade().map(|inner| WatchTarget { inner })
    }
}
