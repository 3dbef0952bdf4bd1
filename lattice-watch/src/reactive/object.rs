//! Reactive Objects
//!
//! A `ReactiveObject` is a string-keyed, insertion-ordered property bag whose
//! reads and writes are tracked per property. It also serves as the
//! map-like collection of the value model.
//!
//! Each property gets its own `Dep`, created lazily the first time an effect
//! reads it. A separate iteration dep covers reads of the key set, so adding
//! or deleting a property notifies effects that enumerated the object.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use super::context::ReactiveContext;
use super::dep::Dep;
use super::value::Value;

struct ObjectInner {
    props: RwLock<IndexMap<Arc<str>, Value>>,
    deps: Mutex<HashMap<Arc<str>, Dep>>,
    iterate: Dep,
}

/// A reactive keyed object.
///
/// # Example
///
/// ```rust,ignore
/// let state = ReactiveObject::new();
/// state.set("count", 1);
///
/// let count = state.get("count");  // tracks "count"
/// state.set("count", 2);           // notifies readers of "count"
/// ```
#[derive(Clone)]
pub struct ReactiveObject {
    inner: Arc<ObjectInner>,
}

impl ReactiveObject {
    /// Create an empty object.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                props: RwLock::new(IndexMap::new()),
                deps: Mutex::new(HashMap::new()),
                iterate: Dep::new(),
            }),
        }
    }

    /// Create an object from key/value pairs.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<Arc<str>>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let object = Self::new();
        {
            let mut props = object.inner.props.write();
            for (key, value) in entries {
                props.insert(key.into(), value.into());
            }
        }
        object
    }

    /// Read a property, tracking it. Missing properties read as `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        self.track_key(key);
        self.get_untracked(key)
    }

    /// Read a property without tracking.
    pub fn get_untracked(&self, key: &str) -> Value {
        self.inner.props.read().get(key).cloned().unwrap_or_default()
    }

    /// Whether a property exists. Tracks the property.
    pub fn contains_key(&self, key: &str) -> bool {
        self.track_key(key);
        self.inner.props.read().contains_key(key)
    }

    /// Write a property.
    ///
    /// Notifies readers of the property if the value changed, and readers of
    /// the key set if the property is new.
    pub fn set(&self, key: impl Into<Arc<str>>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        let added = {
            let mut props = self.inner.props.write();
            match props.get_mut(&key) {
                Some(current) if current.same_value(&value) => return,
                Some(current) => {
                    *current = value;
                    false
                }
                None => {
                    props.insert(key.clone(), value);
                    true
                }
            }
        };

        self.trigger_key(&key);
        if added {
            self.inner.iterate.trigger();
        }
    }

    /// Remove a property, returning its value.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let removed = self.inner.props.write().shift_remove(key);
        if removed.is_some() {
            self.trigger_key(key);
            self.inner.iterate.trigger();
        }
        removed
    }

    /// Property names in insertion order. Tracks the key set.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.inner.iterate.track();
        self.inner.props.read().keys().cloned().collect()
    }

    /// All properties in insertion order. Tracks the key set and every
    /// property.
    pub fn entries(&self) -> Vec<(Arc<str>, Value)> {
        self.keys()
            .into_iter()
            .map(|key| {
                let value = self.get(&key);
                (key, value)
            })
            .collect()
    }

    /// All properties without tracking.
    pub fn entries_untracked(&self) -> Vec<(Arc<str>, Value)> {
        self.inner
            .props
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of properties. Tracks the key set.
    pub fn len(&self) -> usize {
        self.inner.iterate.track();
        self.inner.props.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    fn track_key(&self, key: &str) {
        if !ReactiveContext::is_tracking() {
            return;
        }

        let dep = {
            let mut deps = self.inner.deps.lock();
            match deps.get(key) {
                Some(dep) => dep.clone(),
                None => {
                    let dep = Dep::new();
                    deps.insert(Arc::from(key), dep.clone());
                    dep
                }
            }
        };
        dep.track();
    }

    fn trigger_key(&self, key: &str) {
        let dep = self.inner.deps.lock().get(key).cloned();
        if let Some(dep) = dep {
            dep.trigger();
        }
    }
}

impl Default for ReactiveObject {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveObject")
            .field("id", &format_args!("{:#x}", self.identity()))
            .field("len", &self.inner.props.read().len())
            .finish()
    }
}
