//! Reactive Lists
//!
//! A `ReactiveList` is an ordered sequence with per-index tracking plus a
//! length dep. Structural changes (push, pop, insert, remove) notify the
//! length dep and every index at or after the first shifted position.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::context::ReactiveContext;
use super::dep::Dep;
use super::value::Value;

struct ListInner {
    items: RwLock<Vec<Value>>,
    index_deps: Mutex<Vec<Option<Dep>>>,
    length: Dep,
}

/// A reactive sequence.
#[derive(Clone)]
pub struct ReactiveList {
    inner: Arc<ListInner>,
}

impl ReactiveList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    /// Create a list holding the given values.
    pub fn from_values(items: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(ListInner {
                items: RwLock::new(items),
                index_deps: Mutex::new(Vec::new()),
                length: Dep::new(),
            }),
        }
    }

    /// Read an item, tracking its index. Out-of-range reads are `Undefined`.
    pub fn get(&self, index: usize) -> Value {
        self.track_index(index);
        self.inner.items.read().get(index).cloned().unwrap_or_default()
    }

    /// Number of items. Tracks the length.
    pub fn len(&self) -> usize {
        self.inner.length.track();
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All items. Tracks the length and every index.
    pub fn values(&self) -> Vec<Value> {
        let len = self.len();
        (0..len).map(|i| self.get(i)).collect()
    }

    /// All items without tracking.
    pub fn values_untracked(&self) -> Vec<Value> {
        self.inner.items.read().clone()
    }

    /// Replace the item at `index`. Writing past the end pads with
    /// `Undefined`.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let value = value.into();
        let grew = {
            let mut items = self.inner.items.write();
            if index < items.len() {
                if items[index].same_value(&value) {
                    return;
                }
                items[index] = value;
                false
            } else {
                items.resize(index, Value::Undefined);
                items.push(value);
                true
            }
        };

        self.trigger_index(index);
        if grew {
            self.inner.length.trigger();
        }
    }

    /// Append an item.
    pub fn push(&self, value: impl Into<Value>) {
        let index = {
            let mut items = self.inner.items.write();
            items.push(value.into());
            items.len() - 1
        };
        self.trigger_from(index);
    }

    /// Remove and return the last item.
    pub fn pop(&self) -> Option<Value> {
        let (value, index) = {
            let mut items = self.inner.items.write();
            let value = items.pop()?;
            (value, items.len())
        };
        self.trigger_from(index);
        Some(value)
    }

    /// Insert an item, shifting later items.
    pub fn insert(&self, index: usize, value: impl Into<Value>) {
        let index = {
            let mut items = self.inner.items.write();
            let index = index.min(items.len());
            items.insert(index, value.into());
            index
        };
        self.trigger_from(index);
    }

    /// Remove the item at `index`, shifting later items.
    pub fn remove(&self, index: usize) -> Option<Value> {
        let value = {
            let mut items = self.inner.items.write();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.trigger_from(index);
        Some(value)
    }

    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    fn track_index(&self, index: usize) {
        if !ReactiveContext::is_tracking() {
            return;
        }

        let dep = {
            let mut deps = self.inner.index_deps.lock();
            if deps.len() <= index {
                deps.resize(index + 1, None);
            }
            deps[index].get_or_insert_with(Dep::new).clone()
        };
        dep.track();
    }

    fn trigger_index(&self, index: usize) {
        let dep = self
            .inner
            .index_deps
            .lock()
            .get(index)
            .and_then(|dep| dep.clone());
        if let Some(dep) = dep {
            dep.trigger();
        }
    }

    fn trigger_from(&self, start: usize) {
        let deps: Vec<Dep> = self
            .inner
            .index_deps
            .lock()
            .iter()
            .skip(start)
            .flatten()
            .cloned()
            .collect();

        self.inner.length.trigger();
        for dep in deps {
            dep.trigger();
        }
    }
}

impl Default for ReactiveList {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Into<Value>> FromIterator<T> for ReactiveList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Debug for ReactiveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveList")
            .field("id", &format_args!("{:#x}", self.identity()))
            .field("len", &self.inner.items.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::ReactiveEffect;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn counting_effect<F>(read: F) -> (ReactiveEffect, Arc<AtomicI32>)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = {
            let runs = runs.clone();
            ReactiveEffect::new(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                read();
                Value::Undefined
            })
        };
        effect.run();
        (effect, runs)
    }

    #[test]
    fn index_reads_are_tracked() {
        let list: ReactiveList = [1, 2, 3].into_iter().collect();
        let (_effect, runs) = {
            let list = list.clone();
            counting_effect(move || {
                list.get(1);
            })
        };

        list.set(0, 10);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        list.set(1, 20);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn push_notifies_length_readers() {
        let list = ReactiveList::new();
        let (_effect, runs) = {
            let list = list.clone();
            counting_effect(move || {
                list.len();
            })
        };

        list.push("a");
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(list.pop(), Some(Value::from("a")));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(list.pop(), None);
    }

    #[test]
    fn remove_shifts_tracked_indices() {
        let list: ReactiveList = ["a", "b", "c"].into_iter().collect();
        let (_effect, runs) = {
            let list = list.clone();
            counting_effect(move || {
                list.get(2);
            })
        };

        list.remove(0);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(list.values_untracked().len(), 2);
        assert!(list.get(2).is_undefined());
    }

    #[test]
    fn set_past_end_pads() {
        let list = ReactiveList::new();
        list.set(2, true);
        assert_eq!(
            Value::from(list).to_json(),
            serde_json::json!([null, null, true])
        );
    }
}
