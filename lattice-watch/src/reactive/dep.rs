//! Dependency Cells
//!
//! A `Dep` is the unit of tracking: one per ref, one per reactive property,
//! plus one per collection for iteration. Reading a tracked value calls
//! [`Dep::track`]; writing it calls [`Dep::trigger`].
//!
//! Subscribers are held strongly, the way a live watcher is kept alive by the
//! state it observes. Stopping an effect unsubscribes it from every dep it
//! recorded, which releases those references.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::effect::ReactiveEffect;
use super::ids::{DepId, EffectId};

struct DepInner {
    id: DepId,
    subscribers: Mutex<IndexMap<EffectId, ReactiveEffect>>,
}

/// A set of effects that depend on one piece of reactive state.
#[derive(Clone)]
pub struct Dep {
    inner: Arc<DepInner>,
}

impl Dep {
    /// Create an empty dependency cell.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DepInner {
                id: DepId::new(),
                subscribers: Mutex::new(IndexMap::new()),
            }),
        }
    }

    /// Get the dep's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Subscribe the currently running effect, if any.
    ///
    /// An effect stopped while its getter is still running subscribes to
    /// nothing further.
    pub fn track(&self) {
        let Some(effect) = ReactiveContext::current_effect() else {
            return;
        };
        if !effect.is_active() {
            return;
        }

        let inserted = self
            .inner
            .subscribers
            .lock()
            .insert(effect.id(), effect.clone())
            .is_none();

        if inserted {
            effect.record_dependency(self.clone());
        }
    }

    /// Notify every subscriber that the state changed.
    ///
    /// The effect that is currently running is skipped unless it allows
    /// recursion, so an effect writing what it reads does not loop.
    pub fn trigger(&self) {
        let subscribers: SmallVec<[ReactiveEffect; 4]> =
            self.inner.subscribers.lock().values().cloned().collect();

        if subscribers.is_empty() {
            return;
        }

        let running = ReactiveContext::current_effect_id();
        for effect in subscribers {
            if Some(effect.id()) != running || effect.allows_recurse() {
                effect.notify();
            }
        }
    }

    /// Remove a subscriber.
    pub(crate) fn unsubscribe(&self, effect_id: EffectId) {
        self.inner.subscribers.lock().shift_remove(&effect_id);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
