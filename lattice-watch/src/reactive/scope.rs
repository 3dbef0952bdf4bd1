//! Effect Scopes
//!
//! An `EffectScope` owns the effects created on behalf of one component
//! instance so they can all be stopped together when the instance is torn
//! down. Stopping a single watch removes its effect from the scope, which
//! keeps the scope from stopping it a second time later.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::effect::ReactiveEffect;

/// An ordered collection of owned effects.
#[derive(Debug)]
pub struct EffectScope {
    active: AtomicBool,
    effects: Mutex<Vec<ReactiveEffect>>,
}

impl EffectScope {
    /// Create an empty, active scope.
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            effects: Mutex::new(Vec::new()),
        }
    }

    /// Add an effect to the scope.
    ///
    /// Recording into a scope that was already stopped stops the effect
    /// right away.
    pub fn record(&self, effect: ReactiveEffect) {
        if !self.is_active() {
            effect.stop();
            return;
        }
        self.effects.lock().push(effect);
    }

    /// Remove an effect from the scope. Returns whether it was a member.
    pub fn remove(&self, effect: &ReactiveEffect) -> bool {
        let mut effects = self.effects.lock();
        match effects.iter().position(|e| e == effect) {
            Some(index) => {
                effects.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether an effect is a member of the scope.
    pub fn contains(&self, effect: &ReactiveEffect) -> bool {
        self.effects.lock().iter().any(|e| e == effect)
    }

    /// Stop every member effect and deactivate the scope.
    pub fn stop(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }

        let effects = std::mem::take(&mut *self.effects.lock());
        tracing::debug!(count = effects.len(), "stopping effect scope");
        for effect in effects {
            effect.stop();
        }
    }

    /// Whether the scope has not been stopped yet.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Number of member effects.
    pub fn len(&self) -> usize {
        self.effects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EffectScope {
    fn default() -> Self {
        Self::new()
    }
}
