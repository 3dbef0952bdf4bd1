//! Reactive Context
//!
//! The reactive context tracks which effect is currently running.
//! This enables automatic dependency tracking: when a ref or a reactive
//! property is read, the running effect is subscribed to it.
//!
//! # Implementation
//!
//! We use a thread-local stack. Running an effect pushes it onto the stack
//! and the returned guard pops it again, even if the computation panics.
//! An entry without an effect pauses tracking, which is how `untrack` works.
//!
//! This design supports nested effects (an effect whose getter runs another
//! effect synchronously).

use std::cell::RefCell;

use super::effect::ReactiveEffect;
use super::ids::EffectId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = RefCell::new(Vec::new());
}

/// An entry in the reactive context stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The effect collecting dependencies, or `None` while tracking is paused.
    effect: Option<ReactiveEffect>,
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    effect_id: Option<EffectId>,
}

impl ReactiveContext {
    /// Enter a tracking context for the given effect.
    ///
    /// While this context is active, every reactive read subscribes the
    /// effect. The context is exited when the returned guard is dropped.
    pub fn enter(effect: ReactiveEffect) -> Self {
        let effect_id = Some(effect.id());
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                effect: Some(effect),
            });
        });

        Self { effect_id }
    }

    /// Enter a context in which reads are not tracked.
    pub fn pause() -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry { effect: None });
        });

        Self { effect_id: None }
    }

    /// Whether reads are currently being tracked.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.effect.is_some())
                .unwrap_or(false)
        })
    }

    /// The effect collecting dependencies, if any.
    pub fn current_effect() -> Option<ReactiveEffect> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.effect.clone())
        })
    }

    /// The ID of the effect collecting dependencies, if any.
    pub fn current_effect_id() -> Option<EffectId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.effect.as_ref().map(ReactiveEffect::id))
        })
    }

    /// Whether the given effect is anywhere on the stack.
    pub fn is_running(id: EffectId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|entry| entry.effect.as_ref().map(ReactiveEffect::id) == Some(id))
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.effect.as_ref().map(ReactiveEffect::id),
                    self.effect_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}

/// Evaluate `f` without tracking any of its reads.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::pause();
    f()
}
