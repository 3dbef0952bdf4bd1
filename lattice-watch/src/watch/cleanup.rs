//! Cleanup Hooks
//!
//! A watch callback (or a bare effect) may register one cleanup hook per
//! invocation. The hook runs right before the next invocation, or when the
//! watch is stopped, whichever comes first. Registering again replaces the
//! previous hook.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{call_with_error_handling, ErrorContext};

type CleanupFn = Box<dyn FnOnce() + Send>;

/// The per-registration cleanup slot.
#[derive(Clone, Default)]
pub(crate) struct CleanupSlot {
    hook: Arc<Mutex<Option<CleanupFn>>>,
}

impl CleanupSlot {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn store(&self, hook: CleanupFn) {
        *self.hook.lock() = Some(hook);
    }

    /// Run and clear the registered hook, if any.
    pub(crate) fn run(&self) {
        let hook = self.hook.lock().take();
        if let Some(hook) = hook {
            call_with_error_handling(ErrorContext::WatchCleanup, hook);
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.hook.lock().is_some()
    }

    pub(crate) fn registrar(&self) -> OnCleanup {
        OnCleanup { slot: self.clone() }
    }
}

/// Registers the cleanup hook for the current invocation.
///
/// # Example
///
/// ```rust,ignore
/// watch_effect(
///     move |on_cleanup| {
///         let subscription = feed.subscribe(id.get());
///         on_cleanup.register(move || subscription.cancel());
///     },
///     WatchEffectOptions::default(),
///     None,
/// );
/// ```
#[derive(Clone)]
pub struct OnCleanup {
    slot: CleanupSlot,
}

impl OnCleanup {
    /// Register `hook`, replacing any hook registered earlier.
    pub fn register<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.slot.store(Box::new(hook));
    }
}

impl std::fmt::Debug for OnCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnCleanup")
            .field("registered", &self.slot.is_set())
            .finish()
    }
}
