//! Effect Implementation
//!
//! A `ReactiveEffect` wraps a getter and records which reactive state the
//! getter reads. When any of that state changes the effect is notified: if it
//! has a scheduler the scheduler decides what happens, otherwise the effect
//! simply re-runs.
//!
//! # How Effects Work
//!
//! 1. `run()` drops the dependencies recorded by the previous run, enters a
//!    tracking context, and evaluates the getter. Every ref or reactive
//!    property read during the getter subscribes the effect.
//!
//! 2. A write to any of those subscribes calls `notify()`, which hands
//!    control to the scheduler (or re-runs the effect when there is none).
//!
//! 3. `stop()` unsubscribes the effect everywhere, runs its `on_stop` hook
//!    once, and drops its scheduler. A stopped effect still evaluates its
//!    getter when run explicitly, but tracks nothing.
//!
//! # Ownership
//!
//! The scheduler of a watch usually captures the effect itself (through the
//! job it enqueues). Stopping the effect drops the scheduler, which breaks
//! that cycle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::dep::Dep;
use super::ids::EffectId;
use super::value::Value;

/// The function an effect evaluates.
pub type EffectGetter = Box<dyn Fn() -> Value + Send + Sync>;

/// Called instead of `run()` when a dependency of the effect changes.
pub type EffectScheduler = Arc<dyn Fn() + Send + Sync>;

/// Hook invoked once when the effect is stopped.
pub type StopHook = Box<dyn FnOnce() + Send>;

struct EffectInner {
    id: EffectId,
    getter: EffectGetter,
    scheduler: Mutex<Option<EffectScheduler>>,
    on_stop: Mutex<Option<StopHook>>,
    deps: Mutex<SmallVec<[Dep; 4]>>,
    active: AtomicBool,
    allow_recurse: AtomicBool,
    run_count: AtomicUsize,
}

/// A computation that tracks the reactive state it reads.
///
/// # Example
///
/// ```rust,ignore
/// let count = Ref::new(0);
///
/// let effect = {
///     let count = count.clone();
///     ReactiveEffect::new(move || count.get())
/// };
/// effect.run();
///
/// count.set(5);  // re-runs the effect
/// ```
#[derive(Clone)]
pub struct ReactiveEffect {
    inner: Arc<EffectInner>,
}

impl ReactiveEffect {
    /// Create a new effect. The getter does not run until `run()` is called.
    pub fn new<F>(getter: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(EffectInner {
                id: EffectId::new(),
                getter: Box::new(getter),
                scheduler: Mutex::new(None),
                on_stop: Mutex::new(None),
                deps: Mutex::new(SmallVec::new()),
                active: AtomicBool::new(true),
                allow_recurse: AtomicBool::new(false),
                run_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Install the scheduler invoked when a dependency changes.
    pub fn set_scheduler<F>(&self, scheduler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.scheduler.lock() = Some(Arc::new(scheduler));
    }

    /// Install the hook invoked when the effect is stopped.
    pub fn set_on_stop<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.inner.on_stop.lock() = Some(Box::new(hook));
    }

    /// Allow the effect to be notified by writes made while it is running.
    pub fn set_allow_recurse(&self, allow: bool) {
        self.inner.allow_recurse.store(allow, Ordering::SeqCst);
    }

    /// Whether the effect may be notified by its own writes.
    pub fn allows_recurse(&self) -> bool {
        self.inner.allow_recurse.load(Ordering::SeqCst)
    }

    /// Evaluate the getter, recording its dependencies.
    pub fn run(&self) -> Value {
        if !self.is_active() {
            return (self.inner.getter)();
        }

        if ReactiveContext::is_running(self.id()) {
            tracing::debug!(effect = %self.id(), "skipping re-entrant effect run");
            return Value::Undefined;
        }

        self.clear_dependencies();

        let _ctx = ReactiveContext::enter(self.clone());
        self.inner.run_count.fetch_add(1, Ordering::Relaxed);
        (self.inner.getter)()
    }

    /// Stop the effect.
    ///
    /// Unsubscribes from all dependencies, drops the scheduler, and runs the
    /// `on_stop` hook. Stopping twice is a no-op.
    pub fn stop(&self) {
        if !self.inner.active.swap(false, Ordering::SeqCst) {
            return;
        }

        self.clear_dependencies();
        self.inner.scheduler.lock().take();

        let hook = self.inner.on_stop.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        tracing::debug!(effect = %self.id(), "effect stopped");
    }

    /// Whether the effect is still active.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Get the number of tracked runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::Relaxed)
    }

    /// Get the number of dependencies recorded by the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }

    /// Called by a dep when the state it guards changes.
    pub(crate) fn notify(&self) {
        if !self.is_active() {
            return;
        }

        let scheduler = self.inner.scheduler.lock().clone();
        match scheduler {
            Some(scheduler) => scheduler(),
            None => {
                self.run();
            }
        }
    }

    pub(crate) fn record_dependency(&self, dep: Dep) {
        self.inner.deps.lock().push(dep);
    }

    fn clear_dependencies(&self) {
        let deps = std::mem::take(&mut *self.inner.deps.lock());
        for dep in deps {
            dep.unsubscribe(self.id());
        }
    }
}

impl PartialEq for ReactiveEffect {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ReactiveEffect {}

impl std::fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("active", &self.is_active())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
