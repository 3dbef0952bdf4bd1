//! Watch Registration
//!
//! `do_watch` wires a normalized source to an effect, picks the scheduler
//! for the requested flush timing, and performs the first evaluation.
//!
//! # The job
//!
//! Every registration owns exactly one job. The effect's scheduler either
//! runs the job on the spot (`sync`, or `pre` before the owner mounts) or
//! queues it, and the queues run a job at most once per batch. The job:
//!
//! 1. does nothing if the effect has been stopped, so jobs queued before a
//!    stop are inert;
//! 2. for a bare effect, simply re-runs the effect;
//! 3. for a watch with a callback, re-runs the effect, decides whether the
//!    result counts as a change, and if so runs the previous cleanup hook,
//!    calls the callback, and only then records the new value as the old one.
//!
//! The callback runs untracked. A sync job can fire while some other effect
//! is running, and that effect must not pick up the callback's reads.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::component::{ComponentInstance, WeakInstance};
use crate::error::{call_with_error_handling, ErrorContext};
use crate::reactive::{untrack, ReactiveEffect, Value};
use crate::scheduler::{queue_post_flush_cb, queue_pre_flush_cb, Job};

use super::cleanup::CleanupSlot;
use super::equality::{any_slot_changed, should_trigger};
use super::options::{FlushTiming, WatchOptions};
use super::source::{normalize, Normalized, Source};
use super::WatchCallback;

/// The value the callback last saw.
enum OldValue {
    /// Nothing fired yet. Any first evaluation counts as a change.
    Initial,
    Seen(Value),
}

/// State owned by one registration and touched only by its job.
struct WatchState {
    callback: Option<WatchCallback>,
    deep: bool,
    is_multi: bool,
    old_value: Mutex<OldValue>,
    cleanup: CleanupSlot,
}

impl WatchState {
    fn fire(&self, effect: &ReactiveEffect) {
        if !effect.is_active() {
            return;
        }

        let Some(callback) = &self.callback else {
            effect.run();
            return;
        };

        let new_value = effect.run();
        let changed = self.deep || self.has_changed(&new_value, &self.old_value.lock());
        if !changed {
            return;
        }

        self.cleanup.run();

        let old_value = match &*self.old_value.lock() {
            OldValue::Seen(value) => value.clone(),
            OldValue::Initial if self.is_multi => Value::array(Vec::new()),
            OldValue::Initial => Value::Undefined,
        };
        let on_cleanup = self.cleanup.registrar();
        untrack(|| {
            call_with_error_handling(ErrorContext::WatchCallback, || {
                callback(&new_value, &old_value, &on_cleanup)
            })
        });

        *self.old_value.lock() = OldValue::Seen(new_value);
    }

    fn has_changed(&self, new_value: &Value, old_value: &OldValue) -> bool {
        match old_value {
            OldValue::Initial => true,
            OldValue::Seen(old) if self.is_multi => any_slot_changed(
                new_value.as_array().unwrap_or_default(),
                old.as_array().unwrap_or_default(),
            ),
            OldValue::Seen(old) => should_trigger(new_value, old),
        }
    }
}

/// Stops a watch.
///
/// Dropping the handle does not stop anything; a watch lives until
/// [`stop`](Self::stop) is called or its owning instance unmounts.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    effect: ReactiveEffect,
    instance: Option<WeakInstance>,
}

impl WatchHandle {
    /// Stop the watch: release its dependencies, run any pending cleanup
    /// hook, and detach it from its owner's scope. Jobs already queued
    /// become no-ops.
    pub fn stop(&self) {
        self.effect.stop();
        if let Some(instance) = self.instance.as_ref().and_then(WeakInstance::upgrade) {
            instance.scope().remove(&self.effect);
        }
    }

    /// Whether the watch has not been stopped.
    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    /// The underlying effect.
    pub fn effect(&self) -> &ReactiveEffect {
        &self.effect
    }
}

pub(crate) fn do_watch(
    source: Source,
    callback: Option<WatchCallback>,
    options: WatchOptions,
    instance: Option<&ComponentInstance>,
) -> WatchHandle {
    let owner = instance.map(ComponentInstance::downgrade);
    let cleanup = CleanupSlot::new();

    let Normalized {
        getter,
        deep,
        is_multi,
    } = normalize(
        source,
        callback.is_some(),
        options.deep,
        &cleanup,
        owner.clone(),
    );

    let effect = ReactiveEffect::new(getter);
    let has_callback = callback.is_some();
    let state = Arc::new(WatchState {
        callback,
        deep,
        is_multi,
        old_value: Mutex::new(OldValue::Initial),
        cleanup: cleanup.clone(),
    });

    let job = {
        let effect = effect.clone();
        let state = state.clone();
        Job::new(move || state.fire(&effect))
    };
    job.set_allow_recurse(has_callback);

    match options.flush {
        FlushTiming::Sync => {
            let job = job.clone();
            effect.set_scheduler(move || job.run());
        }
        FlushTiming::Post => {
            let job = job.clone();
            effect.set_scheduler(move || queue_post_flush_cb(&job));
        }
        FlushTiming::Pre => {
            let job = job.clone();
            let owner = owner.clone();
            effect.set_scheduler(move || match owner.as_ref().and_then(WeakInstance::upgrade) {
                Some(instance) if !instance.is_mounted() => job.run(),
                _ => queue_pre_flush_cb(&job),
            });
        }
    }

    effect.set_on_stop(move || cleanup.run());

    if let Some(instance) = instance {
        instance.scope().record(effect.clone());
    }

    tracing::debug!(
        effect = %effect.id(),
        flush = ?options.flush,
        deep,
        is_multi,
        has_callback,
        "watch registered"
    );

    if has_callback {
        if options.immediate {
            job.run();
        } else {
            *state.old_value.lock() = OldValue::Seen(effect.run());
        }
    } else if options.flush == FlushTiming::Post {
        let effect = effect.clone();
        queue_post_flush_cb(&Job::new(move || {
            if effect.is_active() {
                effect.run();
            }
        }));
    } else {
        effect.run();
    }

    WatchHandle {
        effect,
        instance: owner,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
