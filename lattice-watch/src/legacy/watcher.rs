//! Legacy Watchers
//!
//! A `Watcher` evaluates an expression against its target inside a tracking
//! effect and calls its callback when the value changes. Unlike the watch
//! core it keeps the current value itself and compares on every run.
//!
//! # Update path
//!
//! A dependency change calls `update()`. A `sync` watcher runs right there;
//! any other watcher queues its job on the render queue, where it runs once
//! per flush no matter how many changes it saw.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{call_with_error_handling, ErrorContext};
use crate::reactive::{untrack, ReactiveEffect, Value};
use crate::scheduler::{queue_job, Job, JobId};
use crate::watch::traverse;

use super::expression::Expression;
use super::options::{LegacyCallback, LegacyWatchOptions};
use super::target::{WatchTarget, WeakTarget};

/// A watcher created on a [`WatchTarget`].
pub struct Watcher {
    expression: String,
    target: WeakTarget,
    callback: LegacyCallback,
    deep: bool,
    sync: bool,
    user: bool,
    effect: ReactiveEffect,
    job: Job,
    value: Mutex<Value>,
    immediate_async: AtomicBool,
}

impl Watcher {
    /// Create a watcher on `target`, evaluate it once, and add it to the
    /// target's watcher list.
    pub fn new(
        target: &WatchTarget,
        expression: Expression,
        callback: LegacyCallback,
        options: &LegacyWatchOptions,
    ) -> Arc<Self> {
        let text = expression.to_string();
        let getter = expression.compile();
        let deep = options.deep;

        let effect = {
            let target = target.downgrade();
            ReactiveEffect::new(move || {
                let Some(target) = target.upgrade() else {
                    return Value::Undefined;
                };
                let value = call_with_error_handling(ErrorContext::LegacyGetter, || {
                    getter(&target)
                })
                .unwrap_or_default();
                if deep {
                    traverse(&value)
                } else {
                    value
                }
            })
        };

        let watcher = Arc::new_cyclic(|weak: &Weak<Watcher>| {
            let job = {
                let weak = weak.clone();
                Job::new(move || {
                    if let Some(watcher) = weak.upgrade() {
                        watcher.run();
                    }
                })
            };
            {
                let weak = weak.clone();
                effect.set_scheduler(move || {
                    if let Some(watcher) = weak.upgrade() {
                        watcher.update();
                    }
                });
            }

            Watcher {
                expression: text,
                target: target.downgrade(),
                callback,
                deep,
                sync: options.sync,
                user: options.user,
                effect,
                job,
                value: Mutex::new(Value::Undefined),
                immediate_async: AtomicBool::new(false),
            }
        });

        let value = watcher.get();
        *watcher.value.lock() = value;
        target.add_watcher(watcher.clone());

        tracing::debug!(
            watcher = %watcher.id(),
            expression = %watcher.expression,
            deep,
            sync = options.sync,
            "legacy watcher created"
        );
        watcher
    }

    /// The watcher's job ID.
    pub fn id(&self) -> JobId {
        self.job.id()
    }

    /// The watched path, or a placeholder for getter watchers.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Re-evaluate the expression, re-collecting dependencies.
    pub fn get(&self) -> Value {
        self.effect.run()
    }

    /// The value seen by the last run.
    pub fn value(&self) -> Value {
        self.value.lock().clone()
    }

    /// The job queued on changes.
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Whether the watcher has not been torn down.
    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    /// React to a dependency change.
    pub fn update(&self) {
        if self.sync {
            self.run();
        } else {
            queue_watcher(self);
        }
    }

    /// Re-evaluate and call the callback if the value changed.
    pub fn run(&self) {
        if !self.is_active() {
            return;
        }

        let value = self.get();
        let forced = self.immediate_async.swap(false, Ordering::SeqCst);
        let old_value = {
            let mut current = self.value.lock();
            let changed =
                forced || !value.same_value(&current) || value.is_object() || self.deep;
            if !changed {
                return;
            }
            std::mem::replace(&mut *current, value.clone())
        };
        let old_value = if forced { Value::Undefined } else { old_value };

        let Some(target) = self.target.upgrade() else {
            return;
        };
        untrack(|| {
            if self.user {
                call_with_error_handling(ErrorContext::LegacyCallback, || {
                    (self.callback)(&target, &value, &old_value)
                });
            } else {
                (self.callback)(&target, &value, &old_value);
            }
        });
    }

    /// Make the next queued run fire even if the value is unchanged.
    pub fn mark_immediate_async(&self) {
        self.immediate_async.store(true, Ordering::SeqCst);
    }

    /// Stop the watcher and remove it from its target.
    pub fn teardown(&self) {
        if !self.is_active() {
            return;
        }
        if let Some(target) = self.target.upgrade() {
            target.remove_watcher(self.id());
        }
        self.effect.stop();
        tracing::debug!(
            watcher = %self.id(),
            expression = %self.expression,
            "legacy watcher torn down"
        );
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id())
            .field("expression", &self.expression)
            .field("deep", &self.deep)
            .field("sync", &self.sync)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Queue a watcher's job on the render queue.
pub fn queue_watcher(watcher: &Watcher) {
    queue_job(&watcher.job);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::flush_jobs;
    use std::sync::atomic::AtomicI32;

    fn counting(calls: &Arc<AtomicI32>) -> LegacyCallback {
        let calls = calls.clone();
        Arc::new(move |_: &WatchTarget, _: &Value, _: &Value| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn watcher_records_initial_value() {
        let target = WatchTarget::new();
        target.data().set("count", 1);

        let calls = Arc::new(AtomicI32::new(0));
        let watcher = Watcher::new(
            &target,
            "count".into(),
            counting(&calls),
            &LegacyWatchOptions::new(),
        );

        assert_eq!(watcher.value(), Value::from(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(target.watcher_count(), 1);
    }

    #[test]
    fn queued_watcher_runs_once_per_flush() {
        let target = WatchTarget::new();
        target.data().set("count", 0);

        let calls = Arc::new(AtomicI32::new(0));
        let watcher = Watcher::new(
            &target,
            "count".into(),
            counting(&calls),
            &LegacyWatchOptions::new(),
        );

        target.data().set("count", 1);
        target.data().set("count", 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        flush_jobs();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(watcher.value(), Value::from(2));
    }

    #[test]
    fn sync_watcher_runs_on_write() {
        let target = WatchTarget::new();
        target.data().set("count", 0);

        let calls = Arc::new(AtomicI32::new(0));
        Watcher::new(
            &target,
            "count".into(),
            counting(&calls),
            &LegacyWatchOptions::new().sync(true),
        );

        target.data().set("count", 1);
        target.data().set("count", 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unchanged_primitive_does_not_fire() {
        let target = WatchTarget::new();
        target.data().set("count", 0);

        let calls = Arc::new(AtomicI32::new(0));
        let watcher = Watcher::new(
            &target,
            "count".into(),
            counting(&calls),
            &LegacyWatchOptions::new(),
        );

        watcher.run();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        watcher.mark_immediate_async();
        watcher.run();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn teardown_detaches_watcher() {
        let target = WatchTarget::new();
        target.data().set("count", 0);

        let calls = Arc::new(AtomicI32::new(0));
        let watcher = Watcher::new(
            &target,
            "count".into(),
            counting(&calls),
            &LegacyWatchOptions::new().sync(true),
        );

        watcher.teardown();
        assert!(!watcher.is_active());
        assert_eq!(target.watcher_count(), 0);

        target.data().set("count", 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
