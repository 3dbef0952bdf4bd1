//! Legacy Watchers
//!
//! An options-style watch API on top of the same reactive state: watchers are
//! created on a [`WatchTarget`], observe a dot path or a getter over that
//! target, and may be registered under a name.
//!
//! # Options
//!
//! - `deep`, `sync`: traverse the value, and run on the write instead of
//!   queueing.
//! - `immediate`: call the handler right away with the current value and an
//!   `Undefined` old value, with tracking paused.
//! - `immediate_async`: queue the first call instead; it fires at the next
//!   flush even if nothing changed.
//! - `once`: the firing for which the predicate holds is the last one. The
//!   watcher is torn down, then the handler still runs for that firing.
//! - `name`: register the watcher on the target. Reusing a name reports a
//!   warning and replaces the registry entry, but the previous watcher keeps
//!   running until it is torn down some other way.
//!
//! # Example
//!
//! ```rust,ignore
//! let target = WatchTarget::new();
//! target.data().set("count", 0);
//!
//! let unwatch = watch(
//!     &target,
//!     "count",
//!     Handler::func(|_, new, old| println!("{old} -> {new}")),
//!     LegacyWatchOptions::new(),
//! );
//!
//! target.data().set("count", 1);
//! flush_jobs();  // prints "0 -> 1"
//! unwatch.unwatch();
//! ```

mod expression;
mod options;
mod target;
mod watcher;

use std::sync::{Arc, OnceLock, Weak};

use crate::error::{call_with_error_handling, ErrorContext};
use crate::reactive::{untrack, Value};

pub use expression::{parse_path, Expression, TargetGetter};
pub use options::{Handler, LegacyCallback, LegacyWatchOptions, Once};
pub use target::WatchTarget;
pub use watcher::{queue_watcher, Watcher};

/// Tears down the watcher returned by [`watch`].
#[derive(Debug, Clone)]
pub struct Unwatch {
    watcher: Arc<Watcher>,
}

impl Unwatch {
    /// Tear the watcher down.
    pub fn unwatch(&self) {
        self.watcher.teardown();
    }

    /// The underlying watcher.
    pub fn watcher(&self) -> &Arc<Watcher> {
        &self.watcher
    }
}

/// Watch `expression` on `target` and call `handler` when it changes.
///
/// The handler's panics are always isolated.
pub fn watch(
    target: &WatchTarget,
    expression: impl Into<Expression>,
    handler: impl Into<Handler>,
    options: LegacyWatchOptions,
) -> Unwatch {
    let (callback, mut options) = handler.into().resolve(target, options);
    options.user = true;

    let this: Arc<OnceLock<Weak<Watcher>>> = Arc::new(OnceLock::new());
    let callback = match options.once.clone() {
        Some(once) => {
            let this = this.clone();
            Arc::new(move |target: &WatchTarget, new_value: &Value, old_value: &Value| {
                if once.is_last(new_value, old_value) {
                    if let Some(watcher) = this.get().and_then(Weak::upgrade) {
                        watcher.teardown();
                    }
                }
                callback(target, new_value, old_value);
            }) as LegacyCallback
        }
        None => callback,
    };

    let watcher = Watcher::new(target, expression.into(), callback.clone(), &options);
    let registered = this.set(Arc::downgrade(&watcher));
    debug_assert!(registered.is_ok());

    if let Some(name) = &options.name {
        target.register_named(name, watcher.clone());
    }

    if options.immediate {
        let value = watcher.value();
        untrack(|| {
            call_with_error_handling(ErrorContext::ImmediateCallback, || {
                callback(target, &value, &Value::Undefined)
            })
        });
    } else if options.immediate_async {
        watcher.mark_immediate_async();
        queue_watcher(&watcher);
    }

    Unwatch { watcher }
}
