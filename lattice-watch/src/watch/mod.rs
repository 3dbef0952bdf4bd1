//! Watch API
//!
//! Watchers run user code in response to changes in reactive state.
//!
//! # Two kinds of watchers
//!
//! ## Effects
//!
//! [`watch_effect`] runs a closure right away and again whenever anything it
//! read changes. There is no old value and no change check: the closure is
//! the whole watcher.
//!
//! ## Source watchers
//!
//! [`watch`] evaluates a [`WatchSource`] and calls the callback with the new
//! and previous values when the source changes. Primitive results only count
//! as changed when they differ under "same value" equality; object results
//! always count, since the object may have been mutated in place.
//!
//! # Flush timing
//!
//! | timing | runs                                                         |
//! |--------|--------------------------------------------------------------|
//! | `pre`  | at the next [`flush_jobs`](crate::scheduler::flush_jobs), before render jobs |
//! | `post` | at the next flush, after render jobs                         |
//! | `sync` | inside the write that changed the source                     |
//!
//! A `pre` watcher owned by an instance that has not mounted yet runs
//! synchronously, since there is no render to wait for.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_watch::prelude::*;
//!
//! let count = Ref::new(0);
//! let handle = watch(
//!     count.clone(),
//!     |new, old, _| println!("{old} -> {new}"),
//!     WatchOptions::new(),
//!     None,
//! );
//!
//! count.set(1);
//! flush_jobs();  // prints "0 -> 1"
//! handle.stop();
//! ```

mod cleanup;
mod engine;
mod equality;
mod options;
mod source;
mod traverse;

use std::sync::Arc;

use crate::component::ComponentInstance;
use crate::reactive::Value;

pub use self::cleanup::OnCleanup;
pub use self::engine::WatchHandle;
pub use self::equality::{any_slot_changed, should_trigger};
pub use self::options::{FlushTiming, WatchEffectOptions, WatchOptions};
pub use self::source::{Getter, WatchSource};
pub use self::traverse::traverse;

use self::engine::do_watch;
use self::source::Source;

/// A watch callback: `(new value, old value, cleanup registrar)`.
pub type WatchCallback = Arc<dyn Fn(&Value, &Value, &OnCleanup) + Send + Sync>;

/// Run `effect` now and re-run it whenever the state it reads changes.
///
/// The closure receives an [`OnCleanup`] it can use to register a hook that
/// runs before the next re-run, or when the watcher stops.
pub fn watch_effect<F>(
    effect: F,
    options: WatchEffectOptions,
    instance: Option<&ComponentInstance>,
) -> WatchHandle
where
    F: Fn(&OnCleanup) + Send + Sync + 'static,
{
    do_watch(Source::Effect(Arc::new(effect)), None, options.into(), instance)
}

/// [`watch_effect`] with `post` flush timing. The first run is deferred to
/// the next flush as well.
pub fn watch_post_effect<F>(effect: F, instance: Option<&ComponentInstance>) -> WatchHandle
where
    F: Fn(&OnCleanup) + Send + Sync + 'static,
{
    watch_effect(
        effect,
        WatchEffectOptions::new().flush(FlushTiming::Post),
        instance,
    )
}

/// [`watch_effect`] with `sync` flush timing.
pub fn watch_sync_effect<F>(effect: F, instance: Option<&ComponentInstance>) -> WatchHandle
where
    F: Fn(&OnCleanup) + Send + Sync + 'static,
{
    watch_effect(
        effect,
        WatchEffectOptions::new().flush(FlushTiming::Sync),
        instance,
    )
}

/// Call `callback` whenever `source` changes.
///
/// For a multi-source watch the values are arrays with one slot per source.
/// Before the first firing the old value is `Undefined` (or an empty array
/// for a multi-source watch), which only an `immediate` watch observes.
pub fn watch<S, F>(
    source: S,
    callback: F,
    options: WatchOptions,
    instance: Option<&ComponentInstance>,
) -> WatchHandle
where
    S: Into<WatchSource>,
    F: Fn(&Value, &Value, &OnCleanup) + Send + Sync + 'static,
{
    do_watch(
        Source::Watch(source.into()),
        Some(Arc::new(callback)),
        options,
        instance,
    )
}
