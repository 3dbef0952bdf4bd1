//! Lattice Watch
//!
//! This crate provides the watcher runtime for the Lattice reactive UI
//! framework. It implements:
//!
//! - Reactive state (refs, reactive objects and lists) with automatic
//!   dependency tracking
//! - Watch effects and source watchers with `pre`, `post` and `sync` flush
//!   timing
//! - A tick scheduler with de-duplicating pre, render and post queues
//! - An options-style legacy watcher API with named watchers
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Reactive state, effects, and dependency tracking
//! - `scheduler`: Job queues drained by `flush_jobs`
//! - `watch`: `watch`, `watch_effect` and friends
//! - `legacy`: Path-based watchers created on a `WatchTarget`
//! - `component`: Component instances that own watchers
//! - `config`, `error`: Runtime configuration and error reporting
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_watch::prelude::*;
//!
//! // Create some state
//! let count = Ref::new(0);
//!
//! // Watch it
//! let handle = watch(
//!     count.clone(),
//!     |new, old, _| println!("Count: {old} -> {new}"),
//!     WatchOptions::new(),
//!     None,
//! );
//!
//! // Update the state and end the tick
//! count.set(5);
//! flush_jobs();
//! // Callback runs once, prints: "Count: 0 -> 5"
//!
//! handle.stop();
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod legacy;
pub mod reactive;
pub mod scheduler;
pub mod watch;

pub use component::ComponentInstance;
pub use error::{ErrorContext, WatchError};
pub use reactive::{Reactive, ReactiveList, ReactiveObject, Ref, Value};
pub use watch::{
    watch, watch_effect, watch_post_effect, watch_sync_effect, FlushTiming, OnCleanup,
    WatchEffectOptions, WatchHandle, WatchOptions, WatchSource,
};

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::component::ComponentInstance;
    pub use crate::reactive::{untrack, Reactive, ReactiveList, ReactiveObject, Ref, Value};
    pub use crate::scheduler::flush_jobs;
    pub use crate::watch::{
        watch, watch_effect, watch_post_effect, watch_sync_effect, FlushTiming, OnCleanup,
        WatchEffectOptions, WatchHandle, WatchOptions, WatchSource,
    };
}
