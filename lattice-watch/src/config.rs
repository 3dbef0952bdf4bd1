//! Runtime Configuration
//!
//! Configuration is per thread, like the tracking context and the scheduler
//! queues. Each thread runs its own cooperative tick, so each thread gets its
//! own limits and handlers.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::WatchError;

/// Default number of times a single job may run within one flush.
pub const DEFAULT_RECURSION_LIMIT: usize = 100;

/// Callback receiving errors raised by user code or the scheduler.
pub type ErrorHandler = Arc<dyn Fn(&WatchError) + Send + Sync>;

/// Callback receiving warnings (invalid sources, duplicate names).
pub type WarnHandler = Arc<dyn Fn(&WatchError) + Send + Sync>;

/// Runtime configuration for the current thread.
#[derive(Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// How many times one job may run within a single `flush_jobs` call
    /// before it is reported and skipped.
    pub recursion_limit: usize,

    /// Receives user-code and scheduler errors. When unset they are logged.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,

    /// Receives warnings in addition to the log output.
    #[serde(skip)]
    pub warn_handler: Option<WarnHandler>,
}

impl RuntimeConfig {
    /// Parse a configuration from JSON. Handlers cannot be expressed in JSON
    /// and are left unset.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            error_handler: None,
            warn_handler: None,
        }
    }
}

impl fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("recursion_limit", &self.recursion_limit)
            .field("error_handler", &self.error_handler.is_some())
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

thread_local! {
    static CONFIG: RefCell<RuntimeConfig> = RefCell::new(RuntimeConfig::default());
}

/// Modify the configuration of the current thread.
pub fn configure(f: impl FnOnce(&mut RuntimeConfig)) {
    CONFIG.with(|config| f(&mut config.borrow_mut()));
}

/// Replace the configuration of the current thread.
pub fn set(config: RuntimeConfig) {
    CONFIG.with(|current| *current.borrow_mut() = config);
}

/// Restore the default configuration for the current thread.
pub fn reset() {
    set(RuntimeConfig::default());
}

/// A copy of the current thread's configuration.
pub fn current() -> RuntimeConfig {
    CONFIG.with(|config| config.borrow().clone())
}

pub(crate) fn recursion_limit() -> usize {
    CONFIG.with(|config| config.borrow().recursion_limit)
}

pub(crate) fn error_handler() -> Option<ErrorHandler> {
    CONFIG.with(|config| config.borrow().error_handler.clone())
}

pub(crate) fn warn_handler() -> Option<WarnHandler> {
    CONFIG.with(|config| config.borrow().warn_handler.clone())
}
