//! Legacy watch options and handlers.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::reactive::Value;

use super::target::WatchTarget;

/// A legacy watch callback: `(target, new value, old value)`.
pub type LegacyCallback = Arc<dyn Fn(&WatchTarget, &Value, &Value) + Send + Sync>;

/// When a `once` watcher tears itself down.
#[derive(Clone)]
pub enum Once {
    /// After the first firing.
    Always,
    /// After the first firing for which the predicate, given the new and
    /// old values, returns true.
    When(Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>),
}

impl Once {
    /// Tear down after the first firing for which `predicate` holds.
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self::When(Arc::new(predicate))
    }

    pub(crate) fn is_last(&self, new_value: &Value, old_value: &Value) -> bool {
        match self {
            Self::Always => true,
            Self::When(predicate) => predicate(new_value, old_value),
        }
    }
}

impl fmt::Debug for Once {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Options for [`watch`](super::watch).
///
/// ```rust,ignore
/// let options = LegacyWatchOptions::from_json(r#"{ "deep": true, "name": "total", "once": true }"#)?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegacyWatchOptions {
    /// Track every property reachable from the value.
    pub deep: bool,
    /// Run on the write that changed the value instead of queueing.
    pub sync: bool,
    /// Call the handler right away with the current value.
    pub immediate: bool,
    /// Queue a first run that fires even if nothing changed.
    pub immediate_async: bool,
    /// Isolate panics in the handler.
    pub user: bool,
    /// Register the watcher under this name on the target.
    pub name: Option<String>,
    /// Tear the watcher down after a firing.
    #[serde(deserialize_with = "deserialize_once")]
    pub once: Option<Once>,
}

fn deserialize_once<'de, D>(deserializer: D) -> Result<Option<Once>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(bool::deserialize(deserializer)?.then_some(Once::Always))
}

impl LegacyWatchOptions {
    /// Default options: lazy, shallow, queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track nested state of the watched value.
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Run on every change instead of queueing.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Call the handler once on creation.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Fire the first queued run even if the value is unchanged.
    pub fn immediate_async(mut self, immediate_async: bool) -> Self {
        self.immediate_async = immediate_async;
        self
    }

    /// Register the watcher under `name`, replacing any previous one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tear the watcher down after a firing.
    pub fn once(mut self, once: Once) -> Self {
        self.once = Some(once);
        self
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What to call when a legacy watcher fires.
#[derive(Clone)]
pub enum Handler {
    /// A callback.
    Func(LegacyCallback),
    /// A handler bundled with its own options, which replace the options
    /// passed alongside it.
    Object {
        handler: Box<Handler>,
        options: LegacyWatchOptions,
    },
    /// The name of a method on the target. A missing method is a no-op.
    Method(String),
}

impl Handler {
    /// Wrap a closure as a handler.
    pub fn func<F>(callback: F) -> Self
    where
        F: Fn(&WatchTarget, &Value, &Value) + Send + Sync + 'static,
    {
        Self::Func(Arc::new(callback))
    }

    /// Attach options to a handler.
    pub fn with_options(handler: impl Into<Handler>, options: LegacyWatchOptions) -> Self {
        Self::Object {
            handler: Box::new(handler.into()),
            options,
        }
    }

    /// Turn the handler into a callback plus the options in effect.
    pub(crate) fn resolve(
        self,
        target: &WatchTarget,
        options: LegacyWatchOptions,
    ) -> (LegacyCallback, LegacyWatchOptions) {
        match self {
            Self::Func(callback) => (callback, options),
            Self::Object { handler, options } => handler.resolve(target, options),
            Self::Method(name) => match target.method(&name) {
                Some(callback) => (callback, options),
                None => {
                    tracing::debug!(method = %name, "watch handler method not found");
                    (Arc::new(|_: &WatchTarget, _: &Value, _: &Value| {}), options)
                }
            },
        }
    }
}

impl From<LegacyCallback> for Handler {
    fn from(callback: LegacyCallback) -> Self {
        Self::Func(callback)
    }
}

impl From<&str> for Handler {
    fn from(method: &str) -> Self {
        Self::Method(method.to_string())
    }
}

impl From<String> for Handler {
    fn from(method: String) -> Self {
        Self::Method(method)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Func(_) => f.write_str("Func(..)"),
            Self::Object { handler, options } => f
                .debug_struct("Object")
                .field("handler", handler)
                .field("options", options)
                .finish(),
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}
