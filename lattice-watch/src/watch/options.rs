//! Watch Options
//!
//! Options load from JSON the same way they are written in component
//! definitions: `{ "immediate": true, "deep": true, "flush": "post" }`.

use serde::{Deserialize, Serialize};

/// When a watcher's job runs relative to the render flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushTiming {
    /// Before the render queue (the default).
    #[default]
    Pre,
    /// After the render queue.
    Post,
    /// Synchronously, on every change.
    Sync,
}

/// Options for [`watch`](super::watch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Fire the callback once right away.
    pub immediate: bool,
    /// Track every nested property of the source and fire on any change.
    pub deep: bool,
    pub flush: FlushTiming,
}

impl WatchOptions {
    /// Default options: lazy, shallow, pre flush.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the callback once on registration.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Track nested state of the source.
    pub fn deep(mut self, deep: bool) -> Self {
        self.deep = deep;
        self
    }

    /// Set when the job runs.
    pub fn flush(mut self, flush: FlushTiming) -> Self {
        self.flush = flush;
        self
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Options for [`watch_effect`](super::watch_effect).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchEffectOptions {
    pub flush: FlushTiming,
}

impl WatchEffectOptions {
    /// Default options: pre flush.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set when the job runs.
    pub fn flush(mut self, flush: FlushTiming) -> Self {
        self.flush = flush;
        self
    }

    /// Parse options from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<WatchEffectOptions> for WatchOptions {
    fn from(options: WatchEffectOptions) -> Self {
        Self {
            flush: options.flush,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_flush_pre() {
        let options = WatchOptions::default();
        assert!(!options.immediate);
        assert!(!options.deep);
        assert_eq!(options.flush, FlushTiming::Pre);
    }

    #[test]
    fn parses_json() {
        let options = WatchOptions::from_json(r#"{ "deep": true, "flush": "post" }"#).unwrap();
        assert_eq!(
            options,
            WatchOptions::new().deep(true).flush(FlushTiming::Post)
        );

        let options = WatchEffectOptions::from_json(r#"{ "flush": "sync" }"#).unwrap();
        assert_eq!(options.flush, FlushTiming::Sync);
    }

    #[test]
    fn rejects_unknown_flush() {
        assert!(WatchOptions::from_json(r#"{ "flush": "later" }"#).is_err());
    }
}
