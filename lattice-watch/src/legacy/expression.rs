//! Watch Expressions
//!
//! A legacy watcher observes either a dot path into the target's data
//! (`"user.address.city"`, `"items.0"`) or a getter closure over the target.

use std::fmt;
use std::sync::Arc;

use crate::error::{self, WatchError};
use crate::reactive::Value;

use super::target::WatchTarget;

/// A getter over a watch target.
pub type TargetGetter = Arc<dyn Fn(&WatchTarget) -> Value + Send + Sync>;

/// What a legacy watcher observes.
#[derive(Clone)]
pub enum Expression {
    /// A dot path into the target's data.
    Path(String),
    /// A closure evaluated against the target.
    Getter(TargetGetter),
}

impl Expression {
    pub fn getter<F>(getter: F) -> Self
    where
        F: Fn(&WatchTarget) -> Value + Send + Sync + 'static,
    {
        Self::Getter(Arc::new(getter))
    }

    /// Compile into a getter. An invalid path is reported as a warning and
    /// compiles to a getter that always yields `Undefined`.
    pub(crate) fn compile(self) -> TargetGetter {
        match self {
            Self::Getter(getter) => getter,
            Self::Path(path) => match parse_path(&path) {
                Ok(segments) => Arc::new(move |target: &WatchTarget| resolve(target, &segments)),
                Err(err) => {
                    error::warn(err);
                    Arc::new(|_: &WatchTarget| Value::Undefined)
                }
            },
        }
    }
}

/// Split a dot path into its segments.
///
/// Only word characters, `.` and `$` are accepted.
pub fn parse_path(path: &str) -> Result<Vec<Arc<str>>, WatchError> {
    let valid = path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '.' || c == '$');
    if !valid {
        return Err(WatchError::InvalidPath(path.to_string()));
    }
    Ok(path.split('.').map(Arc::from).collect())
}

fn resolve(target: &WatchTarget, segments: &[Arc<str>]) -> Value {
    let mut current = Value::Object(target.data().clone());
    for segment in segments {
        current = match unwrap_ref(current) {
            Value::Object(object) => object.get(segment),
            Value::List(list) => match segment.parse::<usize>() {
                Ok(index) if index < list.len() => list.get(index),
                _ => return Value::Undefined,
            },
            Value::Array(items) => match segment.parse::<usize>() {
                Ok(index) => items.get(index).cloned().unwrap_or_default(),
                Err(_) => return Value::Undefined,
            },
            _ => return Value::Undefined,
        };
    }
    unwrap_ref(current)
}

fn unwrap_ref(value: Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        other => other,
    }
}

impl From<&str> for Expression {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for Expression {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<TargetGetter> for Expression {
    fn from(getter: TargetGetter) -> Self {
        Self::Getter(getter)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Getter(_) => f.write_str("<getter>"),
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Getter(_) => f.write_str("Getter(..)"),
        }
    }
}
