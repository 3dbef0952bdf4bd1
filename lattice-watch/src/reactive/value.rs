//! Dynamic Values
//!
//! Watch sources produce values of many shapes: numbers from a ref, whole
//! reactive objects, tuples of several sources. `Value` is the tagged union
//! the watch machinery passes around.
//!
//! # Identity
//!
//! Primitive variants compare by value. Object-kind variants (`Array`,
//! `Object`, `List`, `Ref`) compare by identity: two handles are the same
//! value only if they share the same allocation. This mirrors how a mutated
//! object is still "the same" object, which is why watchers treat every
//! object as potentially changed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::context::untrack;
use super::list::ReactiveList;
use super::object::ReactiveObject;
use super::refs::Ref;

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Undefined,
    /// An explicit empty value.
    Null,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    /// A plain, non-reactive sequence.
    Array(Arc<Vec<Value>>),
    /// A reactive keyed object.
    Object(ReactiveObject),
    /// A reactive sequence.
    List(ReactiveList),
    /// A reactive box.
    Ref(Ref),
}

impl Value {
    /// Build a plain array value.
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }

    /// "Same value" equality.
    ///
    /// Like `==` for primitives, except that `NaN` equals `NaN` and `0.0`
    /// differs from `-0.0`. Object-kind values are compared by identity.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    a.is_nan() && b.is_nan()
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Whether this is an object-kind value.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            Self::Array(_) | Self::Object(_) | Self::List(_) | Self::Ref(_)
        )
    }

    /// Identity key of an object-kind value, `None` for primitives.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(Arc::as_ptr(items) as *const () as usize),
            Self::Object(object) => Some(object.identity()),
            Self::List(list) => Some(list.identity()),
            Self::Ref(r) => Some(r.identity()),
            _ => None,
        }
    }

    /// Truthiness: `Undefined`, `Null`, `false`, `0`, `NaN` and the empty
    /// string are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Items of a plain array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ReactiveObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ReactiveList> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_reactive_ref(&self) -> Option<&Ref> {
        match self {
            Self::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// An untracked JSON snapshot of the value.
    ///
    /// Integral numbers become JSON integers, non-finite numbers become
    /// `null`, refs are unwrapped, and cycles are cut with `"[Circular]"`.
    pub fn to_json(&self) -> serde_json::Value {
        untrack(|| {
            let mut path = HashSet::new();
            snapshot(self, &mut path)
        })
    }
}

fn snapshot(value: &Value, path: &mut HashSet<usize>) -> serde_json::Value {
    use serde_json::Value as Json;

    if let Some(id) = value.identity() {
        if !path.insert(id) {
            return Json::String("[Circular]".to_string());
        }
    }

    let json = match value {
        Value::Undefined | Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => number_to_json(*n),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Array(items) => Json::Array(items.iter().map(|v| snapshot(v, path)).collect()),
        Value::List(list) => Json::Array(
            list.values_untracked()
                .iter()
                .map(|v| snapshot(v, path))
                .collect(),
        ),
        Value::Object(object) => Json::Object(
            object
                .entries_untracked()
                .into_iter()
                .map(|(k, v)| (k.to_string(), snapshot(&v, path)))
                .collect(),
        ),
        Value::Ref(r) => snapshot(&r.get_untracked(), path),
    };

    if let Some(id) = value.identity() {
        path.remove(&id);
    }
    json
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Equality is [`Value::same_value`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Object(object) => fmt::Debug::fmt(object, f),
            Self::List(list) => fmt::Debug::fmt(list, f),
            Self::Ref(r) => fmt::Debug::fmt(r, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Str(s) => f.write_str(s),
            _ => write!(f, "{}", self.to_json()),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Self::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::array(items)
    }
}

impl From<ReactiveObject> for Value {
    fn from(object: ReactiveObject) -> Self {
        Self::Object(object)
    }
}

impl From<ReactiveList> for Value {
    fn from(list: ReactiveList) -> Self {
        Self::List(list)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
