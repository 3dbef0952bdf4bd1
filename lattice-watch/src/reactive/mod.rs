//! Reactive Primitives
//!
//! This module implements the reactive state the watch machinery observes:
//! refs, reactive objects and lists, and the effects that track them.
//!
//! # Concepts
//!
//! ## Refs
//!
//! A `Ref` is a box holding one value. Reading it inside a running effect
//! subscribes that effect; writing a different value notifies it.
//!
//! ## Reactive objects and lists
//!
//! `ReactiveObject` and `ReactiveList` track reads per property or index,
//! so an effect only re-runs when state it actually read changes.
//!
//! ## Effects
//!
//! A `ReactiveEffect` wraps a getter. Each run records which deps the getter
//! read. When one of them changes, the effect's scheduler is invoked (or the
//! effect re-runs when it has none).
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically. When a tracked value is read, we check if
//! there is an active tracking context and, if so, subscribe its effect.

mod context;
mod dep;
mod effect;
mod ids;
mod list;
mod object;
mod refs;
mod scope;
mod value;

pub use context::{untrack, ReactiveContext};
pub use dep::Dep;
pub use effect::{EffectGetter, EffectScheduler, ReactiveEffect, StopHook};
pub use ids::{DepId, EffectId};
pub use list::ReactiveList;
pub use object::ReactiveObject;
pub use refs::Ref;
pub use scope::EffectScope;
pub use value::Value;

/// A reactive collection that can be watched as a whole.
#[derive(Debug, Clone)]
pub enum Reactive {
    Object(ReactiveObject),
    List(ReactiveList),
}

impl Reactive {
    /// The collection as a value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Object(object) => Value::Object(object.clone()),
            Self::List(list) => Value::List(list.clone()),
        }
    }
}

impl From<ReactiveObject> for Reactive {
    fn from(object: ReactiveObject) -> Self {
        Self::Object(object)
    }
}

impl From<ReactiveList> for Reactive {
    fn from(list: ReactiveList) -> Self {
        Self::List(list)
    }
}

/// Whether a value is a ref.
pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// Whether a value is a reactive object or list.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::List(_))
}
