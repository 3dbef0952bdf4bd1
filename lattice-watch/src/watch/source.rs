//! Watch Sources
//!
//! A watch can observe a ref, a whole reactive collection, a getter closure,
//! or an ordered list of those. Whatever the shape, registration turns it
//! into a single getter so the job never has to inspect the source again.

use std::fmt;
use std::sync::Arc;

use crate::component::WeakInstance;
use crate::error::{self, call_with_error_handling, ErrorContext, WatchError};
use crate::reactive::{Reactive, ReactiveList, ReactiveObject, Ref, Value};

use super::cleanup::{CleanupSlot, OnCleanup};
use super::traverse::traverse;

/// A getter closure used as a watch source.
pub type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// The body of a bare effect.
pub(crate) type EffectFn = Arc<dyn Fn(&OnCleanup) + Send + Sync>;

/// Getter produced by normalization.
pub(crate) type NormalizedGetter = Box<dyn Fn() -> Value + Send + Sync>;

/// What a watch observes.
#[derive(Clone)]
pub enum WatchSource {
    /// The ref's value.
    Ref(Ref),
    /// A reactive collection, watched deeply.
    Reactive(Reactive),
    /// The result of a getter.
    Getter(Getter),
    /// Several sources, compared position by position.
    Multi(Vec<WatchSource>),
    /// Anything else. Watching it warns and never fires.
    Invalid(Value),
}

impl WatchSource {
    /// A getter source.
    pub fn getter<F>(getter: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Getter(Arc::new(getter))
    }

    /// A multi-source built from anything convertible to a source.
    pub fn multi<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<WatchSource>,
    {
        Self::Multi(sources.into_iter().map(Into::into).collect())
    }

    fn describe(&self) -> String {
        match self {
            Self::Ref(_) => "ref".to_string(),
            Self::Reactive(_) => "reactive".to_string(),
            Self::Getter(_) => "getter".to_string(),
            Self::Multi(items) => format!("array of {} sources", items.len()),
            Self::Invalid(value) => format!("{value:?}"),
        }
    }
}

impl fmt::Debug for WatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ref(r) => f.debug_tuple("Ref").field(r).finish(),
            Self::Reactive(t) => f.debug_tuple("Reactive").field(t).finish(),
            Self::Getter(_) => f.write_str("Getter(..)"),
            Self::Multi(items) => f.debug_tuple("Multi").field(items).finish(),
            Self::Invalid(value) => f.debug_tuple("Invalid").field(value).finish(),
        }
    }
}

impl From<Ref> for WatchSource {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl From<Reactive> for WatchSource {
    fn from(target: Reactive) -> Self {
        Self::Reactive(target)
    }
}

impl From<ReactiveObject> for WatchSource {
    fn from(object: ReactiveObject) -> Self {
        Self::Reactive(Reactive::Object(object))
    }
}

impl From<ReactiveList> for WatchSource {
    fn from(list: ReactiveList) -> Self {
        Self::Reactive(Reactive::List(list))
    }
}

impl From<Vec<WatchSource>> for WatchSource {
    fn from(sources: Vec<WatchSource>) -> Self {
        Self::Multi(sources)
    }
}

/// Classify a dynamic value: refs and reactive collections are watchable,
/// plain arrays become multi-sources, everything else is invalid.
impl From<Value> for WatchSource {
    fn from(value: Value) -> Self {
        match value {
            Value::Ref(r) => Self::Ref(r),
            Value::Object(object) => object.into(),
            Value::List(list) => list.into(),
            Value::Array(items) => Self::Multi(items.iter().cloned().map(Into::into).collect()),
            other => Self::Invalid(other),
        }
    }
}

/// A source after classification, including the bare-effect form.
pub(crate) enum Source {
    Watch(WatchSource),
    Effect(EffectFn),
}

/// The single getter a source normalizes to.
pub(crate) struct Normalized {
    pub getter: NormalizedGetter,
    pub deep: bool,
    pub is_multi: bool,
}

/// Turn a source into a getter.
///
/// `deep` is forced on for reactive collections. When a callback is present
/// and the watch is deep, the getter traverses its result so every nested
/// property is tracked.
pub(crate) fn normalize(
    source: Source,
    has_callback: bool,
    deep: bool,
    cleanup: &CleanupSlot,
    instance: Option<WeakInstance>,
) -> Normalized {
    let mut deep = deep;
    let mut is_multi = false;

    let getter: NormalizedGetter = match source {
        Source::Watch(WatchSource::Ref(r)) => Box::new(move || r.get()),
        Source::Watch(WatchSource::Reactive(target)) => {
            deep = true;
            let value = target.to_value();
            Box::new(move || value.clone())
        }
        Source::Watch(WatchSource::Multi(sources)) => {
            is_multi = true;
            let slots: Vec<NormalizedGetter> = sources.into_iter().map(slot_getter).collect();
            Box::new(move || Value::array(slots.iter().map(|slot| slot()).collect()))
        }
        Source::Watch(WatchSource::Getter(getter)) => Box::new(move || call_getter(&getter)),
        Source::Watch(invalid @ WatchSource::Invalid(_)) => {
            error::warn(WatchError::InvalidSource(invalid.describe()));
            Box::new(|| Value::Undefined)
        }
        Source::Effect(body) => {
            let cleanup = cleanup.clone();
            let on_cleanup = cleanup.registrar();
            Box::new(move || {
                let destroyed = instance
                    .as_ref()
                    .map(|weak| weak.upgrade().map_or(true, |i| i.is_destroyed()))
                    .unwrap_or(false);
                if destroyed {
                    return Value::Undefined;
                }
                cleanup.run();
                call_with_error_handling(ErrorContext::WatchCallback, || body(&on_cleanup));
                Value::Undefined
            })
        }
    };

    let getter = if has_callback && deep {
        Box::new(move || traverse(&getter())) as NormalizedGetter
    } else {
        getter
    };

    Normalized {
        getter,
        deep,
        is_multi,
    }
}

fn slot_getter(source: WatchSource) -> NormalizedGetter {
    match source {
        WatchSource::Ref(r) => Box::new(move || r.get()),
        WatchSource::Reactive(target) => {
            let value = target.to_value();
            Box::new(move || traverse(&value))
        }
        WatchSource::Getter(getter) => Box::new(move || call_getter(&getter)),
        other => {
            error::warn(WatchError::InvalidSource(other.describe()));
            Box::new(|| Value::Undefined)
        }
    }
}

fn call_getter(getter: &Getter) -> Value {
    call_with_error_handling(ErrorContext::WatchGetter, || getter()).unwrap_or_default()
}
