//! Deep Traversal
//!
//! Reading an object handle only tracks the handle. A deep watcher needs to
//! hear about writes anywhere inside the object, so it reads every reachable
//! property while its effect is running. Each object is visited once, which
//! makes cyclic structures safe.

use std::collections::HashSet;

use crate::reactive::Value;

/// Read every property reachable from `value` so the running effect tracks
/// all of them. Returns the value unchanged.
pub fn traverse(value: &Value) -> Value {
    let mut seen = HashSet::new();
    visit(value, &mut seen);
    value.clone()
}

fn visit(value: &Value, seen: &mut HashSet<usize>) {
    let Some(id) = value.identity() else {
        return;
    };
    if !seen.insert(id) {
        return;
    }

    match value {
        Value::Ref(r) => visit(&r.get(), seen),
        Value::Array(items) => {
            for item in items.iter() {
                visit(item, seen);
            }
        }
        Value::List(list) => {
            for item in list.values() {
                visit(&item, seen);
            }
        }
        Value::Object(object) => {
            for (_, item) in object.entries() {
                visit(&item, seen);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{ReactiveEffect, ReactiveList, ReactiveObject, Ref};
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    fn deep_effect(value: Value) -> (ReactiveEffect, Arc<AtomicI32>) {
        let runs = Arc::new(AtomicI32::new(0));
        let effect = {
            let runs = runs.clone();
            ReactiveEffect::new(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                traverse(&value)
            })
        };
        effect.run();
        (effect, runs)
    }

    #[test]
    fn tracks_nested_properties() {
        let inner = ReactiveObject::from_entries([("leaf", 1)]);
        let list: ReactiveList = [Value::from(inner.clone())].into_iter().collect();
        let outer = ReactiveObject::new();
        outer.set("items", list.clone());

        let (_effect, runs) = deep_effect(outer.clone().into());

        inner.set("leaf", 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        list.push(3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        outer.set("extra", true);
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn unwraps_refs() {
        let inner = ReactiveObject::from_entries([("x", 1)]);
        let boxed = Ref::new(inner.clone());
        let (_effect, runs) = deep_effect(boxed.clone().into());

        inner.set("x", 5);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        boxed.set(0);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn survives_cycles() {
        let a = ReactiveObject::new();
        let b = ReactiveObject::new();
        a.set("b", b.clone());
        b.set("a", a.clone());

        let (effect, runs) = deep_effect(a.clone().into());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        // a: iteration + "b"; b: iteration + "a".
        assert_eq!(effect.dependency_count(), 4);

        b.set("n", 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn returns_the_same_value() {
        let object = ReactiveObject::new();
        let value = Value::from(object);
        assert!(traverse(&value).same_value(&value));
        assert_eq!(traverse(&Value::from(3)), Value::from(3));
    }
}
