//! Change Detection
//!
//! Whether a watcher's callback fires after its source re-evaluates.

use crate::reactive::Value;

/// Whether `new` counts as a change from `old`.
///
/// Values that are not the same by [`Value::same_value`] have changed.
/// Object-kind values always count as changed: a deep mutation leaves the
/// handle identical, so identity cannot rule a change out.
pub fn should_trigger(new: &Value, old: &Value) -> bool {
    !new.same_value(old) || new.is_object()
}

/// Positional comparison for multi-source watches. A slot missing from
/// `old` compares against `Undefined`.
pub fn any_slot_changed(new: &[Value], old: &[Value]) -> bool {
    new.iter().enumerate().any(|(i, value)| {
        let previous = old.get(i).cloned().unwrap_or_default();
        should_trigger(value, &previous)
    })
}
