//! Attribute change detection.

use serde_json::Value;

/// Decide whether replacing `old` with `new` is a real change.
///
/// Presence flips, differing value kinds, and deep inequality all count.
/// Numbers with different integer/float representations are flagged even
/// when they compare equal numerically.
pub fn is_change(old: Option<&Value>, new: Option<&Value>) -> bool {
    match (old, new) {
        (None, None) => false,
        (None, Some(_)) | (Some(_), None) => true,
        (Some(old), Some(new)) => !same_kind(old, new) || old != new,
    }
}

fn same_kind(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null)
        | (Value::Bool(_), Value::Bool(_))
        | (Value::String(_), Value::String(_))
        | (Value::Array(_), Value::Array(_))
        | (Value::Object(_), Value::Object(_)) => true,
        (Value::Number(a), Value::Number(b)) => a.is_f64() == b.is_f64(),
        _ => false,
    }
}
