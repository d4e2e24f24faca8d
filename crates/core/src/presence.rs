//! Presence evaluation.
//!
//! Decides whether a record value is "meaningfully present" for display. The rules are total
//! over any JSON value and never fail:
//!
//! - `null` and blank strings are absent
//! - `false` is absent (an unchecked checkbox, not a negative finding)
//! - arrays are present when non-empty
//! - objects are present when at least one direct value is present
//! - numbers are always present; zero is only absent for fields that declare
//!   `zero_means_absent`, see [`is_field_present`]

use crate::registry::FieldDescriptor;
use serde_json::Value;

/// Returns `true` if `value` is meaningfully present.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => map.values().any(is_present),
    }
}

/// Returns `true` if `value` is present under the rules declared by `descriptor`.
///
/// This applies [`is_present`] and additionally treats a numeric zero as absent when the
/// descriptor sets `zero_means_absent`.
pub fn is_field_present(value: &Value, descriptor: &FieldDescriptor) -> bool {
    if descriptor.zero_means_absent() && is_zero(value) {
        return false;
    }
    is_present(value)
}

fn is_zero(value: &Value) -> bool {
    value.as_f64().is_some_and(|n| n == 0.0)
}
