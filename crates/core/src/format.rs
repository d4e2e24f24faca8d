//! Value formatting by declared field type.
//!
//! A field's declared [`FieldKind`] fully determines how its value is turned into display
//! text. When the runtime value does not match the declared kind the formatter falls back to
//! [`stringify`]; it never fails.

use crate::constants::{BOOLEAN_FALSE_LABEL, BOOLEAN_TRUE_LABEL, LIST_DELIMITER};
use crate::presence::is_present;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Declared value kind of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Array,
    Enum,
}

impl FieldKind {
    /// Returns `true` if `value` has the runtime shape this kind expects.
    ///
    /// `null` is accepted by every kind: absence is not a type mismatch.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldKind::String | FieldKind::Date | FieldKind::Enum, Value::String(_)) => true,
            (FieldKind::Number, Value::Number(_)) => true,
            (FieldKind::Boolean, Value::Bool(_)) => true,
            (FieldKind::Array, Value::Array(_)) => true,
            _ => false,
        }
    }

    /// Infers a kind from a runtime value, for record content that has no descriptor.
    pub fn infer(value: &Value) -> FieldKind {
        match value {
            Value::Bool(_) => FieldKind::Boolean,
            Value::Number(_) => FieldKind::Number,
            Value::Array(_) => FieldKind::Array,
            Value::Null | Value::String(_) | Value::Object(_) => FieldKind::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Array => "array",
            FieldKind::Enum => "enum",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats `value` as display text according to its declared `kind`.
///
/// - boolean: `"Oui"` for `true` (callers filter `false` through presence first)
/// - number: canonical decimal string, no locale formatting
/// - string, date, enum: the value as-is
/// - array: items joined with `", "` for single-line slots
///
/// Any other combination is formatted with [`stringify`].
pub fn format_value(value: &Value, kind: FieldKind) -> String {
    match (kind, value) {
        (FieldKind::Boolean, Value::Bool(b)) => format_bool(*b),
        (FieldKind::Number, Value::Number(n)) => format_number(n),
        (FieldKind::String | FieldKind::Date | FieldKind::Enum, Value::String(s)) => s.clone(),
        (FieldKind::Array, Value::Array(items)) => join_items(items),
        _ => stringify(value),
    }
}

/// Formats each entry of an array value, for adapters that render one badge per entry.
///
/// A non-array value yields a single item.
pub fn format_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(stringify).collect(),
        Value::Null => Vec::new(),
        other => vec![stringify(other)],
    }
}

/// Generic stringification used whenever no declared kind applies.
///
/// Nested arrays are joined with `", "`, objects render as `key: value` pairs of their
/// present children only.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => format_bool(*b),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => join_items(items),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| is_present(v))
            .map(|(key, v)| format!("{key}: {}", stringify(v)))
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER),
    }
}

fn format_bool(b: bool) -> String {
    if b {
        BOOLEAN_TRUE_LABEL.to_string()
    } else {
        BOOLEAN_FALSE_LABEL.to_string()
    }
}

// Integers print without a decimal part; floats use the shortest round-trip form, so
// `2.0` renders as "2" and `1.5` as "1.5".
fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .map(stringify)
        .collect::<Vec<_>>()
        .join(LIST_DELIMITER)
}
