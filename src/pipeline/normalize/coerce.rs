//! Coercion of loosely-typed JSON into lists, objects and text.
//!
//! Upstream exporters send list fields either as arrays or as JSON-encoded
//! strings, and scalar fields as strings, numbers or null. Everything is
//! resolved here so the field normalizers only ever see `&str`.

use serde_json::Value;

/// First present, non-null value among `keys` (canonical name first, then
/// legacy aliases).
pub fn field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

/// Scalar as text. Arrays, objects and null become empty.
pub fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// A list field. Encoded strings are parsed once; a parse failure or a
/// non-list payload yields an empty list.
pub fn list(value: Option<&Value>, field_name: &str) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => Vec::new(),
            Ok(_) => {
                tracing::warn!(field = field_name, "Encoded list field is not an array");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(field = field_name, error = %e, "Failed to parse encoded list field");
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

/// A nested object field, accepting the same string encoding as [`list`].
pub fn object(value: Option<&Value>, field_name: &str) -> Value {
    match value {
        Some(v @ Value::Object(_)) => v.clone(),
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(v @ Value::Object(_)) => v,
            Ok(_) => Value::Null,
            Err(e) => {
                tracing::warn!(field = field_name, error = %e, "Failed to parse encoded object field");
                Value::Null
            }
        },
        _ => Value::Null,
    }
}
