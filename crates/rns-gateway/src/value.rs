//! Helpers for the gateway's "programmatic JSON" encoding of ledger values.
//!
//! Every value is an object with a `kind` tag. Scalars carry a string `value`
//! (`{"kind":"String","value":"ab.xrd"}`), composites carry `fields`
//! (`Tuple`, `Enum`) or `entries` (`Map`). Enum variant ids come back either
//! as strings or numbers depending on the gateway version; both are accepted.

use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;

pub fn string(s: &str) -> Value {
    json!({ "kind": "String", "value": s })
}

pub fn reference(address: &str) -> Value {
    json!({ "kind": "Reference", "value": address })
}

pub fn decimal(d: Decimal) -> Value {
    json!({ "kind": "Decimal", "value": d.to_string() })
}

pub fn tuple(fields: Vec<Value>) -> Value {
    json!({ "kind": "Tuple", "fields": fields })
}

pub fn none() -> Value {
    json!({ "kind": "Enum", "variant_id": "0", "fields": [] })
}

pub fn some(inner: Value) -> Value {
    json!({ "kind": "Enum", "variant_id": "1", "fields": [inner] })
}

/// Attach a `field_name` to a value, as the gateway does for struct fields.
pub fn named(name: &str, mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("field_name".to_owned(), Value::String(name.to_owned()));
    }
    value
}

pub fn kind(value: &Value) -> Option<&str> {
    value.get("kind").and_then(Value::as_str)
}

pub fn fields(value: &Value) -> &[Value] {
    value
        .get("fields")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Find a struct field by its `field_name`.
pub fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    fields(value)
        .iter()
        .find(|f| f.get("field_name").and_then(Value::as_str) == Some(name))
}

/// The string payload of a scalar (`String`, `Reference`, `Own`, `Decimal`, integers, ids).
pub fn scalar(value: &Value) -> Option<&str> {
    value.get("value").and_then(Value::as_str)
}

pub fn as_decimal(value: &Value) -> Option<Decimal> {
    scalar(value).and_then(|s| Decimal::from_str(s).ok())
}

pub fn as_u64(value: &Value) -> Option<u64> {
    match value.get("value")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

pub fn variant_id(value: &Value) -> Option<u64> {
    match value.get("variant_id")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Decode an `Option<T>` enum: `Some(None)` for variant 0, `Some(Some(inner))`
/// for variant 1, `None` when the value is not an option at all.
pub fn as_option(value: &Value) -> Option<Option<&Value>> {
    if kind(value) != Some("Enum") {
        return None;
    }
    match variant_id(value)? {
        0 => Some(None),
        1 => Some(fields(value).first()),
        _ => None,
    }
}

/// Key/value pairs of a `Map` value.
pub fn map_entries(value: &Value) -> Vec<(&Value, &Value)> {
    value
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| Some((e.get("key")?, e.get("value")?)))
                .collect()
        })
        .unwrap_or_default()
}
