//! Accessors for loosely-shaped upstream JSON.
//!
//! Upstreams disagree on envelopes (`[...]` vs `{"items": [...]}` vs
//! `{"data": [...]}`), on id fields (`id` vs `_id` vs `{"$oid": ...}`) and on
//! whether numbers arrive as numbers or strings. Everything here is total:
//! a missing or mistyped field is `None`, never a panic.

use serde_json::Value;

/// Extracts the record list from `value`.
///
/// A bare array is returned as-is. An object yields the first of `items`
/// followed by `keys` that holds an array. Anything else is empty.
pub fn unwrap_list(value: &Value, keys: &[&str]) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => std::iter::once("items")
            .chain(keys.iter().copied())
            .find_map(|key| map.get(key).and_then(Value::as_array))
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// First non-empty string (or number, stringified) among `keys`.
pub fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Record identifier from `id` or `_id`, including the `{"$oid": ...}` form.
pub fn id(value: &Value) -> Option<String> {
    text(value, &["id", "_id"]).or_else(|| {
        ["id", "_id"]
            .iter()
            .find_map(|key| value.get(key)?.get("$oid")?.as_str().map(str::to_string))
    })
}

/// First numeric value among `keys`, accepting numeric strings.
pub fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    })
}

/// `YYYY-MM-DD` prefix of the first date among `keys`, or an empty string.
pub fn date(value: &Value, keys: &[&str]) -> String {
    text(value, keys)
        .map(|raw| raw.chars().take(10).collect())
        .unwrap_or_default()
}

/// True when any of `keys` is present and not null or blank.
pub fn is_set(value: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|key| match value.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(_) => true,
    })
}
