//! Lenient field readers over `serde_json::Value`.
//!
//! Each reader takes a list of accepted key spellings (camelCase first, then
//! snake_case) and never fails; callers supply the default.

use serde_json::Value;
use std::collections::BTreeMap;

/// Score assigned when a model omits or garbles an importance/strength value.
pub const DEFAULT_SCORE: u8 = 5;

/// First present, non-null value under any of `keys`.
pub fn get<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let obj = value.as_object()?;
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Trimmed, non-empty string. Numbers and booleans are stringified.
pub fn string(value: &Value, keys: &[&str]) -> Option<String> {
    let s = match get(value, keys)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

pub fn string_or(value: &Value, keys: &[&str], default: impl Into<String>) -> String {
    string(value, keys).unwrap_or_else(|| default.into())
}

/// Integer score clamped to `1..=10`; missing or non-numeric yields [`DEFAULT_SCORE`].
pub fn score(value: &Value, keys: &[&str]) -> u8 {
    let n = match get(value, keys) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match n {
        Some(n) if n.is_finite() => n.round().clamp(1.0, 10.0) as u8,
        _ => DEFAULT_SCORE,
    }
}

/// String list if the field is an array; `None` for any other shape.
pub fn string_list(value: &Value, keys: &[&str]) -> Option<Vec<String>> {
    let items = get(value, keys)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Flat string map from an object field; non-scalar values are dropped.
pub fn string_map(value: &Value, keys: &[&str]) -> BTreeMap<String, String> {
    let Some(obj) = get(value, keys).and_then(Value::as_object) else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter_map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), v))
        })
        .collect()
}
