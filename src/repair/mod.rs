//! Response repair layer.
//!
//! Model output is never trusted. This module pulls the JSON out of whatever
//! the model returned, parses it once, and repairs each record field by field
//! so downstream stages always see well-formed values.

mod extract;
pub mod fields;

pub use extract::extract_json;

use crate::error::{PodsmithError, Result};
use serde_json::{Map, Value};

/// A record that can be rebuilt from arbitrary JSON, filling defaults.
///
/// `index` is the record's zero-based position in the response and is used
/// for positional default ids (`"topic-1"`, `"speaker-2"`, ...).
pub trait Repair: Sized {
    fn repair(value: &Value, index: usize) -> Self;
}

/// Keys a model uses to wrap a record list in an object.
const WRAPPER_KEYS: &[&str] = &[
    "topics",
    "entities",
    "relationships",
    "speakers",
    "dialogue",
    "turns",
    "items",
    "records",
    "results",
    "data",
];

/// Extract, parse, and repair a list of records from raw model output.
///
/// Accepts a top-level array or an object wrapping one. An object is a
/// wrapper when one of [`WRAPPER_KEYS`] holds an array, or when its only
/// field is an array. Any other object is a single record, even if some of
/// its fields are arrays. Elements that are not objects repair from an
/// empty object.
pub fn repair_records<T: Repair>(raw: &str) -> Result<Vec<T>> {
    let value = parse_structured(raw)?;
    let empty = Value::Object(Map::new());

    let items: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match wrapped_list(obj) {
            Some(items) => items.iter().collect(),
            None => vec![&value],
        },
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if item.is_object() {
                T::repair(item, i)
            } else {
                T::repair(&empty, i)
            }
        })
        .collect())
}

fn wrapped_list(obj: &Map<String, Value>) -> Option<&Vec<Value>> {
    let named = WRAPPER_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array));
    if named.is_some() {
        return named;
    }
    match obj.values().next() {
        Some(Value::Array(items)) if obj.len() == 1 => Some(items),
        _ => None,
    }
}

/// Parse the first embedded JSON span that is valid JSON.
fn parse_structured(raw: &str) -> Result<Value> {
    let mut first_error = None;

    for candidate in extract::candidates(raw) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match first_error {
        Some(reason) => Err(PodsmithError::MalformedOutput {
            reason,
            raw: raw.to_string(),
        }),
        None => Err(PodsmithError::NoStructuredOutput {
            raw: raw.to_string(),
        }),
    }
}

/// Pad (with `make_default(index)`) or truncate `records` to exactly `n`.
pub fn fit_count<T>(mut records: Vec<T>, n: usize, mut make_default: impl FnMut(usize) -> T) -> Vec<T> {
    records.truncate(n);
    while records.len() < n {
        let index = records.len();
        records.push(make_default(index));
    }
    records
}
