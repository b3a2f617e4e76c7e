//! Outgoing payload preparation.
//!
//! Request bodies reference related resources by URI: any nested object that
//! is itself an addressable resource is replaced by its `self` href.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::{LINKS_KEY, SELF_REL};
use crate::error::HalResult;
use crate::options::Include;

/// Serialize `body` for a create/update/patch request.
///
/// `_links` is dropped, nested resources collapse to their self href
/// (element-wise in arrays, recursing into plain objects) and null
/// properties are kept only where `include` says so.
pub fn to_payload<B: Serialize>(body: &B, include: &Include) -> HalResult<Value> {
    match serde_json::to_value(body)? {
        Value::Object(map) => Ok(Value::Object(prepare_object(map, include))),
        other => Ok(other),
    }
}

fn prepare_object(map: Map<String, Value>, include: &Include) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        if key == LINKS_KEY {
            continue;
        }
        let value = match value {
            Value::Null if include.keeps_null(&key) => Value::Null,
            Value::Null => continue,
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| prepare_value(item, include))
                    .collect(),
            ),
            other => prepare_value(other, include),
        };
        out.insert(key, value);
    }
    out
}

fn prepare_value(value: Value, include: &Include) -> Value {
    if let Some(href) = resource_href(&value) {
        return Value::String(href.to_string());
    }
    match value {
        Value::Object(map) => Value::Object(prepare_object(map, include)),
        other => other,
    }
}

fn resource_href(value: &Value) -> Option<&str> {
    value
        .get(LINKS_KEY)?
        .get(SELF_REL)?
        .get("href")?
        .as_str()
}
