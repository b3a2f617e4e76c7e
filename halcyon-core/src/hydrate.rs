//! Hydration engine
//!
//! Turns raw HAL payloads into typed resources and paged collections.
//! Inline objects that carry `_links` without `self` are normalised into
//! [`EmbeddedResource`] values before the payload is merged onto the target,
//! recursively and element-wise for arrays.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::{
    DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, DEFAULT_TOTAL_PAGES, LINKS_KEY, PAGE_KEY, SELF_REL,
};
use crate::error::HalResult;
use crate::links::links_from_value;
use crate::paged::PagedCollection;
use crate::resource::{is_embedded_value, EmbeddedResource, HalResource};
use crate::subtype::{label_from_href, SubtypeRegistry};

/// Overlay every property of `payload` onto `target`.
///
/// Fields of `target` missing from the payload keep their current values.
/// Fails only when a payload value does not fit the field's type.
pub fn merge_payload<T>(target: T, payload: Map<String, Value>) -> HalResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = match serde_json::to_value(&target)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in payload {
        merged.insert(key, value);
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Hydrate `target` from `payload`.
///
/// A non-object payload (for example the `null` body of a 204) leaves the
/// target unchanged.
pub fn hydrate_resource<T: HalResource>(target: T, payload: Value) -> HalResult<T> {
    match payload {
        Value::Object(map) => {
            let prepared = prepare_payload(map)?;
            target.apply_payload(prepared)
        }
        _ => Ok(target),
    }
}

/// Hydrate a single fetched resource, choosing a concrete subtype from the
/// collection segment of its `self` href when `registry` knows one.
pub fn hydrate_single<T: HalResource>(
    blank: T,
    payload: Value,
    root_uri: &str,
    registry: Option<&SubtypeRegistry<T>>,
) -> HalResult<T> {
    let subtype = registry.and_then(|registry| {
        self_href(&payload).and_then(|href| registry.instantiate(&label_from_href(href, root_uri)))
    });
    hydrate_resource(subtype.unwrap_or(blank), payload)
}

/// Hydrate a HAL collection envelope.
///
/// Items are read from `payload[embedded_key]`, shaped `{label: [item, ...]}`,
/// in payload order. A missing or malformed embedded object yields an empty
/// collection; page metadata and navigational hrefs fall back to defaults.
pub fn hydrate_collection<T, F>(
    blank: F,
    payload: Value,
    embedded_key: &str,
    registry: Option<&SubtypeRegistry<T>>,
) -> HalResult<PagedCollection<T>>
where
    T: HalResource,
    F: Fn() -> T,
{
    let mut collection = PagedCollection::empty(embedded_key);
    let Value::Object(mut envelope) = payload else {
        return Ok(collection);
    };

    if let Some(Value::Object(groups)) = envelope.remove(embedded_key) {
        for (label, items) in groups {
            let Value::Array(items) = items else {
                continue;
            };
            for item in items {
                let target = registry
                    .and_then(|registry| registry.instantiate(&label))
                    .unwrap_or_else(&blank);
                collection.items.push(hydrate_resource(target, item)?);
            }
        }
    }

    let page = envelope.get(PAGE_KEY);
    let page_field = |field: &str| page.and_then(|p| p.get(field)).and_then(Value::as_u64);
    collection.total_elements = page_field("totalElements").unwrap_or(collection.items.len() as u64);
    collection.total_pages = page_field("totalPages").unwrap_or(DEFAULT_TOTAL_PAGES);
    collection.page_number = page_field("number").unwrap_or(DEFAULT_PAGE_NUMBER);
    collection.page_size = page_field("size").unwrap_or(DEFAULT_PAGE_SIZE);

    let links = envelope.get(LINKS_KEY);
    let href = |rel: &str| {
        links
            .and_then(|l| l.get(rel))
            .and_then(|l| l.get("href"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    collection.self_uri = href(SELF_REL);
    collection.next_uri = href("next");
    collection.prev_uri = href("prev");
    collection.first_uri = href("first");
    collection.last_uri = href("last");

    tracing::trace!(
        items = collection.items.len(),
        total_elements = collection.total_elements,
        "Hydrated collection"
    );
    Ok(collection)
}

fn self_href(payload: &Value) -> Option<&str> {
    payload
        .get(LINKS_KEY)?
        .get(SELF_REL)?
        .get("href")?
        .as_str()
}

fn prepare_payload(payload: Map<String, Value>) -> HalResult<Map<String, Value>> {
    let mut prepared = Map::with_capacity(payload.len());
    for (key, value) in payload {
        if key == LINKS_KEY {
            prepared.insert(key, serde_json::to_value(links_from_value(value))?);
            continue;
        }
        let value = match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(prepare_value)
                    .collect::<HalResult<Vec<_>>>()?,
            ),
            other => prepare_value(other)?,
        };
        prepared.insert(key, value);
    }
    Ok(prepared)
}

fn prepare_value(value: Value) -> HalResult<Value> {
    if is_embedded_value(&value) {
        let embedded = hydrate_resource(EmbeddedResource::default(), value)?;
        Ok(serde_json::to_value(embedded)?)
    } else {
        Ok(value)
    }
}
