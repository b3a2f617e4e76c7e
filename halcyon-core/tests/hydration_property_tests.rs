//! Property-Based Tests for Hydration
//!
//! **Property: Idempotent hydration**
//!
//! Hydrating the same payload into two blank instances yields structurally
//! equal values, and hydrating a value's own serialization back onto it
//! changes nothing.
//!
//! **Property: Embedded discrimination**
//!
//! Objects with `_links` but no `self` come out as embedded values; objects
//! with a `self` link are left as addressable resources.

use halcyon_core::{
    hydrate_collection, hydrate_resource, is_embedded_value, HalResource, Resource,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ]
}

fn href_strategy() -> impl Strategy<Value = String> {
    "/[a-z]{1,8}/[0-9]{1,4}"
}

fn links_strategy(with_self: bool) -> impl Strategy<Value = Value> {
    (href_strategy(), prop::collection::btree_map("[a-z]{1,6}", href_strategy(), 0..3)).prop_map(
        move |(self_href, rels)| {
            let mut links = Map::new();
            for (rel, href) in rels {
                if rel != "self" {
                    links.insert(rel, json!({ "href": href }));
                }
            }
            if with_self {
                links.insert("self".into(), json!({ "href": self_href }));
            }
            Value::Object(links)
        },
    )
}

fn nested_strategy() -> impl Strategy<Value = Value> {
    let object = |with_self: bool| {
        (
            prop::collection::btree_map("[a-z]{1,6}", scalar_strategy(), 0..4),
            links_strategy(with_self),
        )
            .prop_map(|(fields, links)| {
                let mut map: Map<String, Value> = fields.into_iter().collect();
                map.insert("_links".into(), links);
                Value::Object(map)
            })
    };
    prop_oneof![
        scalar_strategy(),
        object(false),
        object(true),
        prop::collection::vec(object(false), 0..3).prop_map(Value::Array),
    ]
}

fn payload_strategy() -> impl Strategy<Value = Value> {
    (
        prop::collection::btree_map("[a-z]{1,8}", nested_strategy(), 0..6),
        links_strategy(true),
    )
        .prop_map(|(fields, links)| {
            let mut map: Map<String, Value> = fields
                .into_iter()
                .filter(|(k, _)| k != "page")
                .collect();
            map.insert("_links".into(), links);
            Value::Object(map)
        })
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_hydration_is_deterministic(payload in payload_strategy()) {
        let a = hydrate_resource(Resource::default(), payload.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let b = hydrate_resource(Resource::default(), payload)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_rehydrating_own_serialization_is_identity(payload in payload_strategy()) {
        let first = hydrate_resource(Resource::default(), payload)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let serialized = serde_json::to_value(&first)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = hydrate_resource(first.clone(), serialized)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_embedded_discrimination(payload in payload_strategy()) {
        let resource = hydrate_resource(Resource::default(), payload.clone())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(resource.is_resource());

        for (key, original) in payload.as_object().into_iter().flatten() {
            if key == "_links" {
                continue;
            }
            let hydrated = resource.field(key);
            prop_assert!(hydrated.is_some());
            prop_assert_eq!(
                is_embedded_value(original),
                hydrated.map(is_embedded_value).unwrap_or(false)
            );
            if is_embedded_value(original) {
                prop_assert!(resource.embedded(key).is_some());
            }
        }
    }

    #[test]
    fn prop_collection_defaults_count_items(count in 0usize..12) {
        let items: Vec<Value> = (0..count).map(|i| json!({ "n": i })).collect();
        let payload = json!({ "_embedded": { "things": items } });
        let collection = hydrate_collection(Resource::default, payload, "_embedded", None)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(collection.len(), count);
        prop_assert_eq!(collection.total_elements, count as u64);
        prop_assert_eq!(collection.total_pages, 1);
    }
}
