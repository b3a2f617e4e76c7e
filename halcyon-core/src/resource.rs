//! Resource model
//!
//! A hydrated HAL resource is a typed record plus its `_links` map. Typed
//! resources implement [`HalResource`]; [`Resource`] is the untyped form
//! (links plus a residual field map) and [`EmbeddedResource`] is the value
//! produced for inline objects that carry links but no `self`.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{LINKS_KEY, SELF_REL};
use crate::error::HalResult;
use crate::hydrate::merge_payload;
use crate::links::{is_resource_links, Link, Links};

/// Capability shared by every hydratable HAL type.
///
/// Implementors keep their link map in a field serialized as `_links`
/// (see [`impl_hal_resource!`](crate::impl_hal_resource)) and usually carry a
/// `#[serde(flatten)]` residual map so unknown payload fields pass through.
pub trait HalResource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn links(&self) -> &Links;

    fn links_mut(&mut self) -> &mut Links;

    /// Map an already-prepared payload object onto this instance.
    ///
    /// The default copies every payload property over the instance's current
    /// values. Polymorphic wrappers (enums over concrete resource types)
    /// override this to forward to the active variant.
    fn apply_payload(self, payload: Map<String, Value>) -> HalResult<Self> {
        merge_payload(self, payload)
    }

    fn link(&self, relation: &str) -> Option<&Link> {
        self.links().get(relation)
    }

    fn has_relation(&self, relation: &str) -> bool {
        self.links().contains_key(relation)
    }

    /// Literal href of `relation`, template variables stripped.
    fn relation_href(&self, relation: &str) -> Option<String> {
        self.link(relation).map(Link::resolved_href)
    }

    /// Canonical address; `None` for embedded resources.
    fn self_link_href(&self) -> Option<String> {
        self.relation_href(SELF_REL)
    }

    /// Whether this value is independently addressable.
    fn is_resource(&self) -> bool {
        is_resource_links(self.links())
    }
}

/// Implement [`HalResource`] for a struct whose link map lives in a field
/// named `links`.
#[macro_export]
macro_rules! impl_hal_resource {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::resource::HalResource for $ty {
                fn links(&self) -> &$crate::links::Links {
                    &self.links
                }

                fn links_mut(&mut self) -> &mut $crate::links::Links {
                    &mut self.links
                }
            }
        )+
    };
}

/// JSON-level twin of [`is_resource_links`]: an object whose `_links` map
/// lacks `self` is embedded, not independently resolvable.
pub fn is_embedded_value(value: &Value) -> bool {
    match value.get(LINKS_KEY) {
        Some(Value::Object(links)) => value.is_object() && !links.contains_key(SELF_REL),
        _ => false,
    }
}

/// Untyped resource: link map plus every other property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "_links", default, skip_serializing_if = "HashMap::is_empty")]
    pub links: Links,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Inline HAL object with links but no `self`.
///
/// Its `_links` key is always serialized so the value keeps classifying as
/// embedded after a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedResource {
    #[serde(rename = "_links", default)]
    pub links: Links,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl_hal_resource!(Resource, EmbeddedResource);

macro_rules! field_accessors {
    ($ty:ty) => {
        impl $ty {
            pub fn new() -> Self {
                Self::default()
            }

            /// Raw value of a non-link property.
            pub fn field(&self, key: &str) -> Option<&Value> {
                self.fields.get(key)
            }

            /// Deserialize a property into `T`; `Ok(None)` when absent.
            pub fn field_as<T: DeserializeOwned>(&self, key: &str) -> HalResult<Option<T>> {
                match self.fields.get(key) {
                    Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
                    None => Ok(None),
                }
            }

            /// The embedded object stored under `key`, if that property is one.
            pub fn embedded(&self, key: &str) -> Option<EmbeddedResource> {
                self.fields
                    .get(key)
                    .filter(|v| is_embedded_value(v))
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
            }

            /// Embedded objects found in the array stored under `key`.
            pub fn embedded_list(&self, key: &str) -> Vec<EmbeddedResource> {
                match self.fields.get(key) {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter(|v| is_embedded_value(v))
                        .filter_map(|v| serde_json::from_value(v.clone()).ok())
                        .collect(),
                    _ => Vec::new(),
                }
            }
        }
    };
}

field_accessors!(Resource);
field_accessors!(EmbeddedResource);
