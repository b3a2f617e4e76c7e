//! HAL Link Types
//!
//! Types for the `_links` map carried by every HAL object. A relation name
//! maps to a [`Link`]; the `self` relation, when present, is the canonical
//! address of the resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::constants::SELF_REL;
use crate::url::strip_template_vars;

/// A hypermedia link to a related resource or collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Link {
    /// The URL for this link (absolute or relative path).
    #[serde(default)]
    pub href: String,

    /// Whether `href` is an RFC 6570 URI template.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub templated: bool,

    /// Human-readable title for this link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    /// Create a plain link.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
            title: None,
        }
    }

    /// Create a templated link.
    pub fn templated(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: true,
            title: None,
        }
    }

    /// Add a title to this link.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The literal address of this link: template variables are removed
    /// when the link is templated.
    ///
    /// This is the value used both as fetch target and as cache key.
    pub fn resolved_href(&self) -> String {
        if self.templated {
            strip_template_vars(&self.href)
        } else {
            self.href.clone()
        }
    }
}

/// A collection of named links.
pub type Links = HashMap<String, Link>;

/// Read a raw `_links` value without failing on relations this model
/// cannot hold.
///
/// A link array (such as `curies`) keeps its first link; entries that are
/// not link objects are dropped. A non-object value yields an empty map.
pub fn links_from_value(value: Value) -> Links {
    let Value::Object(entries) = value else {
        return Links::new();
    };
    entries
        .into_iter()
        .filter_map(|(rel, raw)| {
            let raw = match raw {
                Value::Array(items) => items.into_iter().next()?,
                other => other,
            };
            match serde_json::from_value::<Link>(raw) {
                Ok(link) => Some((rel, link)),
                Err(e) => {
                    tracing::trace!(rel = %rel, error = %e, "Dropping unreadable link");
                    None
                }
            }
        })
        .collect()
}

/// The single capability test for "independently addressable resource":
/// a non-empty link map that contains `self`.
pub fn is_resource_links(links: &Links) -> bool {
    !links.is_empty() && links.contains_key(SELF_REL)
}

/// Builder for constructing link collections.
#[derive(Debug, Default)]
pub struct LinksBuilder {
    links: Links,
}

impl LinksBuilder {
    /// Create a new links builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link with the given relation name.
    pub fn add(mut self, rel: impl Into<String>, link: Link) -> Self {
        self.links.insert(rel.into(), link);
        self
    }

    /// Add a "self" link.
    pub fn self_link(self, href: impl Into<String>) -> Self {
        self.add(SELF_REL, Link::new(href))
    }

    /// Add a plain relation link.
    pub fn relation(self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.add(rel, Link::new(href))
    }

    /// Build the links map.
    pub fn build(self) -> Links {
        self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_builders() {
        let link = Link::new("/foo").with_title("Get Foo");
        assert_eq!(link.href, "/foo");
        assert!(!link.templated);
        assert_eq!(link.title, Some("Get Foo".into()));

        let link = Link::templated("/bar{?page}");
        assert!(link.templated);
    }

    #[test]
    fn test_templated_href_is_stripped() {
        let link = Link::templated("/orders/{id}");
        assert_eq!(link.resolved_href(), "/orders/");

        let plain = Link::new("/orders/{id}");
        assert_eq!(plain.resolved_href(), "/orders/{id}");
    }

    #[test]
    fn test_links_builder() {
        let links = LinksBuilder::new()
            .self_link("/api/things/123")
            .relation("children", "/api/things/123/children")
            .add("search", Link::templated("/api/things/search{?q}"))
            .build();

        assert_eq!(links.len(), 3);
        assert!(links.contains_key("self"));
        assert!(links.contains_key("children"));
        assert!(links["search"].templated);
    }

    #[test]
    fn test_is_resource_links() {
        assert!(!is_resource_links(&Links::new()));

        let embedded = LinksBuilder::new().relation("owner", "/owners/1").build();
        assert!(!is_resource_links(&embedded));

        let resource = LinksBuilder::new().self_link("/a/1").build();
        assert!(is_resource_links(&resource));
    }

    #[test]
    fn test_links_from_value_tolerates_arrays_and_junk() {
        let links = links_from_value(serde_json::json!({
            "self": {"href": "/a/1"},
            "curies": [
                {"name": "ex", "href": "/docs/{rel}", "templated": true},
                {"name": "other", "href": "/other/{rel}", "templated": true}
            ],
            "empty": [],
            "broken": "not-a-link",
            "wrong": {"href": 42}
        }));

        assert_eq!(links.len(), 2);
        assert_eq!(links["self"], Link::new("/a/1"));
        assert_eq!(links["curies"], Link::templated("/docs/{rel}"));
        assert!(links_from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_link_deserializes_without_templated_flag() {
        let link: Link = serde_json::from_str(r#"{"href":"/a/1"}"#).unwrap();
        assert_eq!(link, Link::new("/a/1"));

        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, r#"{"href":"/a/1"}"#);
    }
}
