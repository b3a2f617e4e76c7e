//! HALCYON Test Utilities
//!
//! Centralized test infrastructure for the HALCYON workspace:
//! - Scripted mock transport
//! - Proptest generators for HAL payloads and query options
//! - HAL payload fixtures and a typed sample resource
//! - Custom assertions for HALCYON-specific validation

pub use halcyon_core::{
    HalConfig, HalError, HalOptions, HalResource, HalResult, Link, Links, LinksBuilder, Method,
    PageLink, PagedCollection, RequestBody, Resource, Sort, SortOrder, Transport,
    TransportRequest, TransportResponse,
};

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

#[derive(Debug, Clone)]
enum MockReply {
    Respond(TransportResponse),
    Fail(String),
}

/// Transport that answers from scripted routes and records every request.
///
/// Replies are keyed by `(method, url)`; the query string travels separately
/// in [`TransportRequest::query`] and is not part of the key. When several
/// replies are queued for one route they are served in order and the last
/// one repeats. Unscripted routes answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `method url`.
    pub fn on(&self, method: Method, url: impl Into<String>, status: u16, body: Value) -> &Self {
        self.push(method, url.into(), MockReply::Respond(TransportResponse::new(status, body)));
        self
    }

    /// Queue a `200` reply for `GET url`.
    pub fn on_get(&self, url: impl Into<String>, body: Value) -> &Self {
        self.on(Method::Get, url, 200, body)
    }

    /// Queue a transport-level failure for `method url`.
    pub fn fail(&self, method: Method, url: impl Into<String>, message: impl Into<String>) -> &Self {
        self.push(method, url.into(), MockReply::Fail(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of recorded requests for `method url`.
    pub fn count_for(&self, method: Method, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn push(&self, method: Method, url: String, reply: MockReply) {
        self.routes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry((method, url))
            .or_default()
            .push_back(reply);
    }

    fn next_reply(&self, method: Method, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let queue = routes.get_mut(&(method, url.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: TransportRequest) -> HalResult<TransportResponse> {
        let reply = self.next_reply(request.method, &request.url);
        let route = format!("{} {}", request.method, request.url);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match reply {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(HalError::transport(std::io::Error::other(message))),
            None => Ok(TransportResponse::new(
                404,
                json!({ "error": format!("no mock route for {route}") }),
            )),
        }
    }
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for HAL payloads and query options.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Map;

    /// Generate a relative href such as `/widgets/12`.
    pub fn arb_href() -> impl Strategy<Value = String> {
        "/[a-z]{1,8}/[0-9]{1,4}"
    }

    /// Generate a relation name other than `self`.
    pub fn arb_relation() -> impl Strategy<Value = String> {
        "[a-z]{1,8}".prop_filter("self is reserved", |rel| rel.as_str() != "self")
    }

    /// Generate a `_links` object, with or without a `self` entry.
    pub fn arb_links(with_self: bool) -> impl Strategy<Value = Value> {
        (
            arb_href(),
            prop::collection::btree_map(arb_relation(), arb_href(), 0..4),
        )
            .prop_map(move |(self_href, rels)| {
                let mut links = Map::new();
                for (rel, href) in rels {
                    links.insert(rel, json!({ "href": href }));
                }
                if with_self {
                    links.insert("self".into(), json!({ "href": self_href }));
                }
                Value::Object(links)
            })
    }

    /// Generate a scalar JSON value.
    pub fn arb_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        ]
    }

    /// Generate a HAL object: scalar fields plus `_links`.
    pub fn arb_hal_object(with_self: bool) -> impl Strategy<Value = Value> {
        (
            prop::collection::btree_map("[a-z]{1,8}", arb_scalar(), 0..5),
            arb_links(with_self),
        )
            .prop_map(|(fields, links)| {
                let mut map: Map<String, Value> = fields.into_iter().collect();
                map.insert("_links".into(), links);
                Value::Object(map)
            })
    }

    /// Generate a widget payload that hydrates into [`fixtures::Widget`].
    pub fn arb_widget_payload() -> impl Strategy<Value = Value> {
        (
            "[A-Za-z]{1,12}",
            0u32..1000,
            1u32..10_000,
            prop::option::of(arb_hal_object(false)),
        )
            .prop_map(|(name, quantity, id, embedded)| {
                let mut payload = fixtures::widget_payload(id, &name);
                payload["quantity"] = json!(quantity);
                if let Some(embedded) = embedded {
                    payload["detail"] = embedded;
                }
                payload
            })
    }

    /// Generate a sort spec element.
    pub fn arb_sort() -> impl Strategy<Value = Sort> {
        ("[a-z]{1,8}", any::<bool>()).prop_map(|(path, asc)| {
            if asc {
                Sort::asc(path)
            } else {
                Sort::desc(path)
            }
        })
    }

    /// Generate query options, possibly empty.
    pub fn arb_hal_options() -> impl Strategy<Value = HalOptions> {
        (
            prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{1,6}"), 0..3),
            prop::option::of(1u64..200),
            prop::collection::vec(arb_sort(), 0..3),
        )
            .prop_map(|(params, size, sort)| HalOptions {
                params: params
                    .into_iter()
                    .map(|(k, v)| halcyon_core::HalParam::new(k, v))
                    .collect(),
                size,
                sort,
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built HAL payloads and a typed sample resource.

    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::Map;

    /// Root URI used by every fixture.
    pub const ROOT_URI: &str = "http://localhost:8080/api";

    /// Absolute href for `path` under [`ROOT_URI`].
    pub fn href(path: &str) -> String {
        format!("{}/{}", ROOT_URI, path.trim_start_matches('/'))
    }

    /// Client configuration rooted at [`ROOT_URI`].
    pub fn test_config() -> HalConfig {
        HalConfig::new(ROOT_URI)
    }

    /// A `_links` object from `(relation, href)` pairs.
    pub fn links(relations: &[(&str, &str)]) -> Value {
        let links: Map<String, Value> = relations
            .iter()
            .map(|(rel, href)| (rel.to_string(), json!({ "href": href })))
            .collect();
        Value::Object(links)
    }

    /// A single resource payload: `fields` plus `_links` with `self` first.
    pub fn resource_payload(self_href: &str, fields: Value, relations: &[(&str, &str)]) -> Value {
        let mut all = vec![("self", self_href)];
        all.extend_from_slice(relations);
        let mut payload = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        payload.insert("_links".into(), links(&all));
        Value::Object(payload)
    }

    /// A collection envelope under `_embedded.<label>`, without page metadata.
    pub fn collection_payload(label: &str, items: Vec<Value>, relations: &[(&str, &str)]) -> Value {
        json!({
            "_embedded": { label: items },
            "_links": links(relations),
        })
    }

    /// A collection envelope with `page` metadata.
    pub fn paged_payload(
        label: &str,
        items: Vec<Value>,
        page: PageMeta,
        relations: &[(&str, &str)],
    ) -> Value {
        let mut payload = collection_payload(label, items, relations);
        payload["page"] = page.to_json();
        payload
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageMeta {
        pub total_elements: u64,
        pub total_pages: u64,
        pub number: u64,
        pub size: u64,
    }

    impl PageMeta {
        pub fn to_json(self) -> Value {
            json!({
                "totalElements": self.total_elements,
                "totalPages": self.total_pages,
                "number": self.number,
                "size": self.size,
            })
        }
    }

    /// Sample typed resource used across the workspace's tests.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct Widget {
        #[serde(default)]
        pub name: String,
        #[serde(default)]
        pub quantity: u32,
        #[serde(rename = "_links", default)]
        pub links: Links,
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }

    halcyon_core::impl_hal_resource!(Widget);

    /// Payload of widget `id`, with `self` and `owner` links.
    pub fn widget_payload(id: u32, name: &str) -> Value {
        let self_href = href(&format!("widgets/{id}"));
        let owner = href(&format!("widgets/{id}/owner"));
        resource_payload(
            &self_href,
            json!({ "name": name, "quantity": 1 }),
            &[("owner", owner.as_str())],
        )
    }

    /// A hydrated widget `id`.
    pub fn widget(id: u32, name: &str) -> Widget {
        Widget {
            name: name.to_string(),
            quantity: 1,
            links: LinksBuilder::new()
                .self_link(href(&format!("widgets/{id}")))
                .relation("owner", href(&format!("widgets/{id}/owner")))
                .build(),
            extra: Map::new(),
        }
    }

    /// An untyped resource with a `self` link and the given relations.
    pub fn resource_with_links(self_href: &str, relations: &[(&str, Link)]) -> Resource {
        let mut builder = LinksBuilder::new().self_link(self_href);
        for (rel, link) in relations {
            builder = builder.add(*rel, link.clone());
        }
        Resource {
            links: builder.build(),
            ..Resource::default()
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for HALCYON-specific validation.

    use super::*;
    use std::sync::Arc;

    /// Assert that `mock` saw exactly `expected` requests for `method url`.
    #[track_caller]
    pub fn assert_requested(mock: &MockTransport, method: Method, url: &str, expected: usize) {
        let actual = mock.count_for(method, url);
        assert_eq!(
            actual, expected,
            "Expected {expected} {method} {url} request(s), saw {actual}: {:?}",
            mock.requests()
        );
    }

    /// Assert that `mock` saw no traffic at all.
    #[track_caller]
    pub fn assert_no_requests(mock: &MockTransport) {
        assert_eq!(
            mock.request_count(),
            0,
            "Expected no requests, saw: {:?}",
            mock.requests()
        );
    }

    /// Assert that two handles point at the same cached instance.
    #[track_caller]
    pub fn assert_same_instance<T>(a: &Arc<T>, b: &Arc<T>) {
        assert!(Arc::ptr_eq(a, b), "Expected the same shared instance");
    }

    /// Assert that a result is `RelationNotFound` for `relation`.
    #[track_caller]
    pub fn assert_relation_not_found<T: std::fmt::Debug>(result: &HalResult<T>, relation: &str) {
        match result {
            Err(HalError::RelationNotFound { relation: r }) => assert_eq!(r, relation),
            other => panic!("Expected RelationNotFound({relation}), got: {other:?}"),
        }
    }

    /// Assert that a result is `NavigationNotAvailable` for `link`.
    #[track_caller]
    pub fn assert_navigation_unavailable<T: std::fmt::Debug>(result: &HalResult<T>, link: PageLink) {
        match result {
            Err(HalError::NavigationNotAvailable { link: l }) => assert_eq!(*l, link),
            other => panic!("Expected NavigationNotAvailable({link}), got: {other:?}"),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use halcyon_core::hydrate_resource;

    #[tokio::test]
    async fn test_mock_replays_routes_in_order() {
        let mock = MockTransport::new();
        mock.on_get("/a", json!({"n": 1})).on_get("/a", json!({"n": 2}));

        let first = mock.execute(TransportRequest::get("/a")).await.unwrap();
        let second = mock.execute(TransportRequest::get("/a")).await.unwrap();
        let third = mock.execute(TransportRequest::get("/a")).await.unwrap();
        assert_eq!(first.body["n"], 1);
        assert_eq!(second.body["n"], 2);
        assert_eq!(third.body["n"], 2);
        assertions::assert_requested(&mock, Method::Get, "/a", 3);
    }

    #[tokio::test]
    async fn test_mock_unscripted_route_is_404() {
        let mock = MockTransport::new();
        let response = mock.execute(TransportRequest::delete("/x")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(mock.last_request().unwrap().method, Method::Delete);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockTransport::new();
        mock.fail(Method::Get, "/down", "connection refused");
        let err = mock.execute(TransportRequest::get("/down")).await.unwrap_err();
        assert!(matches!(err, HalError::Transport(_)));
        mock.clear_requests();
        assertions::assert_no_requests(&mock);
    }

    #[test]
    fn test_widget_fixture_hydrates() {
        let widget = hydrate_resource(fixtures::Widget::default(), fixtures::widget_payload(3, "bolt"))
            .unwrap();
        assert_eq!(widget, fixtures::widget(3, "bolt"));
    }

    #[test]
    fn test_href_fixture() {
        assert_eq!(fixtures::href("/widgets/1"), "http://localhost:8080/api/widgets/1");
        assert_eq!(fixtures::href("widgets"), "http://localhost:8080/api/widgets");
    }
}
