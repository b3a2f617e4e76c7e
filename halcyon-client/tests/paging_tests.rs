//! Paged collection transitions against a scripted transport.

use std::sync::Arc;

use halcyon_client::{HalClient, PageLink, PagedCollection, Sort};
use halcyon_core::Method;
use halcyon_test_utils::assertions::{
    assert_navigation_unavailable, assert_no_requests, assert_requested,
};
use halcyon_test_utils::fixtures::{self, href, PageMeta, Widget};
use halcyon_test_utils::{init_test_tracing, MockTransport};
use serde_json::Value;

fn client(mock: &Arc<MockTransport>) -> HalClient {
    init_test_tracing();
    HalClient::builder(fixtures::test_config())
        .shared_transport(Arc::clone(mock))
        .build()
        .expect("client should build")
}

/// Page 1 of 3 at size 2, sorted by name descending.
fn current_page() -> PagedCollection<Widget> {
    PagedCollection {
        items: vec![fixtures::widget(3, "c"), fixtures::widget(4, "d")],
        self_uri: Some(href("widgets?page=1&size=2")),
        next_uri: Some(href("widgets?page=2&size=2")),
        prev_uri: Some(href("widgets?page=0&size=2")),
        total_elements: 6,
        total_pages: 3,
        page_number: 1,
        page_size: 2,
        sort: vec![Sort::desc("name")],
        ..PagedCollection::default()
    }
}

fn page_payload(number: u64, ids: &[u32], self_href: &str) -> Value {
    let items = ids
        .iter()
        .map(|id| fixtures::widget_payload(*id, &format!("w{id}")))
        .collect();
    fixtures::paged_payload(
        "widgets",
        items,
        PageMeta {
            total_elements: 6,
            total_pages: 3,
            number,
            size: 2,
        },
        &[("self", self_href)],
    )
}

#[tokio::test]
async fn test_missing_link_fails_without_network() {
    let mock = Arc::new(MockTransport::new());
    let client = client(&mock);
    let collection = current_page();

    let result = client.first(&collection).await;
    assert_navigation_unavailable(&result, PageLink::First);
    let result = client.last(&collection).await;
    assert_navigation_unavailable(&result, PageLink::Last);

    let unanchored: PagedCollection<Widget> = PagedCollection {
        self_uri: None,
        ..current_page()
    };
    let result = client.page(&unanchored, 2).await;
    assert_navigation_unavailable(&result, PageLink::Current);

    assert_no_requests(&mock);
}

#[tokio::test]
async fn test_next_builds_new_collection_and_carries_sort() {
    let mock = Arc::new(MockTransport::new());
    let next_href = href("widgets?page=2&size=2");
    mock.on_get(next_href.clone(), page_payload(2, &[5, 6], &next_href));
    let client = client(&mock);
    let collection = current_page();

    let next = client.next(&collection).await.unwrap();
    assert_eq!(next.page_number, 2);
    assert_eq!(next.items, vec![fixtures::widget(5, "w5"), fixtures::widget(6, "w6")]);
    assert_eq!(next.sort, vec![Sort::desc("name")]);
    assert_eq!(next.embedded_key, collection.embedded_key);
    assert!(!next.has_next());

    assert_eq!(collection.page_number, 1);
    assert_eq!(collection.len(), 2);
    assert_requested(&mock, Method::Get, &next_href, 1);
}

#[tokio::test]
async fn test_prev_follows_prev_link() {
    let mock = Arc::new(MockTransport::new());
    let prev_href = href("widgets?page=0&size=2");
    mock.on_get(prev_href.clone(), page_payload(0, &[1, 2], &prev_href));
    let client = client(&mock);

    let prev = client.prev(&current_page()).await.unwrap();
    assert_eq!(prev.page_number, 0);
    assert_eq!(prev.self_uri.as_deref(), Some(prev_href.as_str()));
}

#[tokio::test]
async fn test_page_replaces_params_in_place_and_appends_sort() {
    let mock = Arc::new(MockTransport::new());
    let url = href("widgets?page=2&size=2&sort=name,DESC");
    mock.on_get(url.clone(), page_payload(2, &[5, 6], &url));
    let client = client(&mock);

    let page = client.page(&current_page(), 2).await.unwrap();
    assert_eq!(page.page_number, 2);
    assert_eq!(page.sort, vec![Sort::desc("name")]);
    assert_requested(&mock, Method::Get, &url, 1);
}

#[tokio::test]
async fn test_size_drops_page_param() {
    let mock = Arc::new(MockTransport::new());
    let url = href("widgets?size=4&sort=name,DESC");
    mock.on_get(url.clone(), page_payload(0, &[1, 2, 3, 4], &url));
    let client = client(&mock);

    let resized = client.size(&current_page(), 4).await.unwrap();
    assert_eq!(resized.len(), 4);
    assert_requested(&mock, Method::Get, &url, 1);
}

#[tokio::test]
async fn test_sort_replaces_carried_order() {
    let mock = Arc::new(MockTransport::new());
    let url = href("widgets?page=1&size=2&sort=quantity,ASC");
    mock.on_get(url.clone(), page_payload(1, &[3, 4], &url));
    let client = client(&mock);

    let resorted = client
        .sort(&current_page(), vec![Sort::asc("quantity")])
        .await
        .unwrap();
    assert_eq!(resorted.sort, vec![Sort::asc("quantity")]);
    assert_requested(&mock, Method::Get, &url, 1);
}

#[tokio::test]
async fn test_templated_self_uri_is_stripped() {
    let mock = Arc::new(MockTransport::new());
    let url = href("widgets?size=2&page=1&sort=name,DESC");
    mock.on_get(url.clone(), page_payload(1, &[3, 4], &url));
    let client = client(&mock);
    let collection = PagedCollection {
        self_uri: Some(href("widgets{?page,size,sort}")),
        ..current_page()
    };

    client.page(&collection, 1).await.unwrap();
    assert_requested(&mock, Method::Get, &url, 1);
}

#[tokio::test]
async fn test_page_without_metadata_uses_configured_size() {
    let mock = Arc::new(MockTransport::new());
    let next_href = href("widgets?page=2&size=2");
    mock.on_get(
        next_href.clone(),
        fixtures::collection_payload("widgets", vec![fixtures::widget_payload(5, "w5")], &[]),
    );
    let client = client(&mock);

    let next = client.next(&current_page()).await.unwrap();
    assert_eq!(next.page_size, client.config().page_size);
    assert_eq!(next.total_elements, 1);
    assert_eq!(next.total_pages, 1);
}

#[tokio::test]
async fn test_relative_page_links_are_joined_to_root() {
    let mock = Arc::new(MockTransport::new());
    let next_href = href("widgets?page=2&size=2");
    let page_url = href("widgets?page=0&size=2&sort=name,DESC");
    mock.on_get(next_href.clone(), page_payload(2, &[5, 6], &next_href));
    mock.on_get(page_url.clone(), page_payload(0, &[1, 2], &page_url));
    let client = client(&mock);
    let collection = PagedCollection {
        self_uri: Some("/api/widgets?page=1&size=2".to_string()),
        next_uri: Some("/api/widgets?page=2&size=2".to_string()),
        ..current_page()
    };

    let next = client.next(&collection).await.unwrap();
    assert_eq!(next.page_number, 2);
    let first = client.page(&collection, 0).await.unwrap();
    assert_eq!(first.page_number, 0);

    assert_requested(&mock, Method::Get, &next_href, 1);
    assert_requested(&mock, Method::Get, &page_url, 1);
}
