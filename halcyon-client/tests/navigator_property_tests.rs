//! Property-Based Tests for Relation Navigation
//!
//! **Property: At most one fetch per key per expiry window**
//!
//! For any relation name, payload and number of repeated reads within the
//! TTL, the navigator issues exactly one request and every read returns the
//! same shared instance.

use std::sync::Arc;

use halcyon_client::{HalClient, HalOptions, RelationOptions};
use halcyon_core::{Link, Method};
use halcyon_test_utils::fixtures::{self, href, Widget};
use halcyon_test_utils::generators::{arb_hal_options, arb_relation, arb_widget_payload};
use halcyon_test_utils::MockTransport;
use proptest::prelude::*;
use tokio::runtime::{Builder, Runtime};

fn runtime() -> Result<Runtime, TestCaseError> {
    Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn client(mock: &Arc<MockTransport>) -> Result<HalClient, TestCaseError> {
    HalClient::builder(fixtures::test_config())
        .shared_transport(Arc::clone(mock))
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to build client: {}", e)))
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #[test]
    fn prop_single_relation_fetched_once(
        relation in arb_relation(),
        payload in arb_widget_payload(),
        reads in 1usize..6,
    ) {
        let rt = runtime()?;
        rt.block_on(async {
            let mock = Arc::new(MockTransport::new());
            let target = href(&format!("a/1/{relation}"));
            mock.on_get(target.clone(), payload);
            let client = client(&mock)?;
            let source = fixtures::resource_with_links(
                &href("a/1"),
                &[(relation.as_str(), Link::new(target.clone()))],
            );

            let mut seen: Vec<Arc<Widget>> = Vec::with_capacity(reads);
            for _ in 0..reads {
                let read = client
                    .get_relation::<Widget, _>(&source, &relation, &RelationOptions::default())
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?
                    .ok_or_else(|| TestCaseError::fail("relation resolved to nothing"))?;
                seen.push(read);
            }
            for read in &seen {
                prop_assert!(Arc::ptr_eq(&seen[0], read));
            }
            prop_assert_eq!(mock.count_for(Method::Get, &target), 1);
            Ok(())
        })?;
    }

    #[test]
    fn prop_query_options_always_fetch(options in arb_hal_options(), reads in 1usize..4) {
        let rt = runtime()?;
        rt.block_on(async {
            let mock = Arc::new(MockTransport::new());
            let target = href("a/1/widgets");
            mock.on_get(
                target.clone(),
                fixtures::collection_payload("widgets", vec![fixtures::widget_payload(1, "bolt")], &[]),
            );
            let client = client(&mock)?;
            let source = fixtures::resource_with_links(
                &href("a/1"),
                &[("widgets", Link::new(target.clone()))],
            );
            let relation_options = RelationOptions::new().with_query(options.clone());

            for _ in 0..reads {
                let collection = client
                    .get_relation_array::<Widget, _>(&source, "widgets", &relation_options)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(&collection.sort, &options.sort);
            }
            let expected = if HalOptions::has_query(&options) { reads } else { 1 };
            prop_assert_eq!(mock.count_for(Method::Get, &target), expected);
            Ok(())
        })?;
    }
}
