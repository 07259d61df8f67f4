//! Scenario 6 of the spec's testable properties: a structured-only backend's
//! `NotSupported` error from `semantic_search` is caught at the repository
//! layer and re-issued as a name-equality query, never surfacing to the
//! caller as an error.

mod common;

use common::{entity, TestHarness};
use lorekeeper::cache::filter::Filters;
use lorekeeper::repository::SpellQuery;
use lorekeeper::LoreError;
use serde_json::json;

#[tokio::test]
async fn structured_cache_semantic_search_itself_raises_not_supported() {
    let harness = TestHarness::structured().await;
    let err = harness
        .cache
        .semantic_search("spells", "anything", 10, &Filters::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LoreError::NotSupported(_)));
}

#[tokio::test]
async fn structured_backend_falls_back_to_a_name_filter_on_semantic_query() {
    let harness = TestHarness::structured().await;
    harness
        .cache
        .store_entities(
            "spells",
            vec![entity(&[
                ("slug", json!("fire-bolt")),
                ("name", json!("fire damage")),
                ("document", json!("srd")),
                ("level", json!(0)),
            ])],
        )
        .await
        .unwrap();

    let query = SpellQuery {
        semantic_query: Some("fire damage".to_string()),
        ..SpellQuery::new()
    };
    let results = harness.repositories.spells().search(query).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "fire-bolt");
}

#[tokio::test]
async fn fallback_name_filter_with_no_match_returns_empty_not_error() {
    let harness = TestHarness::structured().await;
    let query = SpellQuery {
        semantic_query: Some("a name nothing matches".to_string()),
        ..SpellQuery::new()
    };
    let results = harness.repositories.spells().search(query).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn structured_backend_still_supports_plain_structured_search() {
    let harness = TestHarness::structured().await;
    harness
        .cache
        .store_entities(
            "spells",
            vec![entity(&[
                ("slug", json!("fireball")),
                ("name", json!("Fireball")),
                ("document", json!("srd")),
                ("level", json!(3)),
            ])],
        )
        .await
        .unwrap();

    let query = SpellQuery {
        level: Some(3),
        ..SpellQuery::new()
    };
    let results = harness.repositories.spells().search(query).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "fireball");
}
