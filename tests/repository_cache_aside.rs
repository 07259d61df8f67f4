//! Cache-aside behavior of the repository layer: a miss fetches upstream
//! once and persists the result; an identical subsequent call is served from
//! the cache alone (scenario 5 of the spec's testable properties).

mod common;

use common::{entity, TestHarness};
use lorekeeper::cache::filter::Filters;
use lorekeeper::repository::SpellQuery;
use serde_json::json;

fn fireball() -> lorekeeper::models::Entity {
    entity(&[
        ("slug", json!("fireball")),
        ("name", json!("Fireball")),
        ("document", json!("srd")),
        ("level", json!(3)),
        ("school", json!("Evocation")),
        ("desc", json!("A bright streak of fire.")),
    ])
}

#[tokio::test]
async fn cache_miss_fetches_upstream_once_then_serves_from_cache() {
    let harness = TestHarness::new().await;
    harness.client.seed("spells", vec![fireball()]);

    let query = SpellQuery {
        level: Some(3),
        ..SpellQuery::new()
    };
    let first = harness.repositories.spells().search(query.clone()).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].slug, "fireball");
    assert_eq!(harness.client.call_count("spells"), 1);

    let second = harness.repositories.spells().search(query).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(
        harness.client.call_count("spells"),
        1,
        "second identical search must be served from cache without touching upstream"
    );
}

#[tokio::test]
async fn upstream_is_called_with_level_mapped_to_upstream_parameter_name() {
    let harness = TestHarness::new().await;
    harness.client.seed("spells", vec![fireball()]);

    harness
        .repositories
        .spells()
        .search(SpellQuery {
            level: Some(3),
            ..SpellQuery::new()
        })
        .await
        .unwrap();

    let filters = harness
        .client
        .last_filters("spells")
        .expect("upstream should have been called on the cache miss");
    assert!(filters.0.iter().any(|(k, v)| k == "level" && v == "3"));
}

#[tokio::test]
async fn get_all_fetches_upstream_only_once_for_an_empty_cache() {
    let harness = TestHarness::new().await;
    harness.client.seed("spells", vec![fireball()]);

    let first = harness.repositories.spells().get_all().await.unwrap();
    assert_eq!(first.len(), 1);
    let second = harness.repositories.spells().get_all().await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(harness.client.call_count("spells"), 1);
}

#[tokio::test]
async fn storing_the_same_slug_twice_replaces_rather_than_duplicates() {
    let harness = TestHarness::new().await;
    let cache = harness.cache.clone();

    let stored_first = cache.store_entities("spells", vec![fireball()]).await.unwrap();
    assert_eq!(stored_first, 1);
    let count_after_first = cache.entity_count("spells").await.unwrap();

    let stored_second = cache.store_entities("spells", vec![fireball()]).await.unwrap();
    assert_eq!(stored_second, 1);
    let count_after_second = cache.entity_count("spells").await.unwrap();

    assert_eq!(count_after_first, count_after_second, "re-storing the same slug must not duplicate the row");
}

#[tokio::test]
async fn storing_an_empty_batch_is_a_no_op() {
    let harness = TestHarness::new().await;
    let stored = harness.cache.store_entities("spells", vec![]).await.unwrap();
    assert_eq!(stored, 0);
    assert_eq!(harness.cache.entity_count("spells").await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_entity_type_returns_empty_rather_than_an_error() {
    let harness = TestHarness::new().await;
    let results = harness
        .cache
        .get_entities("totally_unknown_collection", &Filters::new())
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn entity_with_missing_slug_is_stored_under_empty_string_rather_than_crashing() {
    let harness = TestHarness::new().await;
    let no_slug = entity(&[("name", json!("No Slug")), ("document", json!("srd"))]);
    assert_eq!(no_slug.slug, "");

    let stored = harness.cache.store_entities("spells", vec![no_slug]).await.unwrap();
    assert_eq!(stored, 1, "a missing slug is stored under the empty string, not dropped");

    let results = harness
        .cache
        .get_entities("spells", &Filters::new().eq_str("slug", ""))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "");
}

#[tokio::test]
async fn two_missing_slug_entities_collapse_onto_one_row() {
    let harness = TestHarness::new().await;
    let first = entity(&[("name", json!("First")), ("document", json!("srd"))]);
    let second = entity(&[("name", json!("Second")), ("document", json!("srd"))]);

    let stored = harness
        .cache
        .store_entities("spells", vec![first, second])
        .await
        .unwrap();
    assert_eq!(stored, 2, "store_entities returns the input count, even when rows collapse");
    assert_eq!(harness.cache.entity_count("spells").await.unwrap(), 1);
}

#[tokio::test]
async fn empty_documents_filter_short_circuits_to_an_empty_result() {
    let harness = TestHarness::new().await;
    harness.cache.store_entities("spells", vec![fireball()]).await.unwrap();

    let filters = Filters::new().document(Vec::<String>::new());
    let results = harness.cache.get_entities("spells", &filters).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn get_entities_never_returns_an_embedding_field() {
    let harness = TestHarness::new().await;
    harness.cache.store_entities("spells", vec![fireball()]).await.unwrap();

    let results = harness.cache.get_entities("spells", &Filters::new()).await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].field("embedding").is_none());
}

#[tokio::test]
async fn equipment_search_with_item_type_only_fetches_its_one_collection() {
    let harness = TestHarness::new().await;
    harness.client.seed(
        "weapons",
        vec![entity(&[
            ("slug", json!("longsword")),
            ("name", json!("Longsword")),
            ("document", json!("srd")),
            ("category", json!("martial")),
        ])],
    );

    let results = harness
        .repositories
        .equipment()
        .search(lorekeeper::repository::EquipmentQuery {
            item_type: Some("weapon".to_string()),
            ..lorekeeper::repository::EquipmentQuery::new()
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "longsword");
    assert_eq!(harness.client.call_count("weapons"), 1);
    assert_eq!(harness.client.call_count("armor"), 0);
    assert_eq!(harness.client.call_count("magicitems"), 0);
}

#[tokio::test]
async fn equipment_search_with_no_item_type_fans_out_across_all_three_collections() {
    let harness = TestHarness::new().await;
    harness.client.seed(
        "weapons",
        vec![entity(&[
            ("slug", json!("longsword")),
            ("name", json!("Longsword")),
            ("document", json!("srd")),
        ])],
    );
    harness.client.seed(
        "armor",
        vec![entity(&[
            ("slug", json!("chain-mail")),
            ("name", json!("Chain Mail")),
            ("document", json!("srd")),
        ])],
    );

    let results = harness
        .repositories
        .equipment()
        .search(lorekeeper::repository::EquipmentQuery::new())
        .await
        .unwrap();

    let slugs: std::collections::HashSet<_> = results.iter().map(|e| e.slug.clone()).collect();
    assert!(slugs.contains("longsword"));
    assert!(slugs.contains("chain-mail"));
    assert_eq!(harness.client.call_count("weapons"), 1);
    assert_eq!(harness.client.call_count("armor"), 1);
    assert_eq!(harness.client.call_count("magicitems"), 1);
}

#[tokio::test]
async fn creature_cr_range_filter_is_respected_on_cache_hit() {
    let harness = TestHarness::new().await;
    harness
        .cache
        .store_entities(
            "creatures",
            vec![
                entity(&[
                    ("slug", json!("goblin")),
                    ("name", json!("Goblin")),
                    ("document", json!("srd")),
                    ("challenge_rating", json!(0.25)),
                ]),
                entity(&[
                    ("slug", json!("adult-red-dragon")),
                    ("name", json!("Adult Red Dragon")),
                    ("document", json!("srd")),
                    ("challenge_rating", json!(17.0)),
                ]),
            ],
        )
        .await
        .unwrap();

    let results = harness
        .repositories
        .creatures()
        .search(lorekeeper::repository::CreatureQuery {
            cr_min: Some(10.0),
            ..lorekeeper::repository::CreatureQuery::new()
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].slug, "adult-red-dragon");
}
