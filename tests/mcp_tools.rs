//! MCP tool facade tests: every tool is a thin wrapper delegating straight to
//! the repository layer, so these mostly check parameter wiring and the
//! "missing entity is empty, not an error" contract rather than search
//! semantics (covered in `repository_cache_aside.rs`/`semantic_fallback.rs`).

mod common;

use common::{entity, TestHarness};
use lorekeeper::mcp::types::{LookupInput, SpellSearchInput};
use lorekeeper::mcp::LoreKeeperServer;
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;

#[tokio::test]
async fn lookup_spell_finds_by_slug_case_insensitively() {
    let harness = TestHarness::new().await;
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

    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server
        .lookup_spell(Parameters(LookupInput {
            slug: "FIREBALL".to_string(),
        }))
        .await
        .unwrap()
        .0;

    assert_eq!(response.count, 1);
}

#[tokio::test]
async fn lookup_spell_missing_slug_returns_empty_not_error() {
    let harness = TestHarness::new().await;
    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server
        .lookup_spell(Parameters(LookupInput {
            slug: "no-such-spell".to_string(),
        }))
        .await
        .unwrap()
        .0;
    assert_eq!(response.count, 0);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn search_spells_with_an_oversized_limit_does_not_error() {
    let harness = TestHarness::new().await;
    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server
        .search_spells(Parameters(SpellSearchInput {
            query: None,
            document: None,
            level: None,
            school: None,
            concentration: None,
            ritual: None,
            class_key: None,
            limit: Some(10_000),
        }))
        .await
        .unwrap()
        .0;
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn search_spells_structured_filter_routes_through_repository() {
    let harness = TestHarness::new().await;
    harness
        .cache
        .store_entities(
            "spells",
            vec![
                entity(&[
                    ("slug", json!("fireball")),
                    ("name", json!("Fireball")),
                    ("document", json!("srd")),
                    ("level", json!(3)),
                ]),
                entity(&[
                    ("slug", json!("magic-missile")),
                    ("name", json!("Magic Missile")),
                    ("document", json!("srd")),
                    ("level", json!(1)),
                ]),
            ],
        )
        .await
        .unwrap();

    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server
        .search_spells(Parameters(SpellSearchInput {
            query: None,
            document: None,
            level: Some(3),
            school: None,
            concentration: None,
            ritual: None,
            class_key: None,
            limit: None,
        }))
        .await
        .unwrap()
        .0;

    assert_eq!(response.count, 1);
}

#[tokio::test]
async fn cache_status_reports_zero_before_anything_is_stored() {
    let harness = TestHarness::new().await;
    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server.cache_status().await.unwrap().0;
    assert_eq!(response.total, 0);
    assert!(response.collections.is_empty());
}

#[tokio::test]
async fn list_documents_reflects_stored_entities() {
    let harness = TestHarness::new().await;
    harness
        .cache
        .store_entities(
            "spells",
            vec![entity(&[
                ("slug", json!("fireball")),
                ("name", json!("Fireball")),
                ("document", json!("srd")),
            ])],
        )
        .await
        .unwrap();

    let server = LoreKeeperServer::new(harness.repositories.clone());
    let response = server.list_documents().await.unwrap().0;
    assert_eq!(response.documents, vec!["srd".to_string()]);
}
