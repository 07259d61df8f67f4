//! Equipment repository: multiplexes over `{weapons, armor, magicitems}`
//! selected by `item_type`. With no `item_type` (or `"all"`), a semantic
//! search fans out across all three and the results are concatenated.

use std::sync::Arc;

use crate::cache::filter::Filters;
use crate::cache::CacheProtocol;
use crate::client::{ApiFilters, UpstreamClient};
use crate::error::{LoreError, Result};
use crate::models::Entity;

use super::DEFAULT_LIMIT;

const COLLECTIONS: &[&str] = &["weapons", "armor", "magicitems"];

#[derive(Debug, Clone, Default)]
pub struct EquipmentQuery {
    pub item_type: Option<String>,
    pub document: Option<Vec<String>>,
    pub category: Option<String>,
    pub rarity: Option<String>,
    pub damage_type: Option<String>,
    pub requires_attunement: Option<bool>,
    pub name: Option<String>,
    pub semantic_query: Option<String>,
    pub limit: usize,
}

impl EquipmentQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

pub struct EquipmentRepository {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl EquipmentRepository {
    pub fn new(client: Arc<dyn UpstreamClient>, cache: Arc<dyn CacheProtocol>) -> Self {
        Self { client, cache }
    }

    pub async fn get_all(&self) -> Result<Vec<Entity>> {
        let mut all = Vec::new();
        for collection in COLLECTIONS {
            all.extend(self.get_all_in(collection).await?);
        }
        Ok(all)
    }

    async fn get_all_in(&self, collection: &str) -> Result<Vec<Entity>> {
        let cached = self.cache.get_entities(collection, &Filters::new()).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.fetch_and_cache(collection, &ApiFilters::new()).await
    }

    pub async fn search(&self, query: EquipmentQuery) -> Result<Vec<Entity>> {
        let limit = effective_limit(query.limit);
        let collections = target_collections(query.item_type.as_deref());
        let cache_filters = cache_filters(&query);

        if let Some(semantic_query) = non_empty(&query.semantic_query) {
            let mut results = Vec::new();
            for collection in &collections {
                let found = match self
                    .cache
                    .semantic_search(collection, semantic_query, limit, &cache_filters)
                    .await
                {
                    Ok(found) => found,
                    Err(LoreError::NotSupported(_)) => {
                        let fallback = cache_filters.clone().eq_str("name", semantic_query);
                        self.cache.get_entities(collection, &fallback).await?
                    }
                    Err(e) => return Err(e),
                };
                results.extend(found);
            }
            results.truncate(limit);
            return Ok(results);
        }

        let mut results = Vec::new();
        for collection in &collections {
            let cached = self.cache.get_entities(collection, &cache_filters).await?;
            if !cached.is_empty() {
                results.extend(cached);
                continue;
            }
            results.extend(
                self.fetch_and_cache(collection, &api_filters(&query))
                    .await?,
            );
        }
        results.truncate(limit);
        Ok(results)
    }

    async fn fetch_and_cache(&self, collection: &str, filters: &ApiFilters) -> Result<Vec<Entity>> {
        let fetched = self.client.fetch(collection, filters).await?;
        if !fetched.is_empty() {
            if let Err(e) = self.cache.store_entities(collection, fetched.clone()).await {
                tracing::warn!("failed to cache fetched {collection}: {e}");
            }
        }
        Ok(fetched)
    }
}

fn effective_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|q| !q.is_empty())
}

fn target_collections(item_type: Option<&str>) -> Vec<&'static str> {
    match item_type {
        None => COLLECTIONS.to_vec(),
        Some(t) if t.eq_ignore_ascii_case("all") => COLLECTIONS.to_vec(),
        Some(t) => COLLECTIONS
            .iter()
            .copied()
            .filter(|c| c.eq_ignore_ascii_case(singular_to_collection(t)))
            .collect(),
    }
}

/// Accepts both the collection name and the singular item-type spelling
/// (`weapon` -> `weapons`), matching how callers naturally phrase `item_type`.
fn singular_to_collection(item_type: &str) -> &str {
    match item_type {
        "weapon" => "weapons",
        "armor" | "armour" => "armor",
        "magicitem" | "magic_item" => "magicitems",
        other => other,
    }
}

fn cache_filters(query: &EquipmentQuery) -> Filters {
    let mut filters = Filters::new();
    if let Some(docs) = &query.document {
        filters = filters.document(docs.clone());
    }
    if let Some(category) = &query.category {
        filters = filters.eq_str("category", category.clone());
    }
    if let Some(rarity) = &query.rarity {
        filters = filters.eq_str("rarity", rarity.clone());
    }
    if let Some(damage_type) = &query.damage_type {
        filters = filters.eq_str("damage_type", damage_type.clone());
    }
    if let Some(requires_attunement) = query.requires_attunement {
        filters = filters.eq_bool("requires_attunement", requires_attunement);
    }
    filters
}

fn api_filters(query: &EquipmentQuery) -> ApiFilters {
    let mut api = ApiFilters::new();
    if let Some(category) = &query.category {
        api = api.set("category", category.clone());
    }
    if let Some(rarity) = &query.rarity {
        api = api.set("rarity", rarity.clone());
    }
    if let Some(damage_type) = &query.damage_type {
        api = api.set("damage_type", damage_type.clone());
    }
    if let Some(requires_attunement) = query.requires_attunement {
        api = api.set("requires_attunement", requires_attunement.to_string());
    }
    if let Some(name) = &query.name {
        api = api.set("name", name.clone());
    }
    api
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_item_type_targets_all_three_collections() {
        assert_eq!(target_collections(None).len(), 3);
        assert_eq!(target_collections(Some("all")).len(), 3);
    }

    #[test]
    fn singular_item_type_resolves_to_one_collection() {
        assert_eq!(target_collections(Some("weapon")), vec!["weapons"]);
        assert_eq!(target_collections(Some("armor")), vec!["armor"]);
    }
}
