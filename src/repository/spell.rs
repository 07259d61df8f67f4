//! Spell repository: cache-aside lookups over the `spells` collection.
//!
//! Cache-indexed fields: `{document, level, school, concentration, ritual}`.
//! `class_key` is a client-side post-filter over each spell's `classes`
//! array, which the cache doesn't index (§4.4).

use std::sync::Arc;

use crate::cache::filter::Filters;
use crate::cache::CacheProtocol;
use crate::client::{ApiFilters, UpstreamClient};
use crate::error::{LoreError, Result};
use crate::models::Entity;

use super::DEFAULT_LIMIT;

const COLLECTION: &str = "spells";

/// Parameters accepted by [`SpellRepository::search`] (§9: a typed `Filters`
/// struct per domain rather than keyword-variadic filters).
#[derive(Debug, Clone, Default)]
pub struct SpellQuery {
    pub document: Option<Vec<String>>,
    pub level: Option<i64>,
    pub school: Option<String>,
    pub concentration: Option<bool>,
    pub ritual: Option<bool>,
    pub casting_time: Option<String>,
    pub damage_type: Option<String>,
    pub name: Option<String>,
    /// Matched case-insensitively against each spell's `classes` list;
    /// applied client-side after the cache/upstream call.
    pub class_key: Option<String>,
    pub semantic_query: Option<String>,
    pub limit: usize,
}

impl SpellQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

pub struct SpellRepository {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl SpellRepository {
    pub fn new(client: Arc<dyn UpstreamClient>, cache: Arc<dyn CacheProtocol>) -> Self {
        Self { client, cache }
    }

    /// Every cached spell; on an empty cache, fetches and stores the full
    /// upstream listing (§4.4: `get_all`).
    pub async fn get_all(&self) -> Result<Vec<Entity>> {
        let cached = self.cache.get_entities(COLLECTION, &Filters::new()).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.fetch_and_cache(&ApiFilters::new()).await
    }

    pub async fn search(&self, query: SpellQuery) -> Result<Vec<Entity>> {
        let limit = effective_limit(query.limit);
        let cache_filters = cache_filters(&query);

        if let Some(semantic_query) = non_empty(&query.semantic_query) {
            let results = match self
                .cache
                .semantic_search(COLLECTION, semantic_query, limit, &cache_filters)
                .await
            {
                Ok(results) => results,
                Err(LoreError::NotSupported(_)) => {
                    let fallback = cache_filters.clone().eq_str("name", semantic_query);
                    self.cache.get_entities(COLLECTION, &fallback).await?
                }
                Err(e) => return Err(e),
            };
            return Ok(finish(results, query.class_key.as_deref(), limit));
        }

        let cached = self.cache.get_entities(COLLECTION, &cache_filters).await?;
        if !cached.is_empty() {
            return Ok(finish(cached, query.class_key.as_deref(), limit));
        }

        let fetched = self.fetch_and_cache(&api_filters(&query)).await?;
        Ok(finish(fetched, query.class_key.as_deref(), limit))
    }

    async fn fetch_and_cache(&self, filters: &ApiFilters) -> Result<Vec<Entity>> {
        let fetched = self.client.fetch(COLLECTION, filters).await?;
        if !fetched.is_empty() {
            if let Err(e) = self.cache.store_entities(COLLECTION, fetched.clone()).await {
                tracing::warn!("failed to cache fetched spells: {e}");
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

fn cache_filters(query: &SpellQuery) -> Filters {
    let mut filters = Filters::new();
    if let Some(docs) = &query.document {
        filters = filters.document(docs.clone());
    }
    if let Some(level) = query.level {
        filters = filters.eq_int("level", level);
    }
    if let Some(school) = &query.school {
        filters = filters.eq_str("school", school.clone());
    }
    if let Some(concentration) = query.concentration {
        filters = filters.eq_bool("concentration", concentration);
    }
    if let Some(ritual) = query.ritual {
        filters = filters.eq_bool("ritual", ritual);
    }
    filters
}

/// API-parameter mapping (§6.1): `level -> level`, `school -> school`,
/// `class_key -> class`, `concentration -> concentration`, `ritual ->
/// ritual`, `casting_time -> casting_time`, `damage_type -> damage_type`,
/// `name -> name`. `document` is never sent upstream — always a post-filter.
fn api_filters(query: &SpellQuery) -> ApiFilters {
    let mut api = ApiFilters::new();
    if let Some(level) = query.level {
        api = api.set("level", level.to_string());
    }
    if let Some(school) = &query.school {
        api = api.set("school", school.clone());
    }
    if let Some(class_key) = &query.class_key {
        api = api.set("class", class_key.clone());
    }
    if let Some(concentration) = query.concentration {
        api = api.set("concentration", concentration.to_string());
    }
    if let Some(ritual) = query.ritual {
        api = api.set("ritual", ritual.to_string());
    }
    if let Some(casting_time) = &query.casting_time {
        api = api.set("casting_time", casting_time.clone());
    }
    if let Some(damage_type) = &query.damage_type {
        api = api.set("damage_type", damage_type.clone());
    }
    if let Some(name) = &query.name {
        api = api.set("name", name.clone());
    }
    api
}

fn apply_class_filter(entities: Vec<Entity>, class_key: Option<&str>) -> Vec<Entity> {
    let Some(class_key) = class_key else {
        return entities;
    };
    entities
        .into_iter()
        .filter(|e| {
            e.field("classes")
                .and_then(|v| v.as_array())
                .map(|classes| {
                    classes.iter().any(|c| {
                        let name = c.as_str().or_else(|| c.get("name").and_then(|n| n.as_str()));
                        name.map(|s| s.eq_ignore_ascii_case(class_key)).unwrap_or(false)
                    })
                })
                .unwrap_or(false)
        })
        .collect()
}

fn finish(entities: Vec<Entity>, class_key: Option<&str>, limit: usize) -> Vec<Entity> {
    let mut results = apply_class_filter(entities, class_key);
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn spell(slug: &str, classes: Vec<&str>) -> Entity {
        let mut obj = Map::new();
        obj.insert("slug".into(), json!(slug));
        obj.insert("name".into(), json!(slug));
        obj.insert(
            "classes".into(),
            json!(classes.into_iter().map(|c| json!({"name": c})).collect::<Vec<_>>()),
        );
        Entity::from_json(obj)
    }

    #[test]
    fn class_filter_matches_case_insensitively() {
        let entities = vec![spell("fireball", vec!["Wizard", "Sorcerer"]), spell("cure-wounds", vec!["Cleric"])];
        let filtered = apply_class_filter(entities, Some("wizard"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].slug, "fireball");
    }

    #[test]
    fn no_class_filter_returns_everything() {
        let entities = vec![spell("fireball", vec!["Wizard"])];
        assert_eq!(apply_class_filter(entities, None).len(), 1);
    }

    #[test]
    fn zero_limit_falls_back_to_default() {
        assert_eq!(effective_limit(0), DEFAULT_LIMIT);
        assert_eq!(effective_limit(5), 5);
    }
}
