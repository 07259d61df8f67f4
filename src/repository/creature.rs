//! Creature repository: cache-aside lookups over the `creatures` collection.
//!
//! `challenge_rating` is indexed as a float (§11 Open Question decision),
//! so `cr_min`/`cr_max` compile to `>=`/`<=` SQL predicates at the cache
//! layer instead of a client-side post-filter.

use std::sync::Arc;

use crate::cache::filter::Filters;
use crate::cache::CacheProtocol;
use crate::client::{ApiFilters, UpstreamClient};
use crate::error::{LoreError, Result};
use crate::models::Entity;

use super::DEFAULT_LIMIT;

const COLLECTION: &str = "creatures";

#[derive(Debug, Clone, Default)]
pub struct CreatureQuery {
    pub document: Option<Vec<String>>,
    pub creature_type: Option<String>,
    pub size: Option<String>,
    pub name: Option<String>,
    pub cr_min: Option<f64>,
    pub cr_max: Option<f64>,
    pub semantic_query: Option<String>,
    pub limit: usize,
}

impl CreatureQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

pub struct CreatureRepository {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl CreatureRepository {
    pub fn new(client: Arc<dyn UpstreamClient>, cache: Arc<dyn CacheProtocol>) -> Self {
        Self { client, cache }
    }

    pub async fn get_all(&self) -> Result<Vec<Entity>> {
        let cached = self.cache.get_entities(COLLECTION, &Filters::new()).await?;
        if !cached.is_empty() {
            return Ok(cached);
        }
        self.fetch_and_cache(&ApiFilters::new()).await
    }

    pub async fn search(&self, query: CreatureQuery) -> Result<Vec<Entity>> {
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
            return Ok(truncate(results, limit));
        }

        let cached = self.cache.get_entities(COLLECTION, &cache_filters).await?;
        if !cached.is_empty() {
            return Ok(truncate(cached, limit));
        }

        let fetched = self.fetch_and_cache(&api_filters(&query)).await?;
        Ok(truncate(fetched, limit))
    }

    async fn fetch_and_cache(&self, filters: &ApiFilters) -> Result<Vec<Entity>> {
        let fetched = self.client.fetch(COLLECTION, filters).await?;
        if !fetched.is_empty() {
            if let Err(e) = self.cache.store_entities(COLLECTION, fetched.clone()).await {
                tracing::warn!("failed to cache fetched creatures: {e}");
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

fn truncate(mut entities: Vec<Entity>, limit: usize) -> Vec<Entity> {
    entities.truncate(limit);
    entities
}

/// Only `{challenge_rating, name, size, slug, source_api, type, document}`
/// are cache-indexed for creatures (§4.1 schema); every other would-be
/// filter is rejected here rather than silently falling through to an
/// unbounded client-side scan.
fn cache_filters(query: &CreatureQuery) -> Filters {
    let mut filters = Filters::new();
    if let Some(docs) = &query.document {
        filters = filters.document(docs.clone());
    }
    if let Some(creature_type) = &query.creature_type {
        filters = filters.eq_str("type", creature_type.clone());
    }
    if let Some(size) = &query.size {
        filters = filters.eq_str("size", size.clone());
    }
    if let Some(cr_min) = query.cr_min {
        filters = filters.ge("challenge_rating", cr_min);
    }
    if let Some(cr_max) = query.cr_max {
        filters = filters.le("challenge_rating", cr_max);
    }
    filters
}

/// API-parameter mapping: `creature_type -> type`, `size -> size`, `name ->
/// name`, `cr_min -> challenge_rating_decimal__gte`, `cr_max ->
/// challenge_rating_decimal__lte` (the upstream catalog's documented range
/// convention for decimal CR fields).
fn api_filters(query: &CreatureQuery) -> ApiFilters {
    let mut api = ApiFilters::new();
    if let Some(creature_type) = &query.creature_type {
        api = api.set("type", creature_type.clone());
    }
    if let Some(size) = &query.size {
        api = api.set("size", size.clone());
    }
    if let Some(name) = &query.name {
        api = api.set("name", name.clone());
    }
    if let Some(cr_min) = query.cr_min {
        api = api.set("challenge_rating_decimal__gte", cr_min.to_string());
    }
    if let Some(cr_max) = query.cr_max {
        api = api.set("challenge_rating_decimal__lte", cr_max.to_string());
    }
    api
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cr_range_compiles_into_both_filters_bounds() {
        let query = CreatureQuery {
            cr_min: Some(5.0),
            cr_max: Some(10.0),
            ..CreatureQuery::new()
        };
        let filters = cache_filters(&query);
        assert_eq!(filters.ranges.len(), 2);
    }

    #[test]
    fn api_filters_use_decimal_range_convention() {
        let query = CreatureQuery {
            cr_min: Some(2.0),
            ..CreatureQuery::new()
        };
        let api = api_filters(&query);
        assert!(api
            .0
            .iter()
            .any(|(k, v)| k == "challenge_rating_decimal__gte" && v == "2"));
    }
}
