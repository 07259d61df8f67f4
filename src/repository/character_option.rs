//! Character option repository: multiplexes over `{classes, races,
//! backgrounds, feats, conditions}` selected by `option_type`. With no
//! `option_type`, a semantic search fans out across all five.

use std::sync::Arc;

use crate::cache::filter::Filters;
use crate::cache::CacheProtocol;
use crate::client::{ApiFilters, UpstreamClient};
use crate::error::{LoreError, Result};
use crate::models::Entity;

use super::DEFAULT_LIMIT;

const COLLECTIONS: &[&str] = &["classes", "races", "backgrounds", "feats", "conditions"];

#[derive(Debug, Clone, Default)]
pub struct CharacterOptionQuery {
    pub option_type: Option<String>,
    pub document: Option<Vec<String>>,
    pub name: Option<String>,
    pub semantic_query: Option<String>,
    pub limit: usize,
}

impl CharacterOptionQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

pub struct CharacterOptionRepository {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl CharacterOptionRepository {
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

    pub async fn search(&self, query: CharacterOptionQuery) -> Result<Vec<Entity>> {
        let limit = effective_limit(query.limit);
        let collections = target_collections(query.option_type.as_deref());
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

fn target_collections(option_type: Option<&str>) -> Vec<&'static str> {
    match option_type {
        None => COLLECTIONS.to_vec(),
        Some(t) if t.eq_ignore_ascii_case("all") => COLLECTIONS.to_vec(),
        Some(t) => COLLECTIONS
            .iter()
            .copied()
            .filter(|c| c.eq_ignore_ascii_case(singular_to_collection(t)))
            .collect(),
    }
}

fn singular_to_collection(option_type: &str) -> &str {
    match option_type {
        "class" => "classes",
        "race" => "races",
        "background" => "backgrounds",
        "feat" => "feats",
        "condition" => "conditions",
        other => other,
    }
}

fn cache_filters(query: &CharacterOptionQuery) -> Filters {
    let mut filters = Filters::new();
    if let Some(docs) = &query.document {
        filters = filters.document(docs.clone());
    }
    filters
}

fn api_filters(query: &CharacterOptionQuery) -> ApiFilters {
    let mut api = ApiFilters::new();
    if let Some(name) = &query.name {
        api = api.set("name", name.clone());
    }
    api
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_option_type_fans_out_across_all_five() {
        assert_eq!(target_collections(None).len(), 5);
    }

    #[test]
    fn singular_option_type_resolves_to_one_collection() {
        assert_eq!(target_collections(Some("class")), vec!["classes"]);
        assert_eq!(target_collections(Some("feat")), vec!["feats"]);
    }
}
