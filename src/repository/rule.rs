//! Rule repository: multiplexes over `{rules, conditions, damagetypes,
//! weapon_properties, skills, ability_scores, magic_schools, languages,
//! proficiencies, alignments}` selected by `rule_type`. The `rules`
//! collection alone supports an additional `section` filter.

use std::sync::Arc;

use crate::cache::filter::Filters;
use crate::cache::CacheProtocol;
use crate::client::{ApiFilters, UpstreamClient};
use crate::error::{LoreError, Result};
use crate::models::Entity;

use super::DEFAULT_LIMIT;

const COLLECTIONS: &[&str] = &[
    "rules",
    "conditions",
    "damagetypes",
    "weapon_properties",
    "skills",
    "ability_scores",
    "magic_schools",
    "languages",
    "proficiencies",
    "alignments",
];

#[derive(Debug, Clone, Default)]
pub struct RuleQuery {
    pub rule_type: Option<String>,
    pub document: Option<Vec<String>>,
    /// Only honored when `rule_type` selects `"rules"`.
    pub section: Option<String>,
    pub name: Option<String>,
    pub semantic_query: Option<String>,
    pub limit: usize,
}

impl RuleQuery {
    pub fn new() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

pub struct RuleRepository {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl RuleRepository {
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

    pub async fn search(&self, query: RuleQuery) -> Result<Vec<Entity>> {
        let limit = effective_limit(query.limit);
        let collections = target_collections(query.rule_type.as_deref());
        let cache_filters = cache_filters(&query, &collections);

        if let Some(semantic_query) = non_empty(&query.semantic_query) {
            let mut results = Vec::new();
            for collection in &collections {
                let filters = cache_filters_for(collection, &cache_filters);
                let found = match self
                    .cache
                    .semantic_search(collection, semantic_query, limit, &filters)
                    .await
                {
                    Ok(found) => found,
                    Err(LoreError::NotSupported(_)) => {
                        let fallback = filters.clone().eq_str("name", semantic_query);
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
            let filters = cache_filters_for(collection, &cache_filters);
            let cached = self.cache.get_entities(collection, &filters).await?;
            if !cached.is_empty() {
                results.extend(cached);
                continue;
            }
            results.extend(
                self.fetch_and_cache(collection, &api_filters(&query, collection))
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

fn target_collections(rule_type: Option<&str>) -> Vec<&'static str> {
    match rule_type {
        None => COLLECTIONS.to_vec(),
        Some(t) if t.eq_ignore_ascii_case("all") => COLLECTIONS.to_vec(),
        Some(t) => COLLECTIONS
            .iter()
            .copied()
            .filter(|c| c.eq_ignore_ascii_case(t))
            .collect(),
    }
}

fn cache_filters(query: &RuleQuery, _collections: &[&str]) -> Filters {
    let mut filters = Filters::new();
    if let Some(docs) = &query.document {
        filters = filters.document(docs.clone());
    }
    if let Some(section) = &query.section {
        filters = filters.eq_str("section", section.clone());
    }
    filters
}

/// `section` is only a valid indexed field on `rules`; drop it for every
/// other collection rather than letting it silently no-op as a client-side
/// filter on fields those collections don't have.
fn cache_filters_for(collection: &str, base: &Filters) -> Filters {
    if collection == "rules" {
        return base.clone();
    }
    let mut filters = Filters::new();
    filters.document = base.document.clone();
    filters
}

fn api_filters(query: &RuleQuery, collection: &str) -> ApiFilters {
    let mut api = ApiFilters::new();
    if let Some(name) = &query.name {
        api = api.set("name", name.clone());
    }
    if collection == "rules" {
        if let Some(section) = &query.section {
            api = api.set("section", section.clone());
        }
    }
    api
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rule_type_fans_out_across_all_collections() {
        assert_eq!(target_collections(None).len(), COLLECTIONS.len());
    }

    #[test]
    fn specific_rule_type_selects_one_collection() {
        assert_eq!(target_collections(Some("skills")), vec!["skills"]);
    }

    #[test]
    fn section_filter_dropped_outside_rules_collection() {
        let base = Filters::new().eq_str("section", "combat");
        let filtered = cache_filters_for("skills", &base);
        assert!(filtered.fields.is_empty());
        let kept = cache_filters_for("rules", &base);
        assert_eq!(kept.fields.len(), 1);
    }
}
