//! Fixture-backed `UpstreamClient` for tests: returns pre-seeded entities per
//! collection and records every call so tests can assert on fetch counts and
//! the parameters the repository layer mapped upstream.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use lorekeeper::client::{ApiFilters, UpstreamClient};
use lorekeeper::error::Result;
use lorekeeper::models::Entity;

#[derive(Default)]
pub struct MockUpstreamClient {
    fixtures: Mutex<HashMap<String, Vec<Entity>>>,
    calls: Mutex<Vec<(String, ApiFilters)>>,
}

impl MockUpstreamClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, entity_type: &str, entities: Vec<Entity>) {
        self.fixtures
            .lock()
            .unwrap()
            .insert(entity_type.to_string(), entities);
    }

    pub fn call_count(&self, entity_type: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == entity_type)
            .count()
    }

    pub fn last_filters(&self, entity_type: &str) -> Option<ApiFilters> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| t == entity_type)
            .map(|(_, f)| f.clone())
    }
}

#[async_trait]
impl UpstreamClient for MockUpstreamClient {
    async fn fetch(&self, entity_type: &str, filters: &ApiFilters) -> Result<Vec<Entity>> {
        self.calls
            .lock()
            .unwrap()
            .push((entity_type.to_string(), filters.clone()));
        Ok(self
            .fixtures
            .lock()
            .unwrap()
            .get(entity_type)
            .cloned()
            .unwrap_or_default())
    }
}

/// Build an `Entity` from a list of field/value pairs, the way a fixture
/// loaded from an upstream response would arrive.
pub fn entity(fields: &[(&str, Value)]) -> Entity {
    let mut obj = Map::new();
    for (key, value) in fields {
        obj.insert(key.to_string(), value.clone());
    }
    Entity::from_json(obj)
}
