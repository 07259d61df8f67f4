//! Upstream catalog client (§6.1): a single capability repositories fetch
//! from on a cache miss. Out of core scope per §1 — only the interface and
//! the parameter-mapping tables that feed it matter here.
//!
//! The teacher's duck-typed `get_<type>(**filters)` surface collapses to one
//! `fetch(entity_type, filters)` dispatch (§9 redesign: capability interface,
//! not per-domain methods), with the per-domain mapping tables living next
//! to each repository instead.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Entity;

pub use http::HttpUpstreamClient;

/// Query parameters sent to the upstream catalog, already mapped from a
/// repository's domain filters to the upstream's wire names (e.g. spell's
/// `class_key` -> `class`).
#[derive(Debug, Clone, Default)]
pub struct ApiFilters(pub Vec<(String, String)>);

impl ApiFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The upstream catalog's capability: fetch every entity of one type
/// matching a set of already-mapped API filters. One implementation
/// (`HttpUpstreamClient`) talks to a real paginated JSON API; tests
/// substitute a fixture-backed implementation (see `tests/common`).
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, entity_type: &str, filters: &ApiFilters) -> Result<Vec<Entity>>;
}
