//! The embedded cache engine: per-entity-type collections, primary-key
//! upsert, and (for the vector backend) cosine-similarity semantic search.
//!
//! Two backends implement `CacheProtocol`: `VectorCache` (default) stores an
//! embedding alongside every entity and supports `semantic_search`;
//! `StructuredCache` skips embeddings entirely and raises
//! `LoreError::NotSupported` from `semantic_search`, never an empty result
//! set, so callers can tell "no backend support" apart from "no matches".

pub mod db;
pub mod factory;
pub mod filter;
pub mod identifier;
pub mod structured;
pub mod vector;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::Entity;
use filter::Filters;

pub use factory::open_cache;
pub use structured::StructuredCache;
pub use vector::VectorCache;

/// Per-collection and total entity counts, plus the on-disk path backing
/// the store (useful for `cli`/`mcp` diagnostics).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub collections: HashMap<String, usize>,
    pub total: usize,
    pub db_path: String,
}

/// The cache engine's contract. Every method is keyed by `entity_type`
/// (the collection name, e.g. `"spells"`); unknown entity types get an
/// empty, auto-created collection rather than an error (§3.2).
#[async_trait]
pub trait CacheProtocol: Send + Sync {
    /// Structured lookup: apply `filters` and return every matching entity.
    /// Vectors are never included in the result (vector omission invariant).
    async fn get_entities(&self, entity_type: &str, filters: &Filters) -> Result<Vec<Entity>>;

    /// Upsert `entities` into `entity_type`'s collection, keyed by `slug`.
    /// Returns the number of entities written. Re-storing the same slug
    /// replaces the prior record rather than duplicating it.
    async fn store_entities(&self, entity_type: &str, entities: Vec<Entity>) -> Result<usize>;

    /// Rank entities by similarity to `query`, applying `filters` first.
    /// An empty/whitespace-only `query` behaves exactly like `get_entities`.
    /// Backends that don't support this raise `LoreError::NotSupported`.
    async fn semantic_search(
        &self,
        entity_type: &str,
        query: &str,
        limit: usize,
        filters: &Filters,
    ) -> Result<Vec<Entity>>;

    /// Number of entities currently stored for `entity_type`.
    async fn entity_count(&self, entity_type: &str) -> Result<usize>;

    /// Distinct `document` values seen across every collection.
    async fn available_documents(&self) -> Result<Vec<String>>;

    /// Per-collection entity counts restricted to a single `document`.
    async fn document_metadata(&self, document: &str) -> Result<HashMap<String, usize>>;

    /// Aggregate stats across every known collection.
    async fn cache_stats(&self) -> Result<CacheStats>;

    /// Release the engine. Idempotent; safe to call more than once. The
    /// embedded RocksDB store is actually released when the last handle to
    /// it drops, so this is a documented no-op marker rather than an actual
    /// teardown — callers that want a guaranteed-release scope should drop
    /// their `Arc<dyn CacheProtocol>` instead of relying on this alone.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
