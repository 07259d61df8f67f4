//! Structured-only cache backend. Stores entities without embeddings and
//! without a `semantic_search` implementation — callers that need ranked
//! results against this backend get `LoreError::NotSupported`, never a
//! silently empty list, so "no backend support" stays distinguishable from
//! "zero matches" (§3.1).

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::db::LoreDb;
use super::filter::{self, Filters};
use super::identifier::validate_table;
use super::{CacheProtocol, CacheStats};
use crate::error::{LoreError, Result};
use crate::models::{schema_for, Entity};

pub struct StructuredCache {
    db: LoreDb,
    db_path: PathBuf,
}

impl StructuredCache {
    pub fn new(db: LoreDb, db_path: PathBuf) -> Self {
        Self { db, db_path }
    }

    async fn ensure_collection(&self, entity_type: &str) -> Result<()> {
        let table = validate_table(entity_type)?;
        let schema = schema_for(table);
        self.db
            .query(format!(
                "DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;
                 DEFINE FIELD IF NOT EXISTS slug ON {table} TYPE string;
                 DEFINE INDEX IF NOT EXISTS {table}_slug_idx ON {table} FIELDS slug UNIQUE;"
            ))
            .await?;
        for field in schema.indexed_fields {
            self.db
                .query(format!(
                    "DEFINE FIELD IF NOT EXISTS {name} ON {table} TYPE option<any>;
                     DEFINE INDEX IF NOT EXISTS {table}_{name}_idx ON {table} FIELDS {name};",
                    name = field.name,
                ))
                .await?;
        }
        Ok(())
    }

    async fn known_tables(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct InfoForDb {
            tables: Map<String, Value>,
        }
        let mut response = self.db.query("INFO FOR DB").await?;
        let info: Option<InfoForDb> = response.take(0)?;
        Ok(info
            .map(|i| i.tables.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CacheProtocol for StructuredCache {
    async fn get_entities(&self, entity_type: &str, filters: &Filters) -> Result<Vec<Entity>> {
        if let Some(docs) = &filters.document {
            if docs.is_empty() {
                return Ok(Vec::new());
            }
        }
        let table = validate_table(entity_type)?;
        self.ensure_collection(table).await?;
        let schema = schema_for(table);
        let compiled = filter::compile(&schema, filters);

        let query_str = format!("SELECT * FROM {table} {}", compiled.where_clause);
        let mut builder = self.db.query(query_str);
        for (key, value) in compiled.bindings {
            builder = builder.bind((key, value));
        }
        let mut response = builder.await?;
        let rows: Vec<Map<String, Value>> = response.take(0)?;

        Ok(rows
            .into_iter()
            .map(Entity::from_json)
            .filter(|e| filter::matches_client_side(e, &compiled.client_side, &compiled.client_side_ranges))
            .collect())
    }

    async fn store_entities(&self, entity_type: &str, entities: Vec<Entity>) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        let table = validate_table(entity_type)?;
        self.ensure_collection(table).await?;

        let mut stored = 0usize;
        for entity in entities {
            if entity.slug.is_empty() {
                // Missing slug -> stored under the empty-string slug (§4.2,
                // §8 boundary behavior); every such entity in the batch
                // collapses onto the same row, which is the caller's
                // responsibility to avoid.
                tracing::warn!("storing entity with empty slug under '' in '{table}'");
            }
            let mut content = entity.data.clone();
            content.insert("slug".into(), Value::String(entity.slug.clone()));
            content.insert("name".into(), Value::String(entity.name.clone()));
            content.insert("document".into(), Value::String(entity.document.clone()));
            content.insert(
                "source_api".into(),
                Value::String(entity.source_api.clone()),
            );

            self.db
                .query("UPSERT type::thing($table, $slug) CONTENT $content")
                .bind(("table", table.to_string()))
                .bind(("slug", entity.slug.clone()))
                .bind(("content", Value::Object(content)))
                .await?;
            stored += 1;
        }
        Ok(stored)
    }

    async fn semantic_search(
        &self,
        _entity_type: &str,
        _query: &str,
        _limit: usize,
        _filters: &Filters,
    ) -> Result<Vec<Entity>> {
        Err(LoreError::NotSupported(
            "semantic_search is not available on the structured cache backend".to_string(),
        ))
    }

    async fn entity_count(&self, entity_type: &str) -> Result<usize> {
        #[derive(Deserialize)]
        struct CountResult {
            count: usize,
        }
        let table = validate_table(entity_type)?;
        self.ensure_collection(table).await?;
        let mut response = self
            .db
            .query(format!("SELECT count() AS count FROM {table} GROUP ALL"))
            .await?;
        let rows: Vec<CountResult> = response.take(0).unwrap_or_default();
        Ok(rows.first().map(|r| r.count).unwrap_or(0))
    }

    async fn available_documents(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct DocsResult {
            docs: Vec<String>,
        }
        let mut all = std::collections::HashSet::new();
        for table in self.known_tables().await? {
            let mut response = self
                .db
                .query(format!(
                    "SELECT array::distinct(document) AS docs FROM {table} GROUP ALL"
                ))
                .await?;
            let rows: Vec<DocsResult> = response.take(0).unwrap_or_default();
            if let Some(row) = rows.into_iter().next() {
                all.extend(row.docs);
            }
        }
        let mut docs: Vec<String> = all.into_iter().collect();
        docs.sort();
        Ok(docs)
    }

    async fn document_metadata(&self, document: &str) -> Result<HashMap<String, usize>> {
        #[derive(Deserialize)]
        struct CountResult {
            count: usize,
        }
        let mut counts = HashMap::new();
        for table in self.known_tables().await? {
            let mut response = self
                .db
                .query(format!(
                    "SELECT count() AS count FROM {table} WHERE document = $doc GROUP ALL"
                ))
                .bind(("doc", document.to_string()))
                .await?;
            let rows: Vec<CountResult> = response.take(0).unwrap_or_default();
            let count = rows.first().map(|r| r.count).unwrap_or(0);
            if count > 0 {
                counts.insert(table, count);
            }
        }
        Ok(counts)
    }

    async fn cache_stats(&self) -> Result<CacheStats> {
        let mut collections = HashMap::new();
        let mut total = 0usize;
        for table in self.known_tables().await? {
            let count = self.entity_count(&table).await.unwrap_or(0);
            total += count;
            collections.insert(table, count);
        }
        Ok(CacheStats {
            collections,
            total,
            db_path: self.db_path.display().to_string(),
        })
    }
}
