//! Vector-capable cache backend: SurrealDB embedded RocksDB storage plus
//! brute-force cosine similarity search (HNSW is unreliable in embedded
//! RocksDB mode, so this follows the teacher's brute-force-with-overfetch
//! approach rather than `DEFINE INDEX ... HNSW`).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::db::LoreDb;
use super::filter::{self, Filters};
use super::identifier::validate_table;
use super::{CacheProtocol, CacheStats};
use crate::embedding::EmbeddingService;
use crate::error::Result;
use crate::models::{schema_for, Entity};

pub struct VectorCache {
    db: LoreDb,
    embedding: Arc<dyn EmbeddingService>,
    db_path: PathBuf,
}

impl VectorCache {
    pub fn new(db: LoreDb, embedding: Arc<dyn EmbeddingService>, db_path: PathBuf) -> Self {
        Self {
            db,
            embedding,
            db_path,
        }
    }

    /// Idempotent collection creation: `DEFINE ... IF NOT EXISTS` means a
    /// second call is a no-op, which is what makes `store_entities`/
    /// `get_entities` safe to call against a brand new table.
    async fn ensure_collection(&self, entity_type: &str) -> Result<()> {
        let table = validate_table(entity_type)?;
        let schema = schema_for(table);
        self.db
            .query(format!(
                "DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;
                 DEFINE FIELD IF NOT EXISTS slug ON {table} TYPE string;
                 DEFINE FIELD IF NOT EXISTS embedding ON {table} TYPE option<array<float>>;
                 DEFINE INDEX IF NOT EXISTS {table}_slug_idx ON {table} FIELDS slug UNIQUE;"
            ))
            .await?;
        for field in schema.indexed_fields {
            let kind = match field.kind {
                crate::models::schema::FieldKind::String => "string",
                crate::models::schema::FieldKind::Int => "int",
                crate::models::schema::FieldKind::Float => "float",
                crate::models::schema::FieldKind::Bool => "bool",
                crate::models::schema::FieldKind::StringList => "array<string>",
            };
            self.db
                .query(format!(
                    "DEFINE FIELD IF NOT EXISTS {name} ON {table} TYPE option<{kind}>;
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
impl CacheProtocol for VectorCache {
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

        let query_str = format!(
            "SELECT * OMIT embedding FROM {table} {where_clause}",
            where_clause = compiled.where_clause,
        );
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

        let texts: Vec<String> = entities
            .iter()
            .map(|e| crate::embedding::searchable_text(table, e))
            .collect();
        let vectors = match self.embedding.encode_batch(&texts).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    "embedding generation failed while storing '{table}', storing without vectors: {e}"
                );
                vec![Vec::new(); entities.len()]
            }
        };

        let mut stored = 0usize;
        for (entity, vector) in entities.into_iter().zip(vectors) {
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
            if !vector.is_empty() {
                content.insert("embedding".into(), serde_json::to_value(vector)?);
            }

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
        entity_type: &str,
        query: &str,
        limit: usize,
        filters: &Filters,
    ) -> Result<Vec<Entity>> {
        if query.trim().is_empty() {
            return self.get_entities(entity_type, filters).await;
        }
        if let Some(docs) = &filters.document {
            if docs.is_empty() {
                return Ok(Vec::new());
            }
        }

        let table = validate_table(entity_type)?;
        self.ensure_collection(table).await?;

        let query_vector = match self.embedding.encode(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("query embedding failed, falling back to structured search: {e}");
                return self.get_entities(entity_type, filters).await;
            }
        };

        match self
            .run_semantic_query(table, &query_vector, limit, filters)
            .await
        {
            Ok(rows) => Ok(rows),
            Err(e) => {
                tracing::warn!("semantic search failed for '{table}', falling back to structured search: {e}");
                self.get_entities(entity_type, filters).await
            }
        }
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

impl VectorCache {
    async fn run_semantic_query(
        &self,
        table: &str,
        query_vector: &[f32],
        limit: usize,
        filters: &Filters,
    ) -> Result<Vec<Entity>> {
        #[derive(Deserialize)]
        struct ScoredRow {
            #[serde(rename = "_score")]
            score: f32,
            #[serde(flatten)]
            rest: Map<String, Value>,
        }

        let schema = schema_for(table);
        let compiled = filter::compile(&schema, filters);
        let extra = if compiled.where_clause.is_empty() {
            "WHERE embedding IS NOT NONE".to_string()
        } else {
            format!("{} AND embedding IS NOT NONE", compiled.where_clause)
        };

        // Overfetch past `limit` since client-side filters and the score
        // ORDER BY happen before truncation.
        let overfetch = limit.saturating_mul(2).max(limit).max(1);

        let query_str = format!(
            "SELECT * OMIT embedding, vector::similarity::cosine(embedding, $query_vector) AS _score
             FROM {table} {extra}
             ORDER BY _score DESC
             LIMIT $k"
        );
        let mut builder = self
            .db
            .query(query_str)
            .bind(("query_vector", query_vector.to_vec()))
            .bind(("k", overfetch as i64));
        for (key, value) in compiled.bindings {
            builder = builder.bind((key, value));
        }
        let mut response = builder.await?;
        let rows: Vec<ScoredRow> = response.take(0)?;

        let mut entities: Vec<Entity> = rows
            .into_iter()
            .map(|row| Entity::from_json(row.rest).with_score(row.score))
            .filter(|e| filter::matches_client_side(e, &compiled.client_side, &compiled.client_side_ranges))
            .collect();
        entities.truncate(limit);
        Ok(entities)
    }
}
