//! Local embedding model implementation using candle, loaded lazily.
//!
//! Unlike an eager constructor, the model is not downloaded or loaded until
//! the first `encode`/`encode_batch` call. Concurrent first-use callers
//! share one in-flight initialization via `tokio::sync::OnceCell` — a
//! single-flight guard, per §4.1's concurrency requirement. A failed load is
//! not cached: the next call retries from scratch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::embedding::candle_backend::{download_model, select_device, BertEmbedder};
use crate::embedding::EmbeddingService;
use crate::error::{LoreError, Result};

/// Configuration for embedding model initialization.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// HuggingFace repo ID (e.g. "BAAI/bge-small-en-v1.5")
    pub model_repo: String,
    /// Embedding dimensions (e.g. 384 for BGE-small)
    pub dimensions: usize,
    /// Short model identifier (e.g. "bge-small-en-v1.5")
    pub model_id: String,
    /// Optional cache directory for model files
    pub cache_dir: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        resolve_model("bge-small-en-v1.5").expect("default model id must resolve")
    }
}

/// Resolve a short model identifier (as configured via
/// `LOREKEEPER_EMBEDDING_MODEL`) to its HuggingFace repo and dimensions.
///
/// Mirrors the teacher's provider-config model table, but keeps the crate on
/// one embedding backend (candle) end to end instead of naming a different
/// crate (`fastembed`) than the one actually wired into the binary.
pub fn resolve_model(model_id: &str) -> Result<EmbeddingConfig> {
    let (repo, dimensions) = match model_id {
        "bge-small-en-v1.5" => ("BAAI/bge-small-en-v1.5", 384),
        "bge-base-en-v1.5" => ("BAAI/bge-base-en-v1.5", 768),
        "bge-large-en-v1.5" => ("BAAI/bge-large-en-v1.5", 1024),
        other => {
            return Err(LoreError::ModelLoadError {
                model: other.to_string(),
                reason: "unknown model id; supported: bge-small-en-v1.5, bge-base-en-v1.5, bge-large-en-v1.5".to_string(),
            })
        }
    };

    Ok(EmbeddingConfig {
        model_repo: repo.to_string(),
        dimensions,
        model_id: model_id.to_string(),
        cache_dir: None,
    })
}

/// Local embedding service using candle, with single-flight lazy loading.
pub struct LocalEmbeddingService {
    config: EmbeddingConfig,
    embedder: OnceCell<Arc<BertEmbedder>>,
}

impl LocalEmbeddingService {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config,
            embedder: OnceCell::new(),
        }
    }

    /// Return the loaded embedder, loading it on first call. Concurrent
    /// callers racing here share the same in-flight future; a failed
    /// attempt does not poison the cell, so the next caller retries.
    async fn get_embedder(&self) -> Result<Arc<BertEmbedder>> {
        self.embedder
            .get_or_try_init(|| async {
                let repo = self.config.model_repo.clone();
                let cache_dir = self.config.cache_dir.clone();
                let model_id = self.config.model_id.clone();

                tokio::task::spawn_blocking(move || {
                    let files = download_model(&repo, cache_dir.as_deref().map(std::path::Path::new))
                        .map_err(|e| LoreError::ModelLoadError {
                            model: model_id.clone(),
                            reason: format!("download failed: {e}"),
                        })?;
                    let device = select_device();
                    let embedder = BertEmbedder::new(&files, device).map_err(|e| {
                        LoreError::ModelLoadError {
                            model: model_id.clone(),
                            reason: format!("load failed: {e}"),
                        }
                    })?;
                    Ok::<_, LoreError>(Arc::new(embedder))
                })
                .await
                .map_err(|e| LoreError::ModelLoadError {
                    model: self.config.model_id.clone(),
                    reason: format!("worker task panicked: {e}"),
                })?
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl EmbeddingService for LocalEmbeddingService {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = self.get_embedder().await?;
        let text = text.to_string();
        let model_id = self.config.model_id.clone();

        let result = tokio::task::spawn_blocking(move || embedder.embed(&[text]))
            .await
            .map_err(|e| LoreError::EmbeddingError(format!("worker task panicked: {e}")))?
            .map_err(|e| LoreError::EmbeddingError(format!("{model_id}: {e}")))?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| LoreError::EmbeddingError("no embedding returned".to_string()))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embedder = self.get_embedder().await?;
        let texts = texts.to_vec();
        let model_id = self.config.model_id.clone();

        tokio::task::spawn_blocking(move || embedder.embed(&texts))
            .await
            .map_err(|e| LoreError::EmbeddingError(format!("worker task panicked: {e}")))?
            .map_err(|e| LoreError::EmbeddingError(format!("{model_id}: {e}")))
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn is_available(&self) -> bool {
        self.embedder.initialized()
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}
