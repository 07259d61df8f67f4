//! Embedding infrastructure: text -> vector conversion and type-specific
//! searchable-text extraction (§4.1).
//!
//! `EmbeddingService` abstracts the model so the cache engine can swap in a
//! no-op implementation for the structured backend or for tests.

pub mod candle_backend;
pub mod model;
pub mod text;

use async_trait::async_trait;

use crate::error::{LoreError, Result};

pub use model::{resolve_model, EmbeddingConfig, LocalEmbeddingService};
pub use text::searchable_text;

/// Service trait for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Encode a single piece of text into a fixed-width vector.
    ///
    /// On first call this loads the model (blocking I/O, possibly a network
    /// download); subsequent calls reuse the loaded model. Deterministic for
    /// a given model.
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode a batch of texts, order-preserving. Empty input -> empty output.
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector width produced by this service (e.g. 384 for BGE-small).
    fn dimensions(&self) -> usize;

    /// Whether a model has already been loaded successfully. Does not
    /// trigger a load; a `false` here does not mean `encode` will fail, only
    /// that it hasn't run yet.
    fn is_available(&self) -> bool;

    /// Short model identifier, used for metadata/logging.
    fn model_id(&self) -> &str;
}

/// No-op embedding service for the structured backend and for tests that
/// don't exercise semantic search. Always errors on encode.
pub struct NoopEmbeddingService {
    dimensions: usize,
}

impl NoopEmbeddingService {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingService for NoopEmbeddingService {
    async fn encode(&self, _text: &str) -> Result<Vec<f32>> {
        Err(LoreError::EmbeddingError(
            "embedding service is not available (noop)".to_string(),
        ))
    }

    async fn encode_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(LoreError::EmbeddingError(
            "embedding service is not available (noop)".to_string(),
        ))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_available(&self) -> bool {
        false
    }

    fn model_id(&self) -> &str {
        "noop"
    }
}
