//! Test harness for cache lifecycle management.
//!
//! Provides an isolated cache instance per test using tempfile, following the
//! same create-temp-dir-then-open shape as the embedded database setup in
//! `RepositoryFactory::from_config`.

use std::sync::Arc;

use tempfile::TempDir;

use lorekeeper::cache::{open_cache, CacheProtocol};
use lorekeeper::config::CacheBackend;
use lorekeeper::embedding::{resolve_model, EmbeddingService, LocalEmbeddingService, NoopEmbeddingService};
use lorekeeper::repository::RepositoryFactory;

use super::mock_client::MockUpstreamClient;

/// Test harness bundling a fresh cache, a fixture-backed upstream client, and
/// a repository factory built around both.
pub struct TestHarness {
    pub cache: Arc<dyn CacheProtocol>,
    pub client: Arc<MockUpstreamClient>,
    pub repositories: RepositoryFactory,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Vector-capable cache backed by a no-op embedding service: storage and
    /// structured lookups behave normally, but any `semantic_search` call
    /// degrades to a structured fallback rather than failing the test suite
    /// on a model download.
    pub async fn new() -> Self {
        Self::with_backend_and_embedding(CacheBackend::Vector, noop_embedding()).await
    }

    /// Structured-only backend: `semantic_search` raises `NotSupported`.
    pub async fn structured() -> Self {
        Self::with_backend_and_embedding(CacheBackend::Structured, noop_embedding()).await
    }

    /// Vector-capable cache with the real candle/BGE embedding service.
    /// Downloads model weights from HuggingFace Hub on first use — reserved
    /// for tests marked `#[ignore]`.
    pub async fn with_real_embedding() -> Self {
        let config = resolve_model("bge-small-en-v1.5").expect("default model id resolves");
        let embedding: Arc<dyn EmbeddingService> = Arc::new(LocalEmbeddingService::new(config));
        Self::with_backend_and_embedding(CacheBackend::Vector, embedding).await
    }

    async fn with_backend_and_embedding(
        backend: CacheBackend,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir for test cache");
        let db_path = temp_dir.path().join("test.db");
        let cache = open_cache(backend, db_path, embedding)
            .await
            .expect("failed to open test cache");
        let client = Arc::new(MockUpstreamClient::new());
        let repositories = RepositoryFactory::new(client.clone(), cache.clone());

        Self {
            cache,
            client,
            repositories,
            _temp_dir: temp_dir,
        }
    }
}

fn noop_embedding() -> Arc<dyn EmbeddingService> {
    Arc::new(NoopEmbeddingService::new(384))
}
