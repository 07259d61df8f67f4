//! Backend selection: opens the embedded database and wraps it in whichever
//! `CacheProtocol` implementation the configured `CacheBackend` calls for.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CacheBackend;
use crate::embedding::EmbeddingService;
use crate::error::Result;

use super::{db, CacheProtocol, StructuredCache, VectorCache};

/// Open (creating on first use) the cache engine at `db_path`, using
/// `embedding` for the vector backend's `encode`/`encode_batch` calls.
pub async fn open_cache(
    backend: CacheBackend,
    db_path: PathBuf,
    embedding: Arc<dyn EmbeddingService>,
) -> Result<Arc<dyn CacheProtocol>> {
    let handle = db::open(&db_path).await?;
    let cache: Arc<dyn CacheProtocol> = match backend {
        CacheBackend::Vector => Arc::new(VectorCache::new(handle, embedding, db_path)),
        CacheBackend::Structured => Arc::new(StructuredCache::new(handle, db_path)),
    };
    Ok(cache)
}
