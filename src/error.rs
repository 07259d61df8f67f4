use thiserror::Error;

/// Crate-wide error type for LoreKeeper operations.
///
/// Each variant is a distinct error kind so callers can `match` on type
/// instead of inspecting message text — in particular, `NotSupported` must
/// stay distinguishable from an empty result set.
#[derive(Debug, Error)]
pub enum LoreError {
    /// The backend does not implement the requested operation (only raised
    /// by `semantic_search` on a structured-only backend).
    #[error("operation not supported by this cache backend: {0}")]
    NotSupported(String),

    /// Cache storage failure: DB corruption, I/O failure, schema mismatch.
    #[error("cache error: {0}")]
    CacheError(String),

    /// The embedding model could not be obtained (download or load failure).
    #[error("failed to load embedding model '{model}': {reason}")]
    ModelLoadError { model: String, reason: String },

    /// Encoding failed after the model was successfully loaded.
    #[error("embedding error: {0}")]
    EmbeddingError(String),

    /// Upstream catalog HTTP/network/deserialization failure.
    #[error("upstream catalog error: {0}")]
    UpstreamError(String),

    /// An individual entity failed to validate into its typed record.
    #[error("validation error for entity '{slug}': {message}")]
    ValidationError { slug: String, message: String },
}

impl From<surrealdb::Error> for LoreError {
    fn from(err: surrealdb::Error) -> Self {
        LoreError::CacheError(err.to_string())
    }
}

impl From<reqwest::Error> for LoreError {
    fn from(err: reqwest::Error) -> Self {
        LoreError::UpstreamError(err.to_string())
    }
}

impl From<std::io::Error> for LoreError {
    fn from(err: std::io::Error) -> Self {
        LoreError::CacheError(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for LoreError {
    fn from(err: serde_json::Error) -> Self {
        LoreError::CacheError(format!("serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, LoreError>;
