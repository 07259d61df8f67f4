//! Structured MCP tool error: an error code plus a suggestion, so callers
//! (typically an LLM) can self-correct without parsing message text.

use std::borrow::Cow;

use rmcp::model::{Content, ErrorCode, ErrorData, IntoContents};
use serde::Serialize;

use crate::error::LoreError;

#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error_code: String,
    pub message: String,
    pub suggestion: String,
}

impl IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| self.message.clone());
        vec![Content::text(json)]
    }
}

impl From<LoreError> for ToolError {
    fn from(err: LoreError) -> Self {
        match err {
            LoreError::NotSupported(msg) => ToolError {
                error_code: "NOT_SUPPORTED".into(),
                message: msg,
                suggestion: "This cache backend doesn't support semantic search. Retry without a query, or switch to the vector backend.".into(),
            },
            LoreError::CacheError(msg) => ToolError {
                error_code: "CACHE_ERROR".into(),
                message: msg,
                suggestion: "This may be a transient storage issue. Retry the request.".into(),
            },
            LoreError::ModelLoadError { model, reason } => ToolError {
                error_code: "MODEL_LOAD_ERROR".into(),
                message: format!("failed to load embedding model '{model}': {reason}"),
                suggestion: "Check network access to HuggingFace Hub, or configure a structured-only cache backend.".into(),
            },
            LoreError::EmbeddingError(msg) => ToolError {
                error_code: "EMBEDDING_ERROR".into(),
                message: msg,
                suggestion: "Retry the request; if it persists, the embedding model may need to be reloaded.".into(),
            },
            LoreError::UpstreamError(msg) => ToolError {
                error_code: "UPSTREAM_ERROR".into(),
                message: msg,
                suggestion: "The upstream catalog may be unreachable or rate-limiting. Retry later.".into(),
            },
            LoreError::ValidationError { slug, message } => ToolError {
                error_code: "VALIDATION_ERROR".into(),
                message: format!("entity '{slug}': {message}"),
                suggestion: "Check the request parameters against the tool's schema.".into(),
            },
        }
    }
}

impl From<LoreError> for ErrorData {
    fn from(err: LoreError) -> Self {
        let tool_err = ToolError::from(err);
        ErrorData {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(tool_err.message),
            data: Some(serde_json::json!({ "suggestion": tool_err.suggestion })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_supported_maps_to_expected_code() {
        let err = ToolError::from(LoreError::NotSupported("semantic_search unavailable".into()));
        assert_eq!(err.error_code, "NOT_SUPPORTED");
    }

    #[test]
    fn into_contents_produces_one_json_block() {
        let err = ToolError::from(LoreError::CacheError("disk full".into()));
        assert_eq!(err.into_contents().len(), 1);
    }
}
