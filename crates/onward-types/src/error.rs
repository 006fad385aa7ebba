use thiserror::Error;

use crate::llm::LlmError;

/// Errors from store and embedder operations (used by trait definitions in onward-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("embedding error: {0}")]
    Embedding(String),
}

/// Errors surfaced by the memory-aware chat service.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("query must not be empty")]
    EmptyQuery,

    #[error("best-practice snippet must not be empty")]
    EmptySnippet,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("bad filter".to_string());
        assert_eq!(err.to_string(), "query error: bad filter");
    }

    #[test]
    fn test_memory_error_wraps_repository_error() {
        let err: MemoryError = RepositoryError::NotFound.into();
        assert_eq!(err.to_string(), "entity not found");
    }

    #[test]
    fn test_memory_error_wraps_llm_error() {
        let err: MemoryError = LlmError::AuthenticationFailed.into();
        assert!(matches!(err, MemoryError::Llm(LlmError::AuthenticationFailed)));
    }
}
