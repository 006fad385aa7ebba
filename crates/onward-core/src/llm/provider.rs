//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement. Only the
//! non-streaming completion path is used: one call per generated turn.

use onward_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for LLM provider backends (Bedrock, test doubles).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in onward-infra (e.g., `BedrockProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// What this provider supports.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
