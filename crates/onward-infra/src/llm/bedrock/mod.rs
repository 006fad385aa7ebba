//! AWS Bedrock LLM provider implementation.
//!
//! Implements [`LlmProvider`](onward_core::llm::provider::LlmProvider) for the
//! Bedrock Runtime `invoke` action using Bearer token authentication.

mod client;
pub mod types;

pub use client::BedrockProvider;
