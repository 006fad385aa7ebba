//! Infrastructure layer for Onward.
//!
//! Contains implementations of the traits defined in `onward-core`:
//! JSON-file memory stores, the global config loader, knowledge-base loading,
//! the AWS Bedrock LLM provider and the optional fastembed embedder.

pub mod config;
pub mod filesystem;
pub mod json;
pub mod knowledge;
pub mod llm;
pub mod vector;
