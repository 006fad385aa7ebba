//! Shared domain types for Onward.
//!
//! This crate contains the vocabulary used across the workspace: session
//! memory entries, best practices, knowledge-base records, handoff packages,
//! LLM request/response shapes, configuration and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod handoff;
pub mod knowledge;
pub mod llm;
pub mod memory;
