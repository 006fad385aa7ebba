//! Business logic and store trait definitions for Onward.
//!
//! This crate defines the "ports" (store, embedder and provider traits) that
//! the infrastructure layer implements, plus the pure logic on top of them:
//! similarity ranking, fast-answer gating, prompt assembly and the chat
//! service. It depends only on `onward-types` -- never on `onward-infra`.

pub mod agent;
pub mod chat;
pub mod knowledge;
pub mod llm;
pub mod memory;
