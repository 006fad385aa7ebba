//! Session memory, best practices and the vector plumbing underneath them.
//!
//! Both collections share [`index::VectorIndex`] for storage and ranking;
//! backends differ only in where the records live between calls.

pub mod best_practice;
pub mod box_best_practice;
pub mod box_embedder;
pub mod box_session;
pub mod embedder;
pub mod fast_answer;
pub mod hashing;
pub mod index;
pub mod session;
pub mod similarity;
