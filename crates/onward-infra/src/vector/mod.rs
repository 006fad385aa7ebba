//! Model-backed embedding generation.
//!
//! The deterministic hashing embedder lives in onward-core; this module
//! adds the local ONNX model behind the `fastembed` feature.

#[cfg(feature = "fastembed")]
pub mod embedder;
