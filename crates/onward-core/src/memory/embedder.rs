//! Embedder trait for text-to-vector conversion.
//!
//! Defines the interface for embedding text into vectors for semantic search.
//! The deterministic [`super::hashing::HashingEmbedder`] lives here; model-backed
//! implementations live in onward-infra.

use onward_types::error::RepositoryError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors.
    ///
    /// Returns one vector per input text, in input order.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send;

    /// The model name recorded alongside stored vectors.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
