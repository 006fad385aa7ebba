//! Deterministic feature-hashing embedder.
//!
//! Needs no model download: each lower-cased alphanumeric token is hashed
//! with SHA-256 into one of `dimension` signed buckets and the result is
//! L2-normalised. Texts sharing vocabulary land close together, and
//! identical texts produce identical vectors.

use onward_types::error::RepositoryError;
use sha2::{Digest, Sha256};

use super::embedder::Embedder;

/// Bag-of-words embedder using the hashing trick.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimension` components.
    ///
    /// A zero dimension is clamped to 1.
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_name: format!("hashing-{dimension}"),
        }
    }

    /// Embed a single text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send {
        let vectors: Vec<Vec<f32>> = texts.iter().map(|t| self.embed_text(t)).collect();
        async move { Ok(vectors) }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
