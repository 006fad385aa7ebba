//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `onward-core` using fastembed's
//! all-MiniLM-L6-v2 model (384 dimensions) with ONNX runtime inference.
//! The model is loaded on first use and cached under the data directory.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::Mutex;

use onward_core::memory::embedder::Embedder;
use onward_types::error::RepositoryError;

/// Output width of all-MiniLM-L6-v2.
pub const FASTEMBED_DIMENSION: usize = 384;

const MODEL_NAME: &str = "all-MiniLM-L6-v2";

pub struct FastEmbedder {
    model: Mutex<Option<TextEmbedding>>,
    cache_dir: Option<PathBuf>,
}

impl FastEmbedder {
    /// `cache_dir` holds the downloaded ONNX files; `None` uses fastembed's default.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self {
            model: Mutex::new(None),
            cache_dir,
        }
    }

    fn load(&self) -> Result<TextEmbedding, RepositoryError> {
        let mut options =
            InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
        if let Some(dir) = &self.cache_dir {
            options = options.with_cache_dir(dir.clone());
        }

        tracing::info!(model = MODEL_NAME, "Loading embedding model");
        let start = std::time::Instant::now();
        let model = TextEmbedding::try_new(options)
            .map_err(|e| RepositoryError::Embedding(format!("failed to load embedding model: {e}")))?;
        tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "Embedding model loaded");
        Ok(model)
    }
}

impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut guard = self.model.lock().await;
        if guard.is_none() {
            *guard = Some(self.load()?);
        }
        let model = guard
            .as_mut()
            .ok_or_else(|| RepositoryError::Embedding("embedding model not initialized".to_string()))?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| RepositoryError::Embedding(format!("failed to generate embeddings: {e}")))
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        FASTEMBED_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_batch_skips_model_load() {
        let embedder = FastEmbedder::new(None);
        let vectors = embedder.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
        assert!(embedder.model.lock().await.is_none());
        assert_eq!(embedder.dimension(), 384);
    }
}
