//! BoxEmbedder -- object-safe dynamic dispatch wrapper for Embedder.
//!
//! 1. Define an object-safe `EmbedderDyn` trait with boxed futures
//! 2. Blanket-impl `EmbedderDyn` for all `T: Embedder`
//! 3. `BoxEmbedder` wraps `Box<dyn EmbedderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use onward_types::error::RepositoryError;

use super::embedder::Embedder;

/// Object-safe version of [`Embedder`] with boxed futures.
pub trait EmbedderDyn: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;
}

impl<T: Embedder> EmbedderDyn for T {
    fn embed_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RepositoryError>> + Send + 'a>> {
        Box::pin(self.embed(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased embedder for runtime selection (hashing vs fastembed).
pub struct BoxEmbedder {
    inner: Box<dyn EmbedderDyn + Send + Sync>,
}

impl BoxEmbedder {
    /// Wrap a concrete `Embedder` in a type-erased box.
    pub fn new<T: Embedder + 'static>(embedder: T) -> Self {
        Self {
            inner: Box::new(embedder),
        }
    }

    /// Embed one or more texts into vectors.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
        self.inner.embed_boxed(texts).await
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RepositoryError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        if vectors.len() != 1 {
            return Err(RepositoryError::Embedding(format!(
                "expected 1 vector, embedder returned {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }

    pub fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}
