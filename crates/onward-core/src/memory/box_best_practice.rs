//! BoxBestPracticeStore -- object-safe dynamic dispatch wrapper for BestPracticeStore.

use std::future::Future;
use std::pin::Pin;

use onward_types::error::RepositoryError;
use onward_types::memory::{BestPractice, NewBestPractice, RankedBestPractice};
use uuid::Uuid;

use super::best_practice::BestPracticeStore;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`BestPracticeStore`] with boxed futures.
pub trait BestPracticeStoreDyn: Send + Sync {
    fn add_boxed<'a>(
        &'a self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &'a str,
    ) -> BoxFut<'a, BestPractice>;

    fn search_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        tags: &'a [String],
        k: usize,
    ) -> BoxFut<'a, Vec<RankedBestPractice>>;

    fn list_boxed(&self) -> BoxFut<'_, Vec<BestPractice>>;

    fn delete_boxed<'a>(&'a self, id: &'a Uuid) -> BoxFut<'a, ()>;

    fn count_boxed(&self) -> BoxFut<'_, usize>;
}

impl<T: BestPracticeStore> BestPracticeStoreDyn for T {
    fn add_boxed<'a>(
        &'a self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &'a str,
    ) -> BoxFut<'a, BestPractice> {
        Box::pin(self.add(practice, embedding, embedding_model))
    }

    fn search_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        tags: &'a [String],
        k: usize,
    ) -> BoxFut<'a, Vec<RankedBestPractice>> {
        Box::pin(self.search(query_embedding, tags, k))
    }

    fn list_boxed(&self) -> BoxFut<'_, Vec<BestPractice>> {
        Box::pin(self.list())
    }

    fn delete_boxed<'a>(&'a self, id: &'a Uuid) -> BoxFut<'a, ()> {
        Box::pin(self.delete(id))
    }

    fn count_boxed(&self) -> BoxFut<'_, usize> {
        Box::pin(self.count())
    }
}

/// Type-erased best-practice store.
pub struct BoxBestPracticeStore {
    inner: Box<dyn BestPracticeStoreDyn + Send + Sync>,
}

impl BoxBestPracticeStore {
    pub fn new<T: BestPracticeStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn add(
        &self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<BestPractice, RepositoryError> {
        self.inner
            .add_boxed(practice, embedding, embedding_model)
            .await
    }

    pub async fn search(
        &self,
        query_embedding: &[f32],
        tags: &[String],
        k: usize,
    ) -> Result<Vec<RankedBestPractice>, RepositoryError> {
        self.inner.search_boxed(query_embedding, tags, k).await
    }

    pub async fn list(&self) -> Result<Vec<BestPractice>, RepositoryError> {
        self.inner.list_boxed().await
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        self.inner.delete_boxed(id).await
    }

    pub async fn count(&self) -> Result<usize, RepositoryError> {
        self.inner.count_boxed().await
    }
}
