//! BoxSessionMemoryStore -- object-safe dynamic dispatch wrapper for SessionMemoryStore.
//!
//! Same blanket-impl pattern as [`super::box_embedder::BoxEmbedder`], so the
//! backend (in-memory or JSON file) can be chosen from configuration.

use std::future::Future;
use std::pin::Pin;

use onward_types::error::RepositoryError;
use onward_types::memory::{NewSessionEntry, Outcome, ScoredEntry, SessionEntry};
use uuid::Uuid;

use super::session::SessionMemoryStore;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`SessionMemoryStore`] with boxed futures.
pub trait SessionMemoryStoreDyn: Send + Sync {
    fn append_boxed<'a>(
        &'a self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &'a str,
    ) -> BoxFut<'a, SessionEntry>;

    fn search_boxed<'a>(
        &'a self,
        session_id: &'a str,
        query_embedding: &'a [f32],
        k: usize,
    ) -> BoxFut<'a, Vec<ScoredEntry>>;

    fn search_by_outcome_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> BoxFut<'a, Vec<ScoredEntry>>;

    fn get_boxed<'a>(&'a self, entry_id: &'a Uuid) -> BoxFut<'a, Option<SessionEntry>>;

    fn set_outcome_boxed<'a>(
        &'a self,
        entry_id: &'a Uuid,
        outcome: Outcome,
    ) -> BoxFut<'a, SessionEntry>;

    fn list_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, Vec<SessionEntry>>;

    fn count_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, usize>;

    fn clear_session_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, usize>;

    fn sessions_boxed(&self) -> BoxFut<'_, Vec<String>>;
}

/// Blanket implementation: any `SessionMemoryStore` automatically implements `SessionMemoryStoreDyn`.
impl<T: SessionMemoryStore> SessionMemoryStoreDyn for T {
    fn append_boxed<'a>(
        &'a self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &'a str,
    ) -> BoxFut<'a, SessionEntry> {
        Box::pin(self.append(entry, embedding, embedding_model))
    }

    fn search_boxed<'a>(
        &'a self,
        session_id: &'a str,
        query_embedding: &'a [f32],
        k: usize,
    ) -> BoxFut<'a, Vec<ScoredEntry>> {
        Box::pin(self.search(session_id, query_embedding, k))
    }

    fn search_by_outcome_boxed<'a>(
        &'a self,
        query_embedding: &'a [f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> BoxFut<'a, Vec<ScoredEntry>> {
        Box::pin(self.search_by_outcome(query_embedding, outcome, k))
    }

    fn get_boxed<'a>(&'a self, entry_id: &'a Uuid) -> BoxFut<'a, Option<SessionEntry>> {
        Box::pin(self.get(entry_id))
    }

    fn set_outcome_boxed<'a>(
        &'a self,
        entry_id: &'a Uuid,
        outcome: Outcome,
    ) -> BoxFut<'a, SessionEntry> {
        Box::pin(self.set_outcome(entry_id, outcome))
    }

    fn list_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, Vec<SessionEntry>> {
        Box::pin(self.list(session_id))
    }

    fn count_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, usize> {
        Box::pin(self.count(session_id))
    }

    fn clear_session_boxed<'a>(&'a self, session_id: &'a str) -> BoxFut<'a, usize> {
        Box::pin(self.clear_session(session_id))
    }

    fn sessions_boxed(&self) -> BoxFut<'_, Vec<String>> {
        Box::pin(self.sessions())
    }
}

/// Type-erased session memory store.
pub struct BoxSessionMemoryStore {
    inner: Box<dyn SessionMemoryStoreDyn + Send + Sync>,
}

impl BoxSessionMemoryStore {
    pub fn new<T: SessionMemoryStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn append(
        &self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<SessionEntry, RepositoryError> {
        self.inner
            .append_boxed(entry, embedding, embedding_model)
            .await
    }

    pub async fn search(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, RepositoryError> {
        self.inner.search_boxed(session_id, query_embedding, k).await
    }

    pub async fn search_by_outcome(
        &self,
        query_embedding: &[f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> Result<Vec<ScoredEntry>, RepositoryError> {
        self.inner
            .search_by_outcome_boxed(query_embedding, outcome, k)
            .await
    }

    pub async fn get(&self, entry_id: &Uuid) -> Result<Option<SessionEntry>, RepositoryError> {
        self.inner.get_boxed(entry_id).await
    }

    pub async fn set_outcome(
        &self,
        entry_id: &Uuid,
        outcome: Outcome,
    ) -> Result<SessionEntry, RepositoryError> {
        self.inner.set_outcome_boxed(entry_id, outcome).await
    }

    pub async fn list(&self, session_id: &str) -> Result<Vec<SessionEntry>, RepositoryError> {
        self.inner.list_boxed(session_id).await
    }

    pub async fn count(&self, session_id: &str) -> Result<usize, RepositoryError> {
        self.inner.count_boxed(session_id).await
    }

    pub async fn clear_session(&self, session_id: &str) -> Result<usize, RepositoryError> {
        self.inner.clear_session_boxed(session_id).await
    }

    pub async fn sessions(&self) -> Result<Vec<String>, RepositoryError> {
        self.inner.sessions_boxed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::session::InMemorySessionStore;

    #[tokio::test]
    async fn test_box_delegates_to_inner_store() {
        let store = BoxSessionMemoryStore::new(InMemorySessionStore::new(None));
        let entry = store
            .append(
                NewSessionEntry {
                    session_id: "s".to_string(),
                    query: "q".to_string(),
                    answer: "a".to_string(),
                    ..Default::default()
                },
                vec![1.0, 0.0],
                "m",
            )
            .await
            .unwrap();
        assert_eq!(store.count("s").await.unwrap(), 1);
        assert_eq!(store.get(&entry.id).await.unwrap(), Some(entry));
    }
}
