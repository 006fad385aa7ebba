//! JSON-file session memory store.

use std::path::{Path, PathBuf};

use onward_core::memory::session::{SessionLog, SessionMemoryStore, StoredSessionEntry};
use onward_types::error::RepositoryError;
use onward_types::memory::{NewSessionEntry, Outcome, ScoredEntry, SessionEntry};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ensure_parent, read_records, write_records};

/// Session memory persisted to a single JSON file.
///
/// Mutations are applied to a copy of the log and only become visible once
/// the file has been rewritten, so a failed write leaves both in step.
pub struct JsonSessionStore {
    path: PathBuf,
    log: RwLock<SessionLog>,
}

impl JsonSessionStore {
    /// Open (or create on first write) the store at `path`.
    pub async fn open(
        path: impl Into<PathBuf>,
        max_items_per_session: Option<usize>,
    ) -> Result<Self, RepositoryError> {
        let path = path.into();
        ensure_parent(&path).await?;
        let records: Vec<StoredSessionEntry> = read_records(&path).await;
        let log = SessionLog::from_records(records, max_items_per_session);
        tracing::info!(
            path = %path.display(),
            entries = log.records().len(),
            "Opened JSON session store"
        );
        Ok(Self {
            path,
            log: RwLock::new(log),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionMemoryStore for JsonSessionStore {
    async fn append(
        &self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<SessionEntry, RepositoryError> {
        let mut guard = self.log.write().await;
        let mut next = guard.clone();
        let appended = next.append(entry, embedding, embedding_model)?;
        write_records(&self.path, next.records()).await?;
        *guard = next;
        Ok(appended)
    }

    async fn search(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredEntry>, RepositoryError> {
        Ok(self.log.read().await.search(session_id, query_embedding, k))
    }

    async fn search_by_outcome(
        &self,
        query_embedding: &[f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> Result<Vec<ScoredEntry>, RepositoryError> {
        Ok(self
            .log
            .read()
            .await
            .search_by_outcome(query_embedding, outcome, k))
    }

    async fn get(&self, entry_id: &Uuid) -> Result<Option<SessionEntry>, RepositoryError> {
        Ok(self.log.read().await.get(entry_id))
    }

    async fn set_outcome(
        &self,
        entry_id: &Uuid,
        outcome: Outcome,
    ) -> Result<SessionEntry, RepositoryError> {
        let mut guard = self.log.write().await;
        let mut next = guard.clone();
        let updated = next.set_outcome(entry_id, outcome)?;
        write_records(&self.path, next.records()).await?;
        *guard = next;
        Ok(updated)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<SessionEntry>, RepositoryError> {
        Ok(self.log.read().await.list(session_id))
    }

    async fn count(&self, session_id: &str) -> Result<usize, RepositoryError> {
        Ok(self.log.read().await.count(session_id))
    }

    async fn clear_session(&self, session_id: &str) -> Result<usize, RepositoryError> {
        let mut guard = self.log.write().await;
        let mut next = guard.clone();
        let removed = next.clear_session(session_id);
        if removed > 0 {
            write_records(&self.path, next.records()).await?;
            *guard = next;
        }
        Ok(removed)
    }

    async fn sessions(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.log.read().await.session_ids())
    }
}
