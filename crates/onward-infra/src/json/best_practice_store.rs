//! JSON-file best-practice store.

use std::path::{Path, PathBuf};

use onward_core::memory::best_practice::{BestPracticeLog, BestPracticeStore, StoredBestPractice};
use onward_types::error::RepositoryError;
use onward_types::memory::{BestPractice, NewBestPractice, RankedBestPractice};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ensure_parent, read_records, write_records};

/// Best practices persisted to a single JSON file.
pub struct JsonBestPracticeStore {
    path: PathBuf,
    log: RwLock<BestPracticeLog>,
}

impl JsonBestPracticeStore {
    pub async fn open(
        path: impl Into<PathBuf>,
        max_items: Option<usize>,
    ) -> Result<Self, RepositoryError> {
        let path = path.into();
        ensure_parent(&path).await?;
        let records: Vec<StoredBestPractice> = read_records(&path).await;
        let log = BestPracticeLog::from_records(records, max_items);
        tracing::info!(
            path = %path.display(),
            practices = log.count(),
            "Opened JSON best-practice store"
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

impl BestPracticeStore for JsonBestPracticeStore {
    async fn add(
        &self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<BestPractice, RepositoryError> {
        let mut guard = self.log.write().await;
        let mut next = guard.clone();
        let added = next.add(practice, embedding, embedding_model)?;
        write_records(&self.path, next.records()).await?;
        *guard = next;
        Ok(added)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        tags: &[String],
        k: usize,
    ) -> Result<Vec<RankedBestPractice>, RepositoryError> {
        Ok(self.log.read().await.search(query_embedding, tags, k))
    }

    async fn list(&self) -> Result<Vec<BestPractice>, RepositoryError> {
        Ok(self.log.read().await.list())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let mut guard = self.log.write().await;
        let mut next = guard.clone();
        next.delete(id)?;
        write_records(&self.path, next.records()).await?;
        *guard = next;
        Ok(())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.log.read().await.count())
    }
}
