//! Best-practice store trait and its in-process log.
//!
//! Best practices are a single global collection, separate from session
//! memory and bounded independently of it. Only entries labelled `good`
//! are ever returned by a search.

use chrono::Utc;
use onward_types::error::RepositoryError;
use onward_types::memory::{
    BestPractice, NewBestPractice, Outcome, RankedBestPractice, normalize_tags,
};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::index::{Embedded, VectorIndex};

/// Trait for the persisted collection of reusable snippets.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait BestPracticeStore: Send + Sync {
    /// Insert a practice, evicting the oldest entries past the bound.
    fn add(
        &self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> impl std::future::Future<Output = Result<BestPractice, RepositoryError>> + Send;

    /// Top-`k` good practices by cosine similarity.
    ///
    /// With a non-empty `tags`, only practices sharing at least one tag qualify.
    fn search(
        &self,
        query_embedding: &[f32],
        tags: &[String],
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RankedBestPractice>, RepositoryError>> + Send;

    /// Every stored practice, oldest first.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<BestPractice>, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn count(&self) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;
}

/// Persisted form of a best practice: practice fields plus `embedding`.
pub type StoredBestPractice = Embedded<BestPractice>;

/// Best practices plus the collection-wide bound.
#[derive(Debug, Clone, Default)]
pub struct BestPracticeLog {
    index: VectorIndex<BestPractice>,
    max_items: Option<usize>,
}

impl BestPracticeLog {
    pub fn new(max_items: Option<usize>) -> Self {
        Self {
            index: VectorIndex::new(),
            max_items,
        }
    }

    pub fn from_records(records: Vec<StoredBestPractice>, max_items: Option<usize>) -> Self {
        let mut log = Self {
            index: VectorIndex::from_records(records),
            max_items,
        };
        log.prune();
        log
    }

    pub fn records(&self) -> &[StoredBestPractice] {
        self.index.records()
    }

    pub fn add(
        &mut self,
        new: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<BestPractice, RepositoryError> {
        let practice = BestPractice {
            id: Uuid::now_v7(),
            snippet: new.snippet.trim().to_string(),
            tags: normalize_tags(&new.tags),
            outcome: new.outcome,
            source_session: new.source_session,
            source_entry: new.source_entry,
            embedding_model: embedding_model.to_string(),
            created_at: Utc::now(),
        };
        self.index.push(practice.clone(), embedding)?;
        self.prune();
        Ok(practice)
    }

    fn prune(&mut self) -> usize {
        let Some(max) = self.max_items else {
            return 0;
        };
        if self.index.len() <= max {
            return 0;
        }

        let mut ages: Vec<(chrono::DateTime<Utc>, Uuid)> =
            self.index.items().map(|p| (p.created_at, p.id)).collect();
        ages.sort();
        let overflow = ages.len() - max;
        let evict: Vec<Uuid> = ages[..overflow].iter().map(|(_, id)| *id).collect();
        let removed = self.index.retain(|p| !evict.contains(&p.id));
        debug!(removed, max, "Evicted oldest best practices");
        removed
    }

    pub fn search(&self, query: &[f32], tags: &[String], k: usize) -> Vec<RankedBestPractice> {
        let wanted = normalize_tags(tags);
        self.index
            .rank(query, k, |p| {
                p.outcome == Outcome::Good && (wanted.is_empty() || p.matches_any_tag(&wanted))
            })
            .into_iter()
            .map(|(practice, similarity)| RankedBestPractice {
                practice: practice.clone(),
                similarity,
            })
            .collect()
    }

    pub fn list(&self) -> Vec<BestPractice> {
        let mut all: Vec<BestPractice> = self.index.items().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }

    pub fn delete(&mut self, id: &Uuid) -> Result<(), RepositoryError> {
        match self.index.retain(|p| p.id != *id) {
            0 => Err(RepositoryError::NotFound),
            _ => Ok(()),
        }
    }

    pub fn count(&self) -> usize {
        self.index.len()
    }
}

/// Best practices held in process memory; lost on exit.
#[derive(Debug, Default)]
pub struct InMemoryBestPracticeStore {
    log: RwLock<BestPracticeLog>,
}

impl InMemoryBestPracticeStore {
    pub fn new(max_items: Option<usize>) -> Self {
        Self {
            log: RwLock::new(BestPracticeLog::new(max_items)),
        }
    }
}

impl BestPracticeStore for InMemoryBestPracticeStore {
    async fn add(
        &self,
        practice: NewBestPractice,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<BestPractice, RepositoryError> {
        self.log
            .write()
            .await
            .add(practice, embedding, embedding_model)
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
        self.log.write().await.delete(id)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.log.read().await.count())
    }
}
