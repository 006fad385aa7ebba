//! Session memory store trait and the shared in-process session log.
//!
//! A session log is an append-only list of turns per session, each embedded
//! from its query text. [`SessionLog`] holds the logic (turn numbering,
//! per-session eviction, ranking) so every backend behaves the same; the
//! backends only decide where the log lives.

use std::collections::BTreeSet;

use chrono::Utc;
use onward_types::error::RepositoryError;
use onward_types::memory::{NewSessionEntry, Outcome, ScoredEntry, SessionEntry, normalize_tags};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::index::{Embedded, VectorIndex};

/// Trait for per-session conversation memory with semantic recall.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SessionMemoryStore: Send + Sync {
    /// Append a turn to its session, evicting the oldest turns past the bound.
    fn append(
        &self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> impl std::future::Future<Output = Result<SessionEntry, RepositoryError>> + Send;

    /// Top-`k` entries of one session by cosine similarity to the query.
    fn search(
        &self,
        session_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredEntry>, RepositoryError>> + Send;

    /// Top-`k` entries across all sessions, optionally restricted to one outcome label.
    fn search_by_outcome(
        &self,
        query_embedding: &[f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ScoredEntry>, RepositoryError>> + Send;

    /// Fetch a single entry by id.
    fn get(
        &self,
        entry_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<SessionEntry>, RepositoryError>> + Send;

    /// Label an entry. The outcome is the only mutable field of an entry.
    fn set_outcome(
        &self,
        entry_id: &Uuid,
        outcome: Outcome,
    ) -> impl std::future::Future<Output = Result<SessionEntry, RepositoryError>> + Send;

    /// All entries of a session in turn order.
    fn list(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<SessionEntry>, RepositoryError>> + Send;

    fn count(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Drop a whole session. Returns the number of entries removed.
    fn clear_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<usize, RepositoryError>> + Send;

    /// Ids of every session with at least one entry, sorted.
    fn sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, RepositoryError>> + Send;
}

/// Persisted form of a session entry: entry fields plus `embedding`.
pub type StoredSessionEntry = Embedded<SessionEntry>;

/// Session entries plus the per-session bound.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    index: VectorIndex<SessionEntry>,
    max_items_per_session: Option<usize>,
}

impl SessionLog {
    pub fn new(max_items_per_session: Option<usize>) -> Self {
        Self {
            index: VectorIndex::new(),
            max_items_per_session,
        }
    }

    /// Rebuild from persisted records, applying the bound to each session.
    pub fn from_records(
        records: Vec<StoredSessionEntry>,
        max_items_per_session: Option<usize>,
    ) -> Self {
        let mut log = Self {
            index: VectorIndex::from_records(records),
            max_items_per_session,
        };
        let sessions: Vec<String> = log.session_ids();
        for session_id in sessions {
            log.prune(&session_id);
        }
        log
    }

    pub fn records(&self) -> &[StoredSessionEntry] {
        self.index.records()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.index.dimension()
    }

    fn next_turn_index(&self, session_id: &str) -> u32 {
        self.index
            .items()
            .filter(|e| e.session_id == session_id)
            .map(|e| e.turn_index.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn append(
        &mut self,
        new: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<SessionEntry, RepositoryError> {
        let turn_index = new
            .turn_index
            .unwrap_or_else(|| self.next_turn_index(&new.session_id));

        let entry = SessionEntry {
            id: Uuid::now_v7(),
            session_id: new.session_id,
            turn_index,
            query: new.query,
            answer: new.answer,
            summary: new.summary,
            outcome: new.outcome,
            tags: normalize_tags(&new.tags),
            embedding_model: embedding_model.to_string(),
            created_at: Utc::now(),
        };

        self.index.push(entry.clone(), embedding)?;
        self.prune(&entry.session_id);
        Ok(entry)
    }

    /// Evict the oldest entries of one session until the bound holds.
    ///
    /// Oldest means earliest `created_at`, then lowest `turn_index`.
    fn prune(&mut self, session_id: &str) -> usize {
        let Some(max) = self.max_items_per_session else {
            return 0;
        };

        let mut in_session: Vec<(chrono::DateTime<Utc>, u32, Uuid)> = self
            .index
            .items()
            .filter(|e| e.session_id == session_id)
            .map(|e| (e.created_at, e.turn_index, e.id))
            .collect();
        if in_session.len() <= max {
            return 0;
        }

        in_session.sort();
        let overflow = in_session.len() - max;
        let evict: BTreeSet<Uuid> = in_session[..overflow].iter().map(|(_, _, id)| *id).collect();
        let removed = self.index.retain(|e| !evict.contains(&e.id));
        debug!(session_id, removed, max, "Evicted oldest session entries");
        removed
    }

    pub fn search(&self, session_id: &str, query: &[f32], k: usize) -> Vec<ScoredEntry> {
        self.index
            .rank(query, k, |e| e.session_id == session_id)
            .into_iter()
            .map(|(entry, similarity)| ScoredEntry {
                entry: entry.clone(),
                similarity,
            })
            .collect()
    }

    pub fn search_by_outcome(
        &self,
        query: &[f32],
        outcome: Option<Outcome>,
        k: usize,
    ) -> Vec<ScoredEntry> {
        self.index
            .rank(query, k, |e| outcome.is_none() || e.outcome == outcome)
            .into_iter()
            .map(|(entry, similarity)| ScoredEntry {
                entry: entry.clone(),
                similarity,
            })
            .collect()
    }

    pub fn get(&self, entry_id: &Uuid) -> Option<SessionEntry> {
        self.index.find(|e| e.id == *entry_id).cloned()
    }

    pub fn set_outcome(
        &mut self,
        entry_id: &Uuid,
        outcome: Outcome,
    ) -> Result<SessionEntry, RepositoryError> {
        let entry = self
            .index
            .find_mut(|e| e.id == *entry_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.outcome = Some(outcome);
        Ok(entry.clone())
    }

    pub fn list(&self, session_id: &str) -> Vec<SessionEntry> {
        let mut entries: Vec<SessionEntry> = self
            .index
            .items()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.turn_index
                .cmp(&b.turn_index)
                .then(a.created_at.cmp(&b.created_at))
        });
        entries
    }

    pub fn count(&self, session_id: &str) -> usize {
        self.index
            .items()
            .filter(|e| e.session_id == session_id)
            .count()
    }

    pub fn clear_session(&mut self, session_id: &str) -> usize {
        self.index.retain(|e| e.session_id != session_id)
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.index
            .items()
            .map(|e| e.session_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Session memory held in process memory; lost on exit.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    log: RwLock<SessionLog>,
}

impl InMemorySessionStore {
    pub fn new(max_items_per_session: Option<usize>) -> Self {
        Self {
            log: RwLock::new(SessionLog::new(max_items_per_session)),
        }
    }
}

impl SessionMemoryStore for InMemorySessionStore {
    async fn append(
        &self,
        entry: NewSessionEntry,
        embedding: Vec<f32>,
        embedding_model: &str,
    ) -> Result<SessionEntry, RepositoryError> {
        self.log
            .write()
            .await
            .append(entry, embedding, embedding_model)
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
        self.log.write().await.set_outcome(entry_id, outcome)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<SessionEntry>, RepositoryError> {
        Ok(self.log.read().await.list(session_id))
    }

    async fn count(&self, session_id: &str) -> Result<usize, RepositoryError> {
        Ok(self.log.read().await.count(session_id))
    }

    async fn clear_session(&self, session_id: &str) -> Result<usize, RepositoryError> {
        Ok(self.log.write().await.clear_session(session_id))
    }

    async fn sessions(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.log.read().await.session_ids())
    }
}
