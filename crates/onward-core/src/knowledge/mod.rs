//! Knowledge-base retrieval over embedded service records.

pub mod scorer;
pub mod slots;

use onward_types::error::RepositoryError;
use onward_types::knowledge::{KnowledgeRecord, RetrievedChunk};
use tracing::info;

use crate::memory::box_embedder::BoxEmbedder;
use crate::memory::index::VectorIndex;

use self::scorer::{CandidateScorer, ScoredCandidate};

/// Default number of chunks injected per turn.
pub const DEFAULT_KNOWLEDGE_K: usize = 3;

#[derive(Debug, Clone)]
struct Chunk {
    record: KnowledgeRecord,
    text: String,
}

/// Embedded knowledge-base chunks, one per record.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    index: VectorIndex<Chunk>,
    embedding_model: String,
}

impl KnowledgeBase {
    /// Render every record to a chunk and embed them in a single batch.
    pub async fn build(
        records: &[KnowledgeRecord],
        embedder: &BoxEmbedder,
    ) -> Result<Self, RepositoryError> {
        let texts: Vec<String> = records.iter().map(KnowledgeRecord::to_chunk).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(&texts).await?
        };
        if vectors.len() != texts.len() {
            return Err(RepositoryError::Embedding(format!(
                "embedded {} of {} knowledge chunks",
                vectors.len(),
                texts.len()
            )));
        }

        let mut index = VectorIndex::new();
        for ((record, text), vector) in records.iter().zip(texts).zip(vectors) {
            index.push(
                Chunk {
                    record: record.clone(),
                    text,
                },
                vector,
            )?;
        }

        info!(
            chunks = index.len(),
            model = embedder.model_name(),
            "Knowledge base embedded"
        );
        Ok(Self {
            index,
            embedding_model: embedder.model_name().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Top-`k` chunks by cosine similarity to the query.
    pub fn retrieve(&self, query_embedding: &[f32], k: usize) -> Vec<RetrievedChunk> {
        self.index
            .rank(query_embedding, k, |_| true)
            .into_iter()
            .map(|(chunk, similarity)| RetrievedChunk {
                uid: chunk.record.uid.clone(),
                text: chunk.text.clone(),
                similarity,
            })
            .collect()
    }

    /// Score every record against the query and keep the scorer's best.
    pub fn candidates(
        &self,
        query: &str,
        query_embedding: &[f32],
        scorer: &CandidateScorer,
    ) -> Vec<ScoredCandidate> {
        let hits = self.index.rank(query_embedding, self.index.len(), |_| true);
        scorer.rank(query, hits.into_iter().map(|(chunk, s)| (&chunk.record, s)))
    }

    /// Render retrieved chunks for the prompt. No chunks renders as empty text.
    pub fn format_context(chunks: &[RetrievedChunk]) -> String {
        if chunks.is_empty() {
            return String::new();
        }
        let body: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        format!("Retrieved Context:\n{}", body.join("\n"))
    }
}
