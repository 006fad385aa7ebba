//! In-process vector index shared by every memory backend.
//!
//! Records are kept in insertion order together with their embedding. The
//! first stored vector fixes the index dimension; later vectors must match.

use onward_types::error::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::similarity::{cosine_similarity, rank_top_k};

/// An item stored together with its embedding.
///
/// Serializes flat: the item's fields plus an `embedding` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedded<T> {
    #[serde(flatten)]
    pub item: T,
    pub embedding: Vec<f32>,
}

/// Insertion-ordered records with brute-force cosine ranking.
#[derive(Debug, Clone)]
pub struct VectorIndex<T> {
    records: Vec<Embedded<T>>,
    dimension: Option<usize>,
}

impl<T> Default for VectorIndex<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dimension: None,
        }
    }
}

impl<T> VectorIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from persisted records.
    ///
    /// The first record with a non-empty embedding fixes the dimension;
    /// records that disagree with it are dropped with a warning.
    pub fn from_records(records: Vec<Embedded<T>>) -> Self {
        let mut index = Self::new();
        let mut dropped = 0usize;
        for record in records {
            if index.push(record.item, record.embedding).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            warn!(
                dropped,
                dimension = ?index.dimension,
                "Dropped persisted records with inconsistent embeddings"
            );
        }
        index
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Embedded<T>] {
        &self.records
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.records.iter().map(|r| &r.item)
    }

    /// Append a record, enforcing the index dimension.
    pub fn push(&mut self, item: T, embedding: Vec<f32>) -> Result<(), RepositoryError> {
        if embedding.is_empty() {
            return Err(RepositoryError::Embedding(
                "cannot store an empty embedding".to_string(),
            ));
        }
        match self.dimension {
            Some(dim) if dim != embedding.len() => {
                return Err(RepositoryError::Conflict(format!(
                    "embedding dimension {} does not match store dimension {dim}",
                    embedding.len()
                )));
            }
            Some(_) => {}
            None => self.dimension = Some(embedding.len()),
        }
        self.records.push(Embedded { item, embedding });
        Ok(())
    }

    /// Remove every record for which `keep` returns false. Returns the removed count.
    ///
    /// An index emptied this way forgets its dimension.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| keep(&r.item));
        if self.records.is_empty() {
            self.dimension = None;
        }
        before - self.records.len()
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items().find(|item| predicate(item))
    }

    pub fn find_mut(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.records
            .iter_mut()
            .map(|r| &mut r.item)
            .find(|item| predicate(item))
    }

    /// Top-`k` items passing `filter`, ranked by cosine similarity to `query`.
    ///
    /// A query whose dimension differs from the index yields no results.
    pub fn rank(
        &self,
        query: &[f32],
        k: usize,
        mut filter: impl FnMut(&T) -> bool,
    ) -> Vec<(&T, f32)> {
        if k == 0 || self.records.is_empty() {
            return Vec::new();
        }
        if self.dimension != Some(query.len()) {
            warn!(
                query_dimension = query.len(),
                index_dimension = ?self.dimension,
                "Query embedding dimension does not match stored vectors"
            );
            return Vec::new();
        }

        let candidates: Vec<&Embedded<T>> =
            self.records.iter().filter(|r| filter(&r.item)).collect();
        let scores: Vec<f32> = candidates
            .iter()
            .map(|r| cosine_similarity(query, &r.embedding))
            .collect();

        rank_top_k(&scores, k)
            .into_iter()
            .map(|i| (&candidates[i].item, scores[i]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_fixes_dimension() {
        let mut index = VectorIndex::new();
        index.push("a", vec![1.0, 0.0]).unwrap();
        let err = index.push("b", vec![1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(index.len(), 1);
        assert_eq!(index.dimension(), Some(2));
    }

    #[test]
    fn test_push_rejects_empty_embedding() {
        let mut index: VectorIndex<&str> = VectorIndex::new();
        assert!(matches!(
            index.push("a", vec![]),
            Err(RepositoryError::Embedding(_))
        ));
    }

    #[test]
    fn test_rank_filters_and_orders() {
        let mut index = VectorIndex::new();
        index.push(1, vec![1.0, 0.0]).unwrap();
        index.push(2, vec![0.0, 1.0]).unwrap();
        index.push(3, vec![0.9, 0.1]).unwrap();
        index.push(4, vec![1.0, 0.0]).unwrap();

        let ranked: Vec<i32> = index
            .rank(&[1.0, 0.0], 3, |_| true)
            .into_iter()
            .map(|(item, _)| *item)
            .collect();
        // 1 and 4 tie; the later insert wins.
        assert_eq!(ranked, vec![4, 1, 3]);

        let odd: Vec<i32> = index
            .rank(&[1.0, 0.0], 5, |item| item % 2 == 1)
            .into_iter()
            .map(|(item, _)| *item)
            .collect();
        assert_eq!(odd, vec![1, 3]);
    }

    #[test]
    fn test_rank_with_wrong_dimension_is_empty() {
        let mut index = VectorIndex::new();
        index.push("a", vec![1.0, 0.0]).unwrap();
        assert!(index.rank(&[1.0, 0.0, 0.0], 3, |_| true).is_empty());
    }

    #[test]
    fn test_retain_to_empty_resets_dimension() {
        let mut index = VectorIndex::new();
        index.push("a", vec![1.0, 0.0]).unwrap();
        assert_eq!(index.retain(|_| false), 1);
        assert_eq!(index.dimension(), None);
        index.push("b", vec![1.0, 0.0, 0.0]).unwrap();
        assert_eq!(index.dimension(), Some(3));
    }

    #[test]
    fn test_from_records_drops_inconsistent() {
        let records = vec![
            Embedded { item: "a".to_string(), embedding: vec![1.0, 0.0] },
            Embedded { item: "b".to_string(), embedding: vec![1.0] },
            Embedded { item: "c".to_string(), embedding: vec![0.0, 1.0] },
        ];
        let index = VectorIndex::from_records(records);
        let items: Vec<&String> = index.items().collect();
        assert_eq!(items, vec!["a", "c"]);
    }

    #[test]
    fn test_embedded_serializes_flat() {
        #[derive(Serialize)]
        struct Item {
            name: &'static str,
        }
        let record = Embedded {
            item: Item { name: "x" },
            embedding: vec![0.5],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "x");
        assert_eq!(value["embedding"][0], 0.5);
    }
}
