//! Cosine similarity and top-k ranking.

use std::cmp::Ordering;

/// Cosine similarity between two vectors, in `[-1.0, 1.0]`.
///
/// Returns `0.0` when the lengths differ, either input is empty, or either
/// vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Indices of the `k` highest scores, best first.
///
/// Equal scores prefer the higher index (the more recently inserted item).
/// NaN scores sort after every real score.
pub fn rank_top_k(scores: &[f32], k: usize) -> Vec<usize> {
    if k == 0 || scores.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (scores[a], scores[b]);
        match (sa.is_nan(), sb.is_nan()) {
            (true, true) => b.cmp(&a),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => sb
                .partial_cmp(&sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.cmp(&a)),
        }
    });
    order.truncate(k);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 5.0]).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_inputs_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_magnitude_does_not_matter() {
        let a = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((a - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_top_k_orders_descending() {
        let ranked = rank_top_k(&[0.1, 0.9, 0.5, 0.7], 3);
        assert_eq!(ranked, vec![1, 3, 2]);
    }

    #[test]
    fn test_rank_top_k_ties_prefer_newer() {
        let ranked = rank_top_k(&[0.8, 0.8, 0.2, 0.8], 2);
        assert_eq!(ranked, vec![3, 1]);
    }

    #[test]
    fn test_rank_top_k_nan_sorts_last() {
        let ranked = rank_top_k(&[f32::NAN, 0.1, -0.5], 3);
        assert_eq!(ranked, vec![1, 2, 0]);
    }

    #[test]
    fn test_rank_top_k_edge_cases() {
        assert!(rank_top_k(&[0.5, 0.6], 0).is_empty());
        assert!(rank_top_k(&[], 3).is_empty());
        assert_eq!(rank_top_k(&[0.5], 10), vec![0]);
    }
}
