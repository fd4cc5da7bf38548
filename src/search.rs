//! Exhaustive cosine-similarity ranking.
//!
//! Every stored vector is scored against the query; there is no index and
//! no candidate pruning, so the top-K is always exact.
//!
//! # Ranking
//!
//! 1. Score each chunk with [`cosine_similarity`].
//! 2. Stable sort by score, descending (equal scores keep insertion order).
//! 3. Truncate to `top_k`.


use crate::models::{QueryResult, StoredChunk};

/// Compute cosine similarity between two vectors.
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
///
/// A zero norm is replaced by `1.0`, so a zero vector scores `0.0` instead
/// of dividing by zero. For vectors of different lengths only the common
/// prefix contributes to the dot product.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
    }
    for x in a {
        norm_a += x * x;
    }
    for y in b {
        norm_b += y * y;
    }

    let norm_a = nonzero(norm_a.sqrt());
    let norm_b = nonzero(norm_b.sqrt());

    dot / (norm_a * norm_b)
}

fn nonzero(norm: f32) -> f32 {
    if norm == 0.0 {
        1.0
    } else {
        norm
    }
}

/// Rank `chunks` against `query` and keep the best `top_k`.
///
/// `chunks` must be in insertion order for ties to resolve oldest-first.
pub fn rank(query: &[f32], chunks: Vec<StoredChunk>, top_k: usize) -> Vec<QueryResult> {
    let mut results: Vec<QueryResult> = chunks
        .into_iter()
        .map(|chunk| QueryResult {
            score: cosine_similarity(query, &chunk.embedding),
            source_id: chunk.source_id,
            content: chunk.content,
            metadata: chunk.metadata,
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(top_k);
    results
}
