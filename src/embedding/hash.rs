//! Deterministic hash-based embeddings.
//!
//! The vector carries no semantics beyond identity: equal texts map to
//! equal vectors, anything else is effectively random. It keeps the store
//! usable (and testable) when no embedding model is available.

use anyhow::Result;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;

/// Each 4-byte word is reduced modulo this before scaling into `[0, 1)`.
const BUCKETS: u32 = 10_000;

/// Embedding provider backed by [`hash_embedding`].
pub struct HashProvider {
    dims: usize,
}

impl HashProvider {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl EmbeddingProvider for HashProvider {
    fn model_name(&self) -> &str {
        "hash-sha256"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| hash_embedding(text, self.dims))
            .collect())
    }
}

/// Compute the unit-length hash embedding of `text`.
///
/// The SHA-256 digest of the text is extended by re-hashing the whole
/// buffer until it holds `dims * 4` bytes. Every big-endian `u32` word is
/// bucketed into `[0, 1)` and the result is L2-normalized.
pub fn hash_embedding(text: &str, dims: usize) -> Vec<f32> {
    let needed = dims * 4;
    let mut bytes = Sha256::digest(text.as_bytes()).to_vec();
    while bytes.len() < needed {
        let next = Sha256::digest(&bytes);
        bytes.extend_from_slice(&next);
    }

    let values: Vec<f64> = bytes
        .chunks_exact(4)
        .take(dims)
        .map(|word| {
            let n = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
            f64::from(n % BUCKETS) / f64::from(BUCKETS)
        })
        .collect();

    let norm = values.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm = if norm == 0.0 { 1.0 } else { norm };

    values.iter().map(|x| (x / norm) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_bit_identical_for_same_text() {
        let a = hash_embedding("PROGRAM_FEATURES", 32);
        let b = hash_embedding("PROGRAM_FEATURES", 32);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_texts_differ() {
        assert_ne!(hash_embedding("alpha beta", 32), hash_embedding("gamma delta", 32));
    }

    #[test]
    fn test_requested_dimension() {
        assert_eq!(hash_embedding("x", 32).len(), 32);
        assert_eq!(hash_embedding("x", 7).len(), 7);
        assert_eq!(hash_embedding("x", 384).len(), 384);
    }

    #[test]
    fn test_unit_norm() {
        for text in ["", "a", "para one", "a much longer paragraph of text"] {
            let v = hash_embedding(text, 32);
            assert!((norm(&v) - 1.0).abs() < 1e-5, "norm of {:?}", text);
        }
    }

    #[test]
    fn test_components_non_negative() {
        assert!(hash_embedding("values", 64).iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn test_prefix_stable_across_dimensions() {
        // The expansion only appends, so a shorter vector is a rescaled prefix.
        let short = hash_embedding("prefix", 8);
        let long = hash_embedding("prefix", 32);
        let head = &long[..8];
        let head_norm = norm(head);
        for (h, s) in head.iter().zip(short.iter()) {
            assert!((h / head_norm - s).abs() < 1e-5);
        }
    }

    #[test]
    fn test_provider_preserves_order() {
        let provider = HashProvider::new(16);
        let texts = vec!["b".to_string(), "a".to_string()];
        let out = provider.embed(&texts).unwrap();
        assert_eq!(out[0], hash_embedding("b", 16));
        assert_eq!(out[1], hash_embedding("a", 16));
    }
}
