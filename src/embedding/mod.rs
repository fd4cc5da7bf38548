//! Embedding provider abstraction and implementations.
//!
//! Defines the [`EmbeddingProvider`] trait and its two implementations:
//! - **`ModelProvider`**: runs a sentence-embedding model locally via
//!   fastembed (behind the `local-embeddings-fastembed` feature).
//! - **[`HashProvider`]**: deterministic SHA-256 based vectors; needs no
//!   model, no network and cannot fail.
//!
//! Also provides the BLOB codec used by the SQLite store:
//! - [`vec_to_blob`]: encode a `Vec<f32>` as little-endian bytes
//! - [`blob_to_vec`]: decode it back, rejecting truncated blobs
//!
//! # Provider Selection
//!
//! [`create_provider`] picks the provider once. With `provider = "auto"` it
//! tries to load the model and, if that fails for any reason, falls back to
//! the hash provider for the lifetime of the returned value:
//!
//! ```rust
//! # use vector_store::config::EmbeddingConfig;
//! # use vector_store::embedding::create_provider;
//! let mut config = EmbeddingConfig::default();
//! config.provider = "hash".to_string();
//! let provider = create_provider(&config).unwrap();
//! assert_eq!(provider.dims(), 32);
//! ```

mod hash;
#[cfg(feature = "local-embeddings-fastembed")]
mod local_fastembed;

pub use hash::{hash_embedding, HashProvider};
#[cfg(feature = "local-embeddings-fastembed")]
pub use local_fastembed::ModelProvider;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::EmbeddingConfig;
use crate::error::DecodeError;

/// Trait for embedding providers.
///
/// Implementations return one vector per input text, in input order, each
/// exactly [`dims`](EmbeddingProvider::dims) long.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"all-minilm-l6-v2"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `384`).
    fn dims(&self) -> usize;
    /// Embed a batch of texts.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query text.
    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }
}

/// Create the [`EmbeddingProvider`] for a store.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"hash"` | [`HashProvider`] |
/// | `"auto"` | `ModelProvider`, or [`HashProvider`] if the model cannot be loaded |
///
/// A model that fails to load is not an error; it is logged once and the
/// hash provider is used instead.
///
/// The fallback has different dimensions from the model, so against a store
/// already populated by the model provider every ingest and query fails with
/// a provider mismatch until the store is reset.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hash" => Ok(Box::new(HashProvider::new(config.dims))),
        "auto" => match load_model_provider(config) {
            Ok(provider) => {
                info!(
                    model = provider.model_name(),
                    dims = provider.dims(),
                    "loaded embedding model"
                );
                Ok(provider)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    dims = config.dims,
                    "embedding model unavailable, using deterministic hash embeddings"
                );
                Ok(Box::new(HashProvider::new(config.dims)))
            }
        },
        other => bail!("Unknown embedding provider: {}", other),
    }
}

#[cfg(feature = "local-embeddings-fastembed")]
fn load_model_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    Ok(Box::new(ModelProvider::new(config)?))
}

#[cfg(not(feature = "local-embeddings-fastembed"))]
fn load_model_provider(_config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    bail!("Model-backed embeddings require --features local-embeddings-fastembed")
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing
/// a BLOB of `vec.len() × 4` bytes.
///
/// ```rust
/// use vector_store::embedding::{vec_to_blob, blob_to_vec};
///
/// let v = vec![1.0f32, -2.5, 3.125];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 12);
/// assert_eq!(blob_to_vec(&blob).unwrap(), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector.
///
/// Reverses [`vec_to_blob`]. A blob whose length is not a multiple of 4
/// was not written by this store and is rejected.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if blob.len() % 4 != 0 {
        return Err(DecodeError::BlobLength(blob.len()));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
