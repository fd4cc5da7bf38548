use thiserror::Error;

/// A stored row that could not be turned back into a [`StoredChunk`](crate::models::StoredChunk).
///
/// Decode failures are local to one row: the query path logs and skips the
/// row instead of failing the whole query.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("embedding blob length {0} is not a multiple of 4")]
    BlobLength(usize),

    #[error("invalid embedding dimension: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("embedding component {index} is not finite")]
    NonFinite { index: usize },

    #[error("invalid metadata JSON: {0}")]
    Metadata(#[from] serde_json::Error),
}
