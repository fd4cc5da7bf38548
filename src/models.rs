//! Data types that flow between the store, the ranker and callers.

use serde::Serialize;

/// Opaque per-chunk metadata. Stored verbatim as JSON, never interpreted.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One persisted row of the `vectors` table, decoded.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: i64,
    pub source_id: String,
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

/// A ranked query hit.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub score: f32,
    pub source_id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// Chunk count for one source, as reported by `vstore stats`.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source_id: String,
    pub chunks: i64,
}
