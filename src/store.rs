//! The persistent vector store.
//!
//! [`VectorStore`] owns a database path and an [`EmbeddingProvider`] and
//! exposes a synchronous API: ingest, delete, count, reset and query. The
//! database is driven through sqlx on a private single-threaded tokio
//! runtime, so callers never see a future.
//!
//! # Consistency
//!
//! Ingest deletes a source's previous rows and inserts the new ones inside
//! one transaction. SQLite runs in WAL mode, so a concurrent query (from
//! this or another process) sees either the old rows or the new rows,
//! never an empty or half-written source.
//!
//! # Dimension
//!
//! The first non-empty ingest records the provider's model name and
//! dimension in `store_meta`. Any later ingest or query through a provider
//! with a different identity fails until the store is [`reset`](VectorStore::reset).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::{Connection, Row};
use tracing::{debug, info, warn};

use crate::chunk::chunk_text;
use crate::config::{self, Config};
use crate::db;
use crate::embedding::{blob_to_vec, create_provider, vec_to_blob, EmbeddingProvider};
use crate::error::DecodeError;
use crate::migrate;
use crate::models::{Metadata, QueryResult, SourceCount, StoredChunk};
use crate::search::rank;

/// Model name and dimension recorded for the stored vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreIdentity {
    pub model: String,
    pub dims: usize,
}

/// A file-backed semantic retrieval store.
///
/// The embedding provider is chosen once, in [`open`](Self::open), and
/// kept for the lifetime of the value. Methods block the calling thread
/// and must not be called from inside an async runtime.
pub struct VectorStore {
    config: Config,
    provider: Box<dyn EmbeddingProvider>,
    runtime: tokio::runtime::Runtime,
}

impl VectorStore {
    /// Open a store, selecting the embedding provider from `config.embedding`.
    ///
    /// Nothing touches the disk until the first operation.
    pub fn open(config: Config) -> Result<Self> {
        config::validate(&config)?;
        let provider = create_provider(&config.embedding)?;
        Self::with_provider(config, provider)
    }

    /// Open a store with an explicit provider.
    pub fn with_provider(config: Config, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start storage runtime")?;

        Ok(Self {
            config,
            provider,
            runtime,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Create the database file and schema if missing. Idempotent.
    ///
    /// Every other operation does this lazily; this exists for callers that
    /// want the file to exist up front.
    pub fn init(&self) -> Result<()> {
        self.runtime.block_on(async {
            let conn = self.connect().await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(())
        })
    }

    /// Replace everything stored for `source_id` with the chunks of `text`.
    ///
    /// Returns the number of chunks stored. Text with no non-blank
    /// paragraphs is a no-op returning 0; existing rows for the source are
    /// left in place in that case.
    pub fn ingest(&self, source_id: &str, text: &str, metadata: &Metadata) -> Result<usize> {
        let chunks = chunk_text(text);
        if chunks.is_empty() {
            debug!(source_id, "nothing to ingest");
            return Ok(0);
        }

        let vectors = self.provider.embed(&chunks)?;
        if vectors.len() != chunks.len() {
            bail!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let stored = self
            .runtime
            .block_on(self.replace_source(source_id, &chunks, &vectors, metadata))?;
        info!(source_id, chunks = stored, "ingested source");
        Ok(stored)
    }

    /// Remove every chunk of `source_id`. Idempotent.
    pub fn delete_source(&self, source_id: &str) -> Result<()> {
        let removed = self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let removed = sqlx::query("DELETE FROM vectors WHERE source_id = ?")
                .bind(source_id)
                .execute(&mut conn)
                .await?
                .rows_affected();
            conn.close().await?;
            Ok::<_, anyhow::Error>(removed)
        })?;
        info!(source_id, removed, "deleted source");
        Ok(())
    }

    /// Total number of stored chunks across all sources.
    pub fn count(&self) -> Result<i64> {
        self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors")
                .fetch_one(&mut conn)
                .await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(count)
        })
    }

    /// Chunk counts per source, ordered by source id.
    pub fn source_counts(&self) -> Result<Vec<SourceCount>> {
        self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let rows = sqlx::query(
                "SELECT source_id, COUNT(*) AS chunks FROM vectors GROUP BY source_id ORDER BY source_id",
            )
            .fetch_all(&mut conn)
            .await?;
            conn.close().await?;

            let counts = rows
                .iter()
                .map(|row| -> Result<SourceCount, sqlx::Error> {
                    Ok(SourceCount {
                        source_id: row.try_get("source_id")?,
                        chunks: row.try_get("chunks")?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, anyhow::Error>(counts)
        })
    }

    /// The chunks stored for one source, in insertion order.
    ///
    /// Rows that fail to decode are skipped, as in [`query`](Self::query).
    pub fn source_chunks(&self, source_id: &str) -> Result<Vec<StoredChunk>> {
        self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let mut tx = conn.begin().await?;
            let identity = read_identity(&mut tx).await?;
            let chunks = load_chunks(&mut tx, Some(source_id), identity.map(|i| i.dims)).await?;
            tx.commit().await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(chunks)
        })
    }

    /// The model and dimension recorded for this store, if anything has
    /// been ingested since it was created or last reset.
    pub fn identity(&self) -> Result<Option<StoreIdentity>> {
        self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let identity = read_identity(&mut conn).await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(identity)
        })
    }

    /// When the current provider identity was first recorded.
    pub fn created_at(&self) -> Result<Option<DateTime<Utc>>> {
        let raw = self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            let raw: Option<String> = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = 'created_at'")
                .fetch_optional(&mut conn)
                .await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(raw)
        })?;

        raw.map(|ts| {
            DateTime::parse_from_rfc3339(&ts)
                .map(|dt| dt.with_timezone(&Utc))
                .with_context(|| format!("Invalid stored timestamp: {}", ts))
        })
        .transpose()
    }

    /// Rank every stored chunk against `text` and return the best `top_k`.
    ///
    /// An empty store yields an empty result without embedding the query.
    /// Rows whose metadata or embedding cannot be decoded are logged and
    /// skipped.
    pub fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryResult>> {
        let (identity, chunks) = self.runtime.block_on(async {
            let mut conn = self.connect().await?;
            // One read transaction so rows and identity come from the same snapshot.
            let mut tx = conn.begin().await?;
            let identity = read_identity(&mut tx).await?;
            let chunks = load_chunks(&mut tx, None, identity.as_ref().map(|i| i.dims)).await?;
            tx.commit().await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>((identity, chunks))
        })?;

        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(identity) = &identity {
            self.check_identity(identity)?;
        }

        let query_vec = self.provider.embed_query(text)?;
        let scanned = chunks.len();
        let results = rank(&query_vec, chunks, top_k);
        debug!(scanned, returned = results.len(), top_k, "query ranked");
        Ok(results)
    }

    /// Discard the whole stored table. Irreversible.
    ///
    /// The recorded provider identity goes with it, so the next ingest may
    /// use a different model.
    pub fn reset(&self) -> Result<()> {
        self.runtime.block_on(async {
            let mut conn = db::connect(&self.config).await?;
            let mut tx = conn.begin().await?;
            // Dropping an AUTOINCREMENT table also clears its sqlite_sequence row.
            sqlx::query("DROP TABLE IF EXISTS vectors")
                .execute(&mut *tx)
                .await?;
            sqlx::query("DROP TABLE IF EXISTS store_meta")
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            conn.close().await?;
            Ok::<_, anyhow::Error>(())
        })?;
        info!(path = %self.config.db.path.display(), "vector store reset");
        Ok(())
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        let mut conn = db::connect(&self.config).await?;
        migrate::ensure_schema(&mut conn).await?;
        Ok(conn)
    }

    async fn replace_source(
        &self,
        source_id: &str,
        chunks: &[String],
        vectors: &[Vec<f32>],
        metadata: &Metadata,
    ) -> Result<usize> {
        let metadata_json = serde_json::to_string(metadata)?;

        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;

        self.record_identity(&mut tx).await?;

        sqlx::query("DELETE FROM vectors WHERE source_id = ?")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        for (content, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                "INSERT INTO vectors (source_id, content, metadata, embedding) VALUES (?, ?, ?, ?)",
            )
            .bind(source_id)
            .bind(content)
            .bind(&metadata_json)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        conn.close().await?;
        Ok(chunks.len())
    }

    /// Record the active provider on first use, or verify it matches.
    async fn record_identity(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO store_meta (key, value) VALUES
                ('model', ?), ('dims', ?), ('created_at', ?)
            "#,
        )
        .bind(self.provider.model_name())
        .bind(self.provider.dims().to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await?;

        match read_identity(conn).await? {
            Some(identity) => self.check_identity(&identity),
            None => bail!("store_meta is missing the provider identity"),
        }
    }

    fn check_identity(&self, identity: &StoreIdentity) -> Result<()> {
        let active = StoreIdentity {
            model: self.provider.model_name().to_string(),
            dims: self.provider.dims(),
        };
        if *identity != active {
            bail!(
                "vector store at {} holds {} embeddings ({} dims) but the active provider is {} ({} dims); \
                 reset the store to switch providers",
                self.config.db.path.display(),
                identity.model,
                identity.dims,
                active.model,
                active.dims
            );
        }
        Ok(())
    }
}

async fn read_identity(conn: &mut SqliteConnection) -> Result<Option<StoreIdentity>> {
    let model: Option<String> =
        sqlx::query_scalar("SELECT value FROM store_meta WHERE key = 'model'")
            .fetch_optional(&mut *conn)
            .await?;
    let dims: Option<String> = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = 'dims'")
        .fetch_optional(&mut *conn)
        .await?;

    match (model, dims) {
        (Some(model), Some(dims)) => {
            let dims = dims
                .parse()
                .with_context(|| format!("Invalid stored embedding dimension: {}", dims))?;
            Ok(Some(StoreIdentity { model, dims }))
        }
        _ => Ok(None),
    }
}

/// Load rows in insertion order, skipping any that fail to decode.
async fn load_chunks(
    conn: &mut SqliteConnection,
    source_id: Option<&str>,
    dims: Option<usize>,
) -> Result<Vec<StoredChunk>> {
    let rows = match source_id {
        Some(source_id) => {
            sqlx::query(
                "SELECT id, source_id, content, metadata, embedding FROM vectors WHERE source_id = ? ORDER BY id",
            )
            .bind(source_id)
            .fetch_all(&mut *conn)
            .await?
        }
        None => {
            sqlx::query("SELECT id, source_id, content, metadata, embedding FROM vectors ORDER BY id")
                .fetch_all(&mut *conn)
                .await?
        }
    };

    let mut chunks = Vec::with_capacity(rows.len());
    for row in &rows {
        let id: i64 = row.try_get("id")?;
        let source_id: String = row.try_get("source_id")?;
        let content: String = row.try_get("content")?;
        let metadata: Option<String> = row.try_get("metadata")?;
        let blob: Vec<u8> = row.try_get("embedding")?;

        match decode_chunk(id, source_id, content, metadata.as_deref(), &blob, dims) {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => warn!(chunk_id = id, error = %e, "skipping undecodable chunk"),
        }
    }
    Ok(chunks)
}

fn decode_chunk(
    id: i64,
    source_id: String,
    content: String,
    metadata: Option<&str>,
    blob: &[u8],
    dims: Option<usize>,
) -> Result<StoredChunk, DecodeError> {
    let embedding = blob_to_vec(blob)?;
    if let Some(expected) = dims {
        if embedding.len() != expected {
            return Err(DecodeError::Dimension {
                expected,
                actual: embedding.len(),
            });
        }
    }
    if let Some(index) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(DecodeError::NonFinite { index });
    }

    let metadata = match metadata {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
        _ => Metadata::new(),
    };

    Ok(StoredChunk {
        id,
        source_id,
        content,
        metadata,
        embedding,
    })
}
