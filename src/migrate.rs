use anyhow::Result;
use sqlx::sqlite::SqliteConnection;

/// Create the store's tables if they are missing. Idempotent.
pub async fn ensure_schema(conn: &mut SqliteConnection) -> Result<()> {
    // AUTOINCREMENT keeps ids monotonic: a deleted id is never handed out again.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vectors (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT,
            embedding BLOB NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vectors_source_id ON vectors(source_id)")
        .execute(&mut *conn)
        .await?;

    // Records which provider (model + dims) the stored vectors came from.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}
