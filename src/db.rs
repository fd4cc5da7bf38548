use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::ConnectOptions;
use std::time::Duration;

use crate::config::Config;

/// Open a fresh connection to the store's database file.
///
/// Every store operation opens its own connection and closes it when done;
/// nothing is held open between calls.
pub async fn connect(config: &Config) -> Result<SqliteConnection> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create vector store directory: {}", parent.display())
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(config.db.busy_timeout_ms));

    let conn = options
        .connect()
        .await
        .with_context(|| format!("Failed to open vector store: {}", db_path.display()))?;

    Ok(conn)
}
