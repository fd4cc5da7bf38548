//! Administrative commands behind the `vstore` CLI.
//!
//! Each `run_*` function performs one operation against a [`VectorStore`]
//! and prints its outcome to stdout. Orchestration scripts parse these
//! lines (`vectors: N`, `ingested N chunks from PATH`), so their shape is
//! part of the interface.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::Metadata;
use crate::store::VectorStore;

pub fn run_init(store: &VectorStore) -> Result<()> {
    store.init()?;
    println!(
        "Vector store initialized at {}",
        store.config().db.path.display()
    );
    Ok(())
}

pub fn run_count(store: &VectorStore) -> Result<()> {
    println!("vectors: {}", store.count()?);
    Ok(())
}

pub fn run_reset(store: &VectorStore) -> Result<()> {
    store.reset()?;
    println!("vector store reset");
    Ok(())
}

pub fn run_delete(store: &VectorStore, source_id: &str) -> Result<()> {
    store.delete_source(source_id)?;
    println!("deleted source {}", source_id);
    Ok(())
}

/// Read a file and ingest its contents as `source_id`.
pub fn run_ingest_file(
    store: &VectorStore,
    source_id: &str,
    path: &Path,
    metadata: &Metadata,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let stored = store.ingest(source_id, &text, metadata)?;
    println!("ingested {} chunks from {}", stored, path.display());
    Ok(())
}

/// Run one query and print the ranked hits, as text or as a JSON array.
pub fn run_query(store: &VectorStore, text: &str, top_k: usize, json: bool) -> Result<()> {
    let results = store.query(text, top_k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.4}] {}", i + 1, result.score, result.source_id);
        println!("    excerpt: \"{}\"", excerpt(&result.content, 160));
        if !result.metadata.is_empty() {
            println!(
                "    metadata: {}",
                serde_json::Value::Object(result.metadata.clone())
            );
        }
        println!();
    }
    Ok(())
}

pub fn run_stats(store: &VectorStore) -> Result<()> {
    let config = store.config();
    let total = store.count()?;
    let identity = store.identity()?;
    let created_at = store.created_at()?;
    let sources = store.source_counts()?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Vector Store — Stats");
    println!("====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Provider:    {} ({} dims)",
        store.provider().model_name(),
        store.provider().dims()
    );
    match identity {
        Some(identity) => println!("  Stored as:   {} ({} dims)", identity.model, identity.dims),
        None => println!("  Stored as:   (empty)"),
    }
    if let Some(created_at) = created_at {
        println!("  Since:       {}", created_at.format("%Y-%m-%d %H:%M"));
    }
    println!();
    println!("  Vectors:     {}", total);

    if !sources.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<32} {:>8}", "SOURCE", "CHUNKS");
        println!("  {}", "-".repeat(41));
        for s in &sources {
            println!("  {:<32} {:>8}", s.source_id, s.chunks);
        }
    }

    println!();
    Ok(())
}

/// Build metadata from `key=value` pairs.
///
/// Values that parse as JSON (`3`, `true`, `{"a":1}`) are stored as such;
/// anything else is stored as a string.
pub fn metadata_from_pairs(pairs: &[(String, String)]) -> Metadata {
    pairs
        .iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.clone()));
            (key.clone(), value)
        })
        .collect()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() <= max_chars {
        return flat.to_string();
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
