//! TOML configuration for the vector store.
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below, so `Config::default()` is a usable configuration that
//! stores vectors under `./vector_db/vectors.sqlite`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// How long a connection waits on another writer's lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./vector_db/vectors.sqlite")
}
fn default_busy_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"auto"` tries the local model and falls back to hashing; `"hash"`
    /// always uses the deterministic provider.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Dimension of the hash provider's vectors.
    #[serde(default = "default_hash_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: default_hash_dims(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_provider() -> String {
    "auto".to_string()
}
fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_hash_dims() -> usize {
    32
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

impl Config {
    /// Default configuration pointing at a specific database file.
    pub fn with_db_path(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.db.path = path.into();
        config
    }

    /// Same as [`with_db_path`](Self::with_db_path) but pinned to the hash
    /// provider, so no model is ever loaded.
    pub fn hashed(path: impl Into<PathBuf>) -> Self {
        let mut config = Self::with_db_path(path);
        config.embedding.provider = "hash".to_string();
        config
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if config.retrieval.default_top_k == 0 {
        anyhow::bail!("retrieval.default_top_k must be >= 1");
    }

    match config.embedding.provider.as_str() {
        "auto" | "hash" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be auto or hash.",
            other
        ),
    }

    Ok(())
}
