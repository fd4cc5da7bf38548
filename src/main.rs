//! # vstore CLI
//!
//! Administrative front end for the vector store: count, reset, ingest a
//! file, run an ad-hoc query and inspect the database.
//!
//! ## Usage
//!
//! ```bash
//! vstore [--config ./config/vstore.toml] [--db PATH] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `vstore init` | Create the database and schema |
//! | `vstore count` | Print the total number of stored vectors |
//! | `vstore reset` | Discard every stored vector |
//! | `vstore ingest <SOURCE_ID> <PATH>` | Replace a source with a file's paragraphs |
//! | `vstore delete <SOURCE_ID>` | Remove one source |
//! | `vstore query "<text>"` | Rank stored chunks against a query |
//! | `vstore stats` | Database, provider and per-source overview |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vector_store::admin;
use vector_store::config::{self, Config};
use vector_store::store::VectorStore;

/// Command-line interface for a persistent semantic retrieval store.
#[derive(Parser)]
#[command(
    name = "vstore",
    about = "vstore — a persistent semantic retrieval store",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file; overrides `[db].path` from the config.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level (`RUST_LOG` takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and schema. Idempotent.
    Init,

    /// Print the number of stored vectors.
    Count,

    /// Permanently discard every stored vector.
    Reset,

    /// Ingest a file as a source, replacing that source's previous chunks.
    Ingest {
        /// Logical document id (e.g. `PROGRAM_FEATURES`).
        source_id: String,

        /// File to read.
        path: PathBuf,

        /// Metadata attached to every chunk, as `key=value`. Repeatable.
        #[arg(long = "meta", value_parser = parse_key_val)]
        meta: Vec<(String, String)>,
    },

    /// Remove every chunk of a source.
    Delete {
        source_id: String,
    },

    /// Rank stored chunks by similarity to a query.
    Query {
        /// The query text.
        text: String,

        /// Maximum number of results. Defaults to `[retrieval].default_top_k`.
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Show database, provider and per-source counts.
    Stats,
}

/// Parse a `key=value` pair for `--meta` arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "vector_store=debug,vstore=debug"
    } else {
        "vector_store=info,vstore=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    if let Some(db) = cli.db {
        cfg.db.path = db;
    }
    let default_top_k = cfg.retrieval.default_top_k;

    let store = VectorStore::open(cfg)?;

    match cli.command {
        Commands::Init => admin::run_init(&store)?,
        Commands::Count => admin::run_count(&store)?,
        Commands::Reset => admin::run_reset(&store)?,
        Commands::Ingest {
            source_id,
            path,
            meta,
        } => {
            let metadata = admin::metadata_from_pairs(&meta);
            admin::run_ingest_file(&store, &source_id, &path, &metadata)?;
        }
        Commands::Delete { source_id } => admin::run_delete(&store, &source_id)?,
        Commands::Query { text, top_k, json } => {
            admin::run_query(&store, &text, top_k.unwrap_or(default_top_k), json)?;
        }
        Commands::Stats => admin::run_stats(&store)?,
    }

    Ok(())
}
