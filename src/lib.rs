//! # vector-store
//!
//! A persistent, local-first semantic retrieval store.
//!
//! Text documents are ingested under a source id, split into paragraph
//! chunks, embedded and kept in a single SQLite table. Queries embed the
//! query text and rank every stored chunk by cosine similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌───────────┐   ┌──────────┐
//! │  ingest  │──▶│ Chunker │──▶│ Embedding │──▶│  SQLite  │
//! └──────────┘   └─────────┘   │ Provider  │   │ vectors  │
//!                              └─────▲─────┘   └────┬─────┘
//! ┌──────────┐                       │              │
//! │  query   │───────────────────────┘              ▼
//! └──────────┘                               ┌────────────┐
//!                                            │   Ranker   │
//!                                            └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vector_store::config::Config;
//! use vector_store::models::Metadata;
//! use vector_store::store::VectorStore;
//!
//! # fn main() -> anyhow::Result<()> {
//! let store = VectorStore::open(Config::with_db_path("./vector_db/vectors.sqlite"))?;
//! store.ingest("PROGRAM_FEATURES", "para one\n\npara two", &Metadata::new())?;
//! for hit in store.query("para one", 5)? {
//!     println!("{:.3} {} {}", hit.score, hit.source_id, hit.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`chunk`] | Paragraph chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`search`] | Cosine similarity ranking |
//! | [`store`] | The persistent store |
//! | [`admin`] | Administrative commands behind the `vstore` CLI |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod admin;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod migrate;
pub mod models;
pub mod search;
pub mod store;
