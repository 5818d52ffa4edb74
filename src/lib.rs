//! # docmesh
//!
//! Document retrieval core: heading-aware chunking, hybrid result fusion,
//! and link-graph impact analysis.
//!
//! docmesh sits between raw document text (or raw retrieval calls) and a
//! final ordered result set. Everything with I/O of its own (persistent
//! storage, embedding models, vector indexes, HTTP) lives behind the
//! [`Store`](store::Store) trait and is supplied by the calling
//! application.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Document text │──▶│ Markdown     │──▶│ Store         │
//! │ (Markdown)    │   │ chunker      │   │ (chunks)      │
//! └───────────────┘   └──────────────┘   └───────┬───────┘
//!                                                │
//!            query ──▶ vector search ──┐         ▼
//!                                      ├──▶ fusion ──▶ ranked results
//!            query ──▶ graph search ───┘
//!
//!            link records ──▶ graph build ──▶ neighborhood / impact
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`token`] | Token counting and budgeted truncation |
//! | [`chunk`] | Heading-aware Markdown chunking |
//! | [`fusion`] | Reciprocal-rank and weighted-sum result fusion |
//! | [`search`] | Hybrid search orchestration |
//! | [`graph`] | Link graph construction, traversal, impact analysis |
//! | [`ingest`] | Batch chunk-and-store pipeline |
//! | [`store`] | Storage/retrieval collaborator trait + in-memory impl |

pub mod chunk;
pub mod config;
pub mod fusion;
pub mod graph;
pub mod ingest;
pub mod models;
pub mod search;
pub mod store;
pub mod token;
