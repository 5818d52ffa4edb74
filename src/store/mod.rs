//! Storage and retrieval collaborator abstraction.
//!
//! The [`Store`] trait is the seam between the core algorithms and
//! everything with I/O of its own: chunk persistence, the vector index,
//! relationship retrieval, and the link table. Implementations must be
//! `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`replace_chunks`](Store::replace_chunks) | Replace all chunks for a document |
//! | [`vector_search`](Store::vector_search) | Similarity-ranked chunk candidates |
//! | [`graph_search`](Store::graph_search) | Relationship-ranked document candidates |
//! | [`outgoing_links`](Store::outgoing_links) | Links originating at a document |
//! | [`incoming_links`](Store::incoming_links) | Links resolving to a document |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, DocumentLink, RankedResult};

/// Abstract persistence/retrieval backend for docmesh.
///
/// The two search methods are the independent retrieval signals fed into
/// fusion; the link lookups feed graph traversal and impact analysis.
#[async_trait]
pub trait Store: Send + Sync {
    /// Replace all chunks for a document: delete-then-insert, never a
    /// patch in place.
    async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()>;

    /// Vector-similarity retrieval, best first.
    async fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>>;

    /// Graph-relationship retrieval, best first.
    async fn graph_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>>;

    /// All link records whose source is `document_id`.
    async fn outgoing_links(&self, document_id: &str) -> Result<Vec<DocumentLink>>;

    /// All link records whose resolved target is `document_id`.
    async fn incoming_links(&self, document_id: &str) -> Result<Vec<DocumentLink>>;
}
