//! Batch chunk-and-store pipeline.
//!
//! Coordinates chunking across a batch of documents and persists each
//! document's chunks through [`Store::replace_chunks`]. One document's
//! failure never aborts the batch: the document is recorded in the
//! summary, logged, and the batch continues (fail-soft).

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::chunk::MarkdownChunker;
use crate::store::Store;
use crate::token::TokenCounter;

/// A document queued for chunking, as handed over by the (external)
/// ingestion pipeline.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub document_id: String,
    pub text: String,
}

/// A document skipped during a batch, with the error that caused it.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub document_id: String,
    pub error: String,
}

/// Outcome of one batch run. `documents_processed` counts successes only;
/// skipped documents are listed in `failures`.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub documents_processed: u64,
    pub chunks_written: u64,
    pub failures: Vec<BatchFailure>,
    pub chunked_at: DateTime<Utc>,
}

/// Chunk every document in the batch and replace its stored chunks.
///
/// Chunks for a document are fully replaced on every run
/// (delete-then-insert), never patched in place. Documents whose
/// persistence fails are skipped and reported; the rest of the batch is
/// unaffected.
pub async fn chunk_documents<S: Store, C: TokenCounter>(
    store: &S,
    chunker: &MarkdownChunker<C>,
    documents: &[DocumentInput],
) -> BatchSummary {
    let mut summary = BatchSummary {
        documents_processed: 0,
        chunks_written: 0,
        failures: Vec::new(),
        chunked_at: Utc::now(),
    };

    for doc in documents {
        let chunks = chunker.chunk(&doc.document_id, &doc.text);
        match store.replace_chunks(&doc.document_id, &chunks).await {
            Ok(()) => {
                summary.documents_processed += 1;
                summary.chunks_written += chunks.len() as u64;
            }
            Err(err) => {
                warn!(
                    document_id = %doc.document_id,
                    error = %err,
                    "skipping document after chunk storage failure"
                );
                summary.failures.push(BatchFailure {
                    document_id: doc.document_id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    debug!(
        documents = summary.documents_processed,
        chunks = summary.chunks_written,
        failed = summary.failures.len(),
        "chunk batch complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkingConfig;
    use crate::models::{Chunk, DocumentLink, RankedResult};
    use crate::store::memory::InMemoryStore;
    use crate::token::HeuristicTokenCounter;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    fn chunker() -> MarkdownChunker<HeuristicTokenCounter> {
        MarkdownChunker::new(HeuristicTokenCounter::default(), ChunkingConfig::default())
    }

    fn input(id: &str, text: &str) -> DocumentInput {
        DocumentInput {
            document_id: id.to_string(),
            text: text.to_string(),
        }
    }

    /// Delegates to an inner store but refuses one document id.
    struct FlakyStore {
        inner: InMemoryStore,
        poison: String,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()> {
            if document_id == self.poison {
                bail!("disk full");
            }
            self.inner.replace_chunks(document_id, chunks).await
        }

        async fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>> {
            self.inner.vector_search(query, limit).await
        }

        async fn graph_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>> {
            self.inner.graph_search(query, limit).await
        }

        async fn outgoing_links(&self, document_id: &str) -> Result<Vec<DocumentLink>> {
            self.inner.outgoing_links(document_id).await
        }

        async fn incoming_links(&self, document_id: &str) -> Result<Vec<DocumentLink>> {
            self.inner.incoming_links(document_id).await
        }
    }

    #[tokio::test]
    async fn test_batch_counts_documents_and_chunks() {
        let store = InMemoryStore::new();
        let docs = vec![
            input("d1", "# One\n\nbody text"),
            input("d2", "# Two\n\nmore body text"),
        ];
        let summary = chunk_documents(&store, &chunker(), &docs).await;
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.chunks_written, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(store.total_chunks(), 2);
    }

    #[tokio::test]
    async fn test_empty_document_writes_no_chunks() {
        let store = InMemoryStore::new();
        let summary = chunk_documents(&store, &chunker(), &[input("d1", "")]).await;
        assert_eq!(summary.documents_processed, 1);
        assert_eq!(summary.chunks_written, 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let store = FlakyStore {
            inner: InMemoryStore::new(),
            poison: "d2".to_string(),
        };
        let docs = vec![
            input("d1", "# One\n\nbody"),
            input("d2", "# Two\n\nbody"),
            input("d3", "# Three\n\nbody"),
        ];
        let summary = chunk_documents(&store, &chunker(), &docs).await;
        assert_eq!(summary.documents_processed, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].document_id, "d2");
        assert!(summary.failures[0].error.contains("disk full"));
        assert_eq!(store.inner.chunk_count("d1"), 1);
        assert_eq!(store.inner.chunk_count("d3"), 1);
    }

    #[tokio::test]
    async fn test_rechunk_replaces_previous_chunks() {
        let store = InMemoryStore::new();
        let small_budget = MarkdownChunker::new(
            HeuristicTokenCounter::default(),
            ChunkingConfig {
                max_tokens: 20,
                min_tokens: 1,
                overlap_tokens: 0,
                heading_path_separator: " > ".to_string(),
            },
        );
        let long = (0..30)
            .map(|i| format!("paragraph {} with enough text to matter", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        chunk_documents(&store, &small_budget, &[input("d1", &long)]).await;
        let before = store.chunk_count("d1");
        chunk_documents(&store, &small_budget, &[input("d1", "# Short\n\nnow tiny")]).await;
        let after = store.chunk_count("d1");
        assert!(before > 1);
        assert_eq!(after, 1);
    }
}
