//! In-memory [`Store`] implementation for tests and embedding-free
//! environments.
//!
//! Uses `Vec`s behind `std::sync::RwLock` for thread safety. Vector
//! search is a naive term-overlap score over chunk contents; graph search
//! scores documents by query-term matches in link titles and anchor
//! texts. Both are deterministic: score descending, id ascending on ties.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use crate::models::{Chunk, DocumentLink, DocumentRef, RankedResult};

use super::Store;

/// In-memory store for tests and small corpora.
#[derive(Default)]
pub struct InMemoryStore {
    chunks: RwLock<Vec<Chunk>>,
    links: RwLock<Vec<DocumentLink>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a link record, as the (external) link extraction pipeline
    /// would.
    pub fn add_link(&self, link: DocumentLink) {
        self.links.write().unwrap().push(link);
    }

    /// Number of chunks currently stored for a document.
    pub fn chunk_count(&self, document_id: &str) -> usize {
        self.chunks
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.document_id == document_id)
            .count()
    }

    /// Total chunks across all documents.
    pub fn total_chunks(&self) -> usize {
        self.chunks.read().unwrap().len()
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn matches_in(text: &str, terms: &[String]) -> usize {
    let lower = text.to_lowercase();
    terms.iter().filter(|t| lower.contains(t.as_str())).count()
}

fn sort_and_truncate(mut results: Vec<RankedResult>, limit: usize) -> Vec<RankedResult> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.identity_key().cmp(b.identity_key()))
    });
    results.truncate(limit);
    results
}

#[async_trait]
impl Store for InMemoryStore {
    async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        stored.retain(|c| c.document_id != document_id);
        stored.extend_from_slice(chunks);
        Ok(())
    }

    async fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self.chunks.read().unwrap();
        let candidates: Vec<RankedResult> = stored
            .iter()
            .filter_map(|chunk| {
                let matches = matches_in(&chunk.content, &terms);
                if matches == 0 {
                    return None;
                }
                let snippet: String = chunk.content.chars().take(240).collect();
                Some(RankedResult {
                    chunk_id: Some(chunk.id.clone()),
                    document_id: chunk.document_id.clone(),
                    score: matches as f64,
                    payload: json!({
                        "snippet": snippet,
                        "heading_path": chunk.heading_path,
                        "token_count": chunk.token_count,
                    }),
                })
            })
            .collect();
        Ok(sort_and_truncate(candidates, limit))
    }

    async fn graph_search(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let links = self.links.read().unwrap();
        let mut scores: HashMap<String, (f64, DocumentRef)> = HashMap::new();
        for link in links.iter() {
            let target = match &link.target {
                Some(t) if !link.broken => t,
                _ => continue,
            };
            let anchor_matches = link
                .anchor_text
                .as_deref()
                .map(|a| matches_in(a, &terms))
                .unwrap_or(0);
            for doc in [&link.source, target] {
                let score = (matches_in(&doc.title, &terms) + anchor_matches) as f64;
                if score == 0.0 {
                    continue;
                }
                let entry = scores
                    .entry(doc.id.clone())
                    .or_insert_with(|| (0.0, doc.clone()));
                entry.0 += score;
            }
        }
        let candidates: Vec<RankedResult> = scores
            .into_iter()
            .map(|(id, (score, doc))| RankedResult {
                chunk_id: None,
                document_id: id,
                score,
                payload: json!({
                    "path": doc.path,
                    "title": doc.title,
                }),
            })
            .collect();
        Ok(sort_and_truncate(candidates, limit))
    }

    async fn outgoing_links(&self, document_id: &str) -> Result<Vec<DocumentLink>> {
        let links = self.links.read().unwrap();
        Ok(links
            .iter()
            .filter(|l| l.source.id == document_id)
            .cloned()
            .collect())
    }

    async fn incoming_links(&self, document_id: &str) -> Result<Vec<DocumentLink>> {
        let links = self.links.read().unwrap();
        Ok(links
            .iter()
            .filter(|l| {
                l.target
                    .as_ref()
                    .is_some_and(|t| t.id == document_id)
            })
            .cloned()
            .collect())
    }
}
