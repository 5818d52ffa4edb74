//! Core data models used throughout docmesh.
//!
//! These types represent the chunks, link records, ranked results, and
//! graph shapes that flow through the chunking, fusion, and graph
//! pipelines.

use serde::{Deserialize, Serialize};

/// A retrieval-sized slice of a document's body text, tagged with its
/// heading context.
///
/// `heading_path` is the chain of Markdown headings enclosing the chunk,
/// serialized with the configured separator (e.g. `"# Title > ## Section"`).
/// `token_count` is always computed by the same counter that performed the
/// split. `hash` is the SHA-256 of `content`, used for embedding staleness
/// detection downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub content: String,
    pub heading_path: String,
    pub token_count: usize,
    pub hash: String,
}

/// Lightweight document summary embedded in link records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub path: String,
    pub title: String,
    pub doc_type: String,
}

/// A parsed cross-document link, as produced by the (external) link
/// extraction pipeline.
///
/// `target` is `None` when the reference could not be resolved; `broken`
/// marks links whose target has gone missing since extraction. Graph
/// construction skips both cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLink {
    pub id: String,
    pub source: DocumentRef,
    pub target: Option<DocumentRef>,
    pub link_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
    pub broken: bool,
}

/// One entry of a ranked retrieval list, before or after fusion.
///
/// The identity key is the chunk id when present, otherwise the document
/// id; it must be stable across the two lists being fused. `payload`
/// carries every backend-specific field verbatim; fusion replaces only
/// `score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<String>,
    pub document_id: String,
    pub score: f64,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RankedResult {
    /// Stable identity for score accumulation: chunk id if present, else
    /// document id.
    pub fn identity_key(&self) -> &str {
        self.chunk_id.as_deref().unwrap_or(&self.document_id)
    }
}

/// A document node in the link graph. Link counts are derived from the
/// edge set on every build, never persisted independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub path: String,
    pub title: String,
    pub doc_type: String,
    pub outgoing_link_count: usize,
    pub incoming_link_count: usize,
}

impl GraphNode {
    pub fn from_ref(doc: &DocumentRef) -> Self {
        Self {
            id: doc.id.clone(),
            path: doc.path.clone(),
            title: doc.title.clone(),
            doc_type: doc.doc_type.clone(),
            outgoing_link_count: 0,
            incoming_link_count: 0,
        }
    }
}

/// A resolved, non-broken link between two graph nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub link_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
}

/// De-duplicated node/edge graph built from link records.
///
/// Nodes appear in first-seen order, edges in input order, so two builds
/// over the same link set produce identical output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// A document affected by a change to the analysis subject.
///
/// Depth 1 entries carry the linking edge's type and anchor text; depth 2
/// entries carry neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactedDocument {
    pub id: String,
    pub path: String,
    pub title: String,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
}

/// Result of change-impact analysis for one document.
///
/// `direct_impact` and `indirect_impact` are disjoint and never contain
/// the subject itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    pub subject_id: String,
    pub total_impacted_count: usize,
    pub direct_impact: Vec<ImpactedDocument>,
    pub indirect_impact: Vec<ImpactedDocument>,
}
