//! Document link graph: construction, neighborhood traversal, and
//! change-impact analysis.
//!
//! The graph is rebuilt from link records on every call; node link
//! counts are derived from the edge set, never persisted. Traversal is a
//! bounded breadth-first walk over both link directions; impact analysis
//! follows inbound links two hops.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::Result;

use crate::models::{
    DocumentGraph, DocumentLink, DocumentRef, GraphEdge, GraphNode, ImpactReport,
    ImpactedDocument,
};
use crate::store::Store;

/// Build a de-duplicated node/edge graph from link records.
///
/// Links that are broken or have no resolved target are silently skipped.
/// Node attributes are first-seen-wins: later sightings of the same
/// document id never update an existing node. After all edges are added,
/// every node's in/out link counts are recomputed from the edge set.
pub fn build_graph(links: &[DocumentLink]) -> DocumentGraph {
    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut edges: Vec<GraphEdge> = Vec::new();

    for link in links {
        let target = match &link.target {
            Some(t) if !link.broken => t,
            _ => continue,
        };
        upsert_node(&mut nodes, &mut index, &link.source);
        upsert_node(&mut nodes, &mut index, target);
        edges.push(GraphEdge {
            id: link.id.clone(),
            source_node_id: link.source.id.clone(),
            target_node_id: target.id.clone(),
            link_type: link.link_type.clone(),
            anchor_text: link.anchor_text.clone(),
        });
    }

    // Full recomputation, not incremental.
    for edge in &edges {
        if let Some(&i) = index.get(edge.source_node_id.as_str()) {
            nodes[i].outgoing_link_count += 1;
        }
        if let Some(&i) = index.get(edge.target_node_id.as_str()) {
            nodes[i].incoming_link_count += 1;
        }
    }

    DocumentGraph { nodes, edges }
}

fn upsert_node(nodes: &mut Vec<GraphNode>, index: &mut HashMap<String, usize>, doc: &DocumentRef) {
    if !index.contains_key(&doc.id) {
        index.insert(doc.id.clone(), nodes.len());
        nodes.push(GraphNode::from_ref(doc));
    }
}

/// Bounded breadth-first neighborhood of a document.
///
/// The start document enters at depth 0 and a node is expanded only while
/// its recorded depth is strictly below `depth`, so `depth = 0` collects
/// nothing and returns an empty graph. Outgoing expansion skips broken
/// and unresolved links; incoming expansion does not check the inbound
/// link's broken flag (only the forward direction checks it). A node's
/// first assigned depth is final.
pub async fn document_neighborhood<S: Store>(
    store: &S,
    document_id: &str,
    depth: usize,
) -> Result<DocumentGraph> {
    let mut visited: HashMap<String, usize> = HashMap::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut collected: Vec<DocumentLink> = Vec::new();
    let mut seen_links: HashSet<String> = HashSet::new();

    visited.insert(document_id.to_string(), 0);
    queue.push_back(document_id.to_string());

    while let Some(current) = queue.pop_front() {
        let current_depth = visited[&current];
        if current_depth >= depth {
            continue;
        }

        for link in store.outgoing_links(&current).await? {
            let target_id = match &link.target {
                Some(t) if !link.broken => t.id.clone(),
                _ => continue,
            };
            if seen_links.insert(link.id.clone()) {
                collected.push(link);
            }
            if !visited.contains_key(&target_id) {
                visited.insert(target_id.clone(), current_depth + 1);
                queue.push_back(target_id);
            }
        }

        for link in store.incoming_links(&current).await? {
            let source_id = link.source.id.clone();
            if seen_links.insert(link.id.clone()) {
                collected.push(link);
            }
            if !visited.contains_key(&source_id) {
                visited.insert(source_id.clone(), current_depth + 1);
                queue.push_back(source_id);
            }
        }
    }

    Ok(build_graph(&collected))
}

/// Two-hop change-impact analysis via inbound links.
///
/// Direct impact: every document with a link targeting the subject, at
/// depth 1, carrying that link's type and anchor text. Indirect impact:
/// documents pointing at any direct-impact document, at depth 2, minus
/// the direct set and the subject itself. The two sets are disjoint.
pub async fn analyze_impact<S: Store>(store: &S, document_id: &str) -> Result<ImpactReport> {
    let inbound = store.incoming_links(document_id).await?;

    let mut direct: Vec<ImpactedDocument> = Vec::new();
    let mut direct_ids: HashSet<String> = HashSet::new();
    for link in &inbound {
        let source = &link.source;
        if source.id == document_id || !direct_ids.insert(source.id.clone()) {
            continue;
        }
        direct.push(ImpactedDocument {
            id: source.id.clone(),
            path: source.path.clone(),
            title: source.title.clone(),
            depth: 1,
            link_type: Some(link.link_type.clone()),
            anchor_text: link.anchor_text.clone(),
        });
    }

    let mut indirect: Vec<ImpactedDocument> = Vec::new();
    let mut indirect_ids: HashSet<String> = HashSet::new();
    for affected in &direct {
        for link in store.incoming_links(&affected.id).await? {
            let source = &link.source;
            if source.id == document_id
                || direct_ids.contains(&source.id)
                || !indirect_ids.insert(source.id.clone())
            {
                continue;
            }
            indirect.push(ImpactedDocument {
                id: source.id.clone(),
                path: source.path.clone(),
                title: source.title.clone(),
                depth: 2,
                link_type: None,
                anchor_text: None,
            });
        }
    }

    Ok(ImpactReport {
        subject_id: document_id.to_string(),
        total_impacted_count: direct.len() + indirect.len(),
        direct_impact: direct,
        indirect_impact: indirect,
    })
}
