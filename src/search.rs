//! Hybrid search orchestration.
//!
//! Runs the two independent retrieval signals (vector similarity and
//! graph relationships) through the [`Store`] backend and merges them
//! with the named [`FusionStrategy`]. The strategy name is resolved
//! before any store call, so configuration errors reject immediately;
//! fusion itself waits for both candidate lists (no partial fusion).

use anyhow::Result;

use crate::fusion::{FusionParams, FusionStrategy};
use crate::models::RankedResult;
use crate::store::Store;

/// Bundles all inputs for a single hybrid search invocation.
#[derive(Debug, Clone)]
pub struct HybridSearchRequest<'a> {
    /// Search query text.
    pub query: &'a str,
    /// Fusion strategy name (`"rrf"` or `"weighted_sum"`, any case).
    pub strategy: &'a str,
    /// Candidates fetched per retrieval signal before fusion.
    pub candidate_k: usize,
    /// Fusion tuning parameters.
    pub params: FusionParams,
}

/// Run a hybrid search against a [`Store`] backend.
///
/// A blank query returns an empty result set. Both retrieval calls are
/// independent; callers may parallelize them, this orchestration awaits
/// them in turn and fuses once both lists are complete.
pub async fn hybrid_search<S: Store>(
    store: &S,
    req: &HybridSearchRequest<'_>,
) -> Result<Vec<RankedResult>> {
    let strategy = FusionStrategy::parse(req.strategy)?;

    if req.query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let vector_results = store.vector_search(req.query, req.candidate_k).await?;
    let graph_results = store.graph_search(req.query, req.candidate_k).await?;

    strategy.fuse(&vector_results, &graph_results, &req.params)
}
