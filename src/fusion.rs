//! Result fusion: merging two ranked retrieval lists into one.
//!
//! Two strategies are supported, resolved by case-insensitive name:
//!
//! - `"rrf"`: Reciprocal Rank Fusion. Each item at 0-based rank `i`
//!   contributes `1 / (k + i + 1)` per list; contributions are summed per
//!   identity key and the raw sum is the final score.
//! - `"weighted_sum"`: each list's raw scores are normalized by that
//!   list's own maximum, then combined as
//!   `vector_weight * norm_a + graph_weight * norm_b`; a key missing from
//!   one list contributes 0 from that side.
//!
//! Both strategies are pure functions over their inputs; ties sort by
//! identity key so identical inputs always produce identical output.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::models::RankedResult;

/// Tuning parameters for a single fusion invocation.
///
/// Each strategy reads only the fields it uses; the others are ignored,
/// not validated.
#[derive(Debug, Clone)]
pub struct FusionParams {
    /// RRF rank constant (conventionally 60).
    pub rrf_k: u32,
    /// Weight applied to the vector (first) list in weighted-sum fusion.
    pub vector_weight: f64,
    /// Weight applied to the graph (second) list in weighted-sum fusion.
    pub graph_weight: f64,
    /// Maximum number of fused results to return.
    pub top_k: usize,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            rrf_k: 60,
            vector_weight: 0.7,
            graph_weight: 0.3,
            top_k: 12,
        }
    }
}

/// A named fusion algorithm. Stateless; every invocation is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionStrategy {
    Rrf,
    WeightedSum,
}

impl FusionStrategy {
    /// Resolve a strategy from its case-insensitive name. An unknown name
    /// is a configuration error, never a silent fallback.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rrf" => Ok(Self::Rrf),
            "weighted_sum" => Ok(Self::WeightedSum),
            other => bail!(
                "Unknown fusion strategy: '{}'. Use rrf or weighted_sum.",
                other
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rrf => "rrf",
            Self::WeightedSum => "weighted_sum",
        }
    }

    /// Fuse two ranked lists into one, sorted by fused score descending
    /// (identity key ascending on ties) and truncated to `top_k`.
    ///
    /// For a key present in both lists the merged record keeps the
    /// vector-list payload; only the score is replaced.
    pub fn fuse(
        &self,
        vector_results: &[RankedResult],
        graph_results: &[RankedResult],
        params: &FusionParams,
    ) -> Result<Vec<RankedResult>> {
        if params.top_k == 0 {
            bail!("fusion top_k must be >= 1");
        }
        let fused = match self {
            Self::Rrf => {
                if params.rrf_k == 0 {
                    bail!("fusion rrf_k must be >= 1");
                }
                rrf_fuse(vector_results, graph_results, params)
            }
            Self::WeightedSum => weighted_sum_fuse(vector_results, graph_results, params),
        };
        Ok(fused)
    }
}

fn rrf_fuse(
    vector_results: &[RankedResult],
    graph_results: &[RankedResult],
    params: &FusionParams,
) -> Vec<RankedResult> {
    let k = params.rrf_k as f64;
    let mut fused: HashMap<&str, (f64, &RankedResult)> = HashMap::new();

    for (rank, item) in vector_results.iter().enumerate() {
        let contrib = 1.0 / (k + rank as f64 + 1.0);
        fused
            .entry(item.identity_key())
            .and_modify(|e| e.0 += contrib)
            .or_insert((contrib, item));
    }
    for (rank, item) in graph_results.iter().enumerate() {
        let contrib = 1.0 / (k + rank as f64 + 1.0);
        fused
            .entry(item.identity_key())
            .and_modify(|e| e.0 += contrib)
            .or_insert((contrib, item));
    }

    finish(fused, params.top_k)
}

fn weighted_sum_fuse(
    vector_results: &[RankedResult],
    graph_results: &[RankedResult],
    params: &FusionParams,
) -> Vec<RankedResult> {
    let max_a = max_raw_score(vector_results);
    let max_b = max_raw_score(graph_results);

    let mut fused: HashMap<&str, (f64, &RankedResult)> = HashMap::new();

    let mut seen: HashSet<&str> = HashSet::new();
    for item in vector_results {
        let key = item.identity_key();
        if !seen.insert(key) {
            continue;
        }
        let weighted = params.vector_weight * (item.score / max_a);
        fused
            .entry(key)
            .and_modify(|e| e.0 += weighted)
            .or_insert((weighted, item));
    }

    seen.clear();
    for item in graph_results {
        let key = item.identity_key();
        if !seen.insert(key) {
            continue;
        }
        let weighted = params.graph_weight * (item.score / max_b);
        fused
            .entry(key)
            .and_modify(|e| e.0 += weighted)
            .or_insert((weighted, item));
    }

    finish(fused, params.top_k)
}

/// Per-list normalization denominator: the maximum raw score observed.
/// An empty list defaults to 1.0 (nothing to normalize); an all-zero
/// maximum also falls back to 1.0 to avoid dividing by zero.
fn max_raw_score(results: &[RankedResult]) -> f64 {
    let max = results.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);
    if results.is_empty() || max == 0.0 {
        1.0
    } else {
        max
    }
}

fn finish(fused: HashMap<&str, (f64, &RankedResult)>, top_k: usize) -> Vec<RankedResult> {
    let mut merged: Vec<RankedResult> = fused
        .into_values()
        .map(|(score, item)| RankedResult {
            score,
            ..item.clone()
        })
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.identity_key().cmp(b.identity_key()))
    });
    merged.truncate(top_k);
    merged
}
