use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::fusion::{FusionParams, FusionStrategy};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Chunking budgets and heading-path rendering.
#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default)]
    pub overlap_tokens: usize,
    #[serde(default = "default_heading_path_separator")]
    pub heading_path_separator: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 700,
            min_tokens: default_min_tokens(),
            overlap_tokens: 0,
            heading_path_separator: default_heading_path_separator(),
        }
    }
}

fn default_min_tokens() -> usize {
    64
}
fn default_heading_path_separator() -> String {
    " > ".to_string()
}

/// Retrieval and fusion tuning.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: u32,
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,
    #[serde(default = "default_graph_weight")]
    pub graph_weight: f64,
    #[serde(default = "default_candidate_k")]
    pub candidate_k: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            rrf_k: default_rrf_k(),
            vector_weight: default_vector_weight(),
            graph_weight: default_graph_weight(),
            candidate_k: default_candidate_k(),
            top_k: default_top_k(),
        }
    }
}

impl RetrievalConfig {
    pub fn fusion_params(&self) -> FusionParams {
        FusionParams {
            rrf_k: self.rrf_k,
            vector_weight: self.vector_weight,
            graph_weight: self.graph_weight,
            top_k: self.top_k,
        }
    }
}

fn default_strategy() -> String {
    "rrf".to_string()
}
fn default_rrf_k() -> u32 {
    60
}
fn default_vector_weight() -> f64 {
    0.7
}
fn default_graph_weight() -> f64 {
    0.3
}
fn default_candidate_k() -> usize {
    80
}
fn default_top_k() -> usize {
    12
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }
    if config.chunking.min_tokens >= config.chunking.max_tokens {
        anyhow::bail!("chunking.min_tokens must be < chunking.max_tokens");
    }

    // Validate retrieval
    FusionStrategy::parse(&config.retrieval.strategy)?;
    if config.retrieval.rrf_k < 1 {
        anyhow::bail!("retrieval.rrf_k must be >= 1");
    }
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.vector_weight < 0.0 || config.retrieval.graph_weight < 0.0 {
        anyhow::bail!("retrieval weights must be >= 0.0");
    }

    Ok(config)
}
