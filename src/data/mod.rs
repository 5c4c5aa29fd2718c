//! Input loading.
//!
//! The candidate pool and category weights are produced upstream and handed
//! over as JSON files. Both are read concurrently.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::types::{CandidatePool, CategoryWeights};

/// Everything a generation run consumes.
#[derive(Debug, Clone, Default)]
pub struct SlateInputs {
    pub pool: CandidatePool,
    pub weights: CategoryWeights,
}

/// Read the candidate pool. A missing file is an error.
pub async fn load_pool(path: &str) -> Result<CandidatePool> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read candidate pool from {path}"))?;
    let pool: CandidatePool = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse candidate pool from {path}"))?;
    info!(
        path,
        player_legs = pool.player_legs.len(),
        team_legs = pool.team_legs.len(),
        golden = pool.golden_categories.len(),
        "Candidate pool loaded"
    );
    Ok(pool)
}

/// Read category weights. A missing file means neutral weights.
pub async fn load_weights(path: &str) -> Result<CategoryWeights> {
    if !Path::new(path).exists() {
        warn!(path, "No category weights found, using neutral weights");
        return Ok(CategoryWeights::default());
    }
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read category weights from {path}"))?;
    let weights: CategoryWeights = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse category weights from {path}"))?;
    info!(path, categories = weights.0.len(), "Category weights loaded");
    Ok(weights)
}

pub async fn load_inputs(pool_path: &str, weights_path: &str) -> Result<SlateInputs> {
    let (pool, weights) = tokio::try_join!(load_pool(pool_path), load_weights(weights_path))?;
    Ok(SlateInputs { pool, weights })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
