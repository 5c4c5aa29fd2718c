//! Generation run driver.
//!
//! Scores the pool, enforces the pool floor, seeds the deduplicator from the
//! sink, then generates and persists one tier at a time. A persistence
//! failure stops the run; tiers already stored stay stored.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tracing::{error, info};

use super::report::{GenerationReport, RunOutcome, TierSummary};
use crate::config::AppConfig;
use crate::data::SlateInputs;
use crate::storage::ParlaySink;
use crate::strategy::dedup::Deduplicator;
use crate::strategy::evaluator::ParlayEvaluator;
use crate::strategy::kelly::StakeSizer;
use crate::strategy::scoring::ScoringEngine;
use crate::strategy::SlateOrchestrator;
use crate::types::SlateError;

pub struct GenerationRunner {
    scoring: ScoringEngine,
    orchestrator: SlateOrchestrator,
    min_pool_size: usize,
}

impl GenerationRunner {
    pub fn new(scoring: ScoringEngine, orchestrator: SlateOrchestrator, min_pool_size: usize) -> Self {
        Self {
            scoring,
            orchestrator,
            min_pool_size,
        }
    }

    /// Wire a runner from config, validating the tier table.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let policy = cfg.tier_policy();
        policy.validate()?;
        let sizer = StakeSizer::new(cfg.generation.bankroll);
        info!(
            bankroll = %sizer.bankroll(),
            tiers = policy.tiers.len(),
            min_pool_size = cfg.generation.min_pool_size,
            "Runner configured"
        );
        let evaluator = ParlayEvaluator::new(cfg.evaluator.clone(), sizer);
        Ok(Self::new(
            ScoringEngine::default(),
            SlateOrchestrator::new(policy, evaluator),
            cfg.generation.min_pool_size,
        ))
    }

    pub async fn run(
        &self,
        inputs: &SlateInputs,
        sink: &dyn ParlaySink,
        target_date: NaiveDate,
    ) -> Result<GenerationReport> {
        let started_at = Utc::now();
        let pool_size = inputs.pool.len();

        let scored = self.scoring.score_pool(&inputs.pool, &inputs.weights);
        if scored.len() < self.min_pool_size {
            return Err(SlateError::PoolBelowFloor {
                available: scored.len(),
                required: self.min_pool_size,
            }
            .into());
        }

        let seeds = sink
            .persisted_fingerprints(target_date)
            .await
            .with_context(|| format!("Failed to read existing parlays from {} sink", sink.name()))?;
        let mut dedup = Deduplicator::seeded(seeds);
        let seeded_fingerprints = dedup.persisted_count();

        info!(
            %target_date,
            pool = pool_size,
            usable = scored.len(),
            rules = self.scoring.rules().len(),
            seeded = seeded_fingerprints,
            sink = sink.name(),
            "Generation starting"
        );

        let mut tiers = Vec::new();
        let mut outcome = RunOutcome::Completed;

        for tier in &self.orchestrator.policy().tiers {
            let run = self.orchestrator.generate_tier(
                tier,
                &scored,
                &inputs.pool.golden_categories,
                &mut dedup,
                target_date,
            );

            let persisted = if run.parlays.is_empty() {
                0
            } else {
                match sink.persist(&run.parlays).await {
                    Ok(written) => written,
                    Err(e) => {
                        error!(tier = %tier.name, error = %e, "Persistence failed, stopping run");
                        outcome = RunOutcome::Aborted {
                            tier: tier.name,
                            reason: format!("{e:#}"),
                        };
                        break;
                    }
                }
            };

            tiers.push(TierSummary::from_run(&run, persisted));
        }

        let report = GenerationReport {
            target_date,
            pool_size,
            scored_legs: scored.len(),
            seeded_fingerprints,
            tiers,
            outcome,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            complete = report.is_complete(),
            fingerprints_this_run = dedup.run_count(),
            persisted = report.total_persisted(),
            total_stake = %report.total_stake(),
            "Generation finished"
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
