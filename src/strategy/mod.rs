//! Strategy engine: leg scoring, line selection, exposure control, parlay
//! construction, evaluation and deduplication.

pub mod builder;
pub mod dedup;
pub mod evaluator;
pub mod kelly;
pub mod lines;
pub mod odds;
pub mod risk;
pub mod scoring;
pub mod tiers;

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::types::Parlay;
use builder::{BuildOutcome, ParlayBuilder};
use dedup::{DedupOutcome, Deduplicator};
use evaluator::ParlayEvaluator;
use risk::{RejectionReason, UsageTracker};
use scoring::ScoredLeg;
use tiers::{Tier, TierName, TierPolicy};

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Record of every attempt made during a tier run, including the ones that
/// produced nothing.
#[derive(Debug, Clone)]
pub enum DecisionRecord {
    /// New parlay, queued for persistence.
    Accepted { strategy: String, fingerprint: String },
    /// Same combination already persisted for the date. Fills a slot.
    AlreadyPersisted { strategy: String, fingerprint: String },
    /// Same combination produced earlier in this run.
    Duplicate { strategy: String, fingerprint: String },
    /// Draft failed the evaluator's gates.
    Rejected { strategy: String, reason: RejectionReason },
    /// Pool exhausted for this profile; the profile is retired for the tier.
    Short { strategy: String, found: usize, needed: usize },
}

/// Output of one tier's generation loop.
#[derive(Debug, Clone)]
pub struct TierRun {
    pub tier: TierName,
    pub target: usize,
    /// New parlays to persist.
    pub parlays: Vec<Parlay>,
    /// Slots filled, counting matches against already-persisted parlays.
    pub slots_filled: usize,
    pub decisions: Vec<DecisionRecord>,
}

impl TierRun {
    pub fn already_persisted(&self) -> usize {
        self.slots_filled - self.parlays.len()
    }

    pub fn rejected(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| matches!(d, DecisionRecord::Rejected { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Runs builder → evaluator → deduplicator for each tier.
///
/// Profiles within a tier take turns, one draft each, until the tier target
/// is met or every profile has run dry. Each tier gets a fresh tracker.
pub struct SlateOrchestrator {
    policy: TierPolicy,
    evaluator: ParlayEvaluator,
}

impl SlateOrchestrator {
    pub fn new(policy: TierPolicy, evaluator: ParlayEvaluator) -> Self {
        Self { policy, evaluator }
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    /// Generate one tier from the scored pool.
    pub fn generate_tier(
        &self,
        tier: &Tier,
        pool: &[ScoredLeg],
        golden_categories: &HashSet<String>,
        dedup: &mut Deduplicator,
        target_date: NaiveDate,
    ) -> TierRun {
        let builder = ParlayBuilder::new(tier);
        let mut tracker = UsageTracker::new(tier.caps);
        let mut run = TierRun {
            tier: tier.name,
            target: tier.target_count,
            parlays: Vec::new(),
            slots_filled: 0,
            decisions: Vec::new(),
        };

        let mut active: Vec<bool> = vec![true; tier.profiles.len()];

        'rounds: while run.slots_filled < tier.target_count && active.iter().any(|a| *a) {
            for (idx, profile) in tier.profiles.iter().enumerate() {
                if run.slots_filled >= tier.target_count {
                    break 'rounds;
                }
                if !active[idx] {
                    continue;
                }

                let draft = match builder.build(profile, pool, &mut tracker) {
                    BuildOutcome::Drafted(draft) => draft,
                    BuildOutcome::Short { found, needed } => {
                        active[idx] = false;
                        run.decisions.push(DecisionRecord::Short {
                            strategy: profile.strategy.clone(),
                            found,
                            needed,
                        });
                        continue;
                    }
                };

                let parlay = match self.evaluator.evaluate(
                    tier,
                    profile,
                    &draft,
                    golden_categories,
                    target_date,
                ) {
                    Ok(parlay) => parlay,
                    Err(reason) => {
                        debug!(
                            tier = %tier.name,
                            strategy = %profile.strategy,
                            %reason,
                            "Draft rejected"
                        );
                        run.decisions.push(DecisionRecord::Rejected {
                            strategy: profile.strategy.clone(),
                            reason,
                        });
                        continue;
                    }
                };

                let strategy = profile.strategy.clone();
                let fingerprint = parlay.fingerprint.clone();
                match dedup.admit(&fingerprint) {
                    DedupOutcome::Fresh => {
                        info!(tier = %tier.name, parlay = %parlay, "Parlay accepted");
                        run.slots_filled += 1;
                        run.parlays.push(parlay);
                        run.decisions.push(DecisionRecord::Accepted { strategy, fingerprint });
                    }
                    DedupOutcome::Persisted => {
                        debug!(tier = %tier.name, %fingerprint, "Already persisted");
                        run.slots_filled += 1;
                        run.decisions
                            .push(DecisionRecord::AlreadyPersisted { strategy, fingerprint });
                    }
                    DedupOutcome::RunDuplicate => {
                        debug!(tier = %tier.name, %fingerprint, "Duplicate in run");
                        run.decisions.push(DecisionRecord::Duplicate { strategy, fingerprint });
                    }
                }
            }
        }

        info!(
            tier = %tier.name,
            target = tier.target_count,
            accepted = run.parlays.len(),
            already_persisted = run.already_persisted(),
            rejected = run.rejected(),
            keys_used = tracker.used_count(),
            "Tier complete"
        );
        run
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
