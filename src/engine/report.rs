//! Run report: what each tier produced and how the run ended.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;

use crate::strategy::tiers::TierName;
use crate::strategy::{DecisionRecord, TierRun};

// ---------------------------------------------------------------------------
// Tier summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TierSummary {
    pub tier: TierName,
    pub target: usize,
    /// New parlays handed to the sink.
    pub generated: usize,
    /// Rows the sink actually wrote.
    pub persisted: usize,
    /// Slots filled by parlays stored in an earlier run.
    pub already_persisted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub short_profiles: usize,
    pub total_stake: Decimal,
}

impl TierSummary {
    pub fn from_run(run: &TierRun, persisted: usize) -> Self {
        let count = |f: fn(&DecisionRecord) -> bool| run.decisions.iter().filter(|d| f(d)).count();
        Self {
            tier: run.tier,
            target: run.target,
            generated: run.parlays.len(),
            persisted,
            already_persisted: run.already_persisted(),
            rejected: run.rejected(),
            duplicates: count(|d| matches!(d, DecisionRecord::Duplicate { .. })),
            short_profiles: count(|d| matches!(d, DecisionRecord::Short { .. })),
            total_stake: run.parlays.iter().map(|p| p.stake).sum(),
        }
    }

    pub fn filled(&self) -> usize {
        self.generated + self.already_persisted
    }
}

impl fmt::Display for TierSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12} {}/{} filled ({} new, {} existing) | {} rejected, {} dup | stake ${}",
            self.tier.to_string(),
            self.filled(),
            self.target,
            self.generated,
            self.already_persisted,
            self.rejected,
            self.duplicates,
            self.total_stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Persistence failed for `tier`; tiers listed before it were stored.
    Aborted { tier: TierName, reason: String },
}

impl RunOutcome {
    /// Process exit status: 0 when complete, 2 when a tier failed to persist.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Aborted { .. } => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub target_date: NaiveDate,
    pub pool_size: usize,
    pub scored_legs: usize,
    pub seeded_fingerprints: usize,
    pub tiers: Vec<TierSummary>,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn total_persisted(&self) -> usize {
        self.tiers.iter().map(|t| t.persisted).sum()
    }

    pub fn total_stake(&self) -> Decimal {
        self.tiers.iter().map(|t| t.total_stake).sum()
    }

    pub fn tier(&self, name: TierName) -> Option<&TierSummary> {
        self.tiers.iter().find(|t| t.tier == name)
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Slate for {}: {} of {} legs usable, {} fingerprints on file",
            self.target_date, self.scored_legs, self.pool_size, self.seeded_fingerprints
        )?;
        for tier in &self.tiers {
            writeln!(f, "  {tier}")?;
        }
        match &self.outcome {
            RunOutcome::Completed => write!(
                f,
                "Completed: {} parlays persisted, total stake ${}",
                self.total_persisted(),
                self.total_stake()
            ),
            RunOutcome::Aborted { tier, reason } => {
                write!(f, "ABORTED at tier {tier}: {reason}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
