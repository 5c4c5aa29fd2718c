//! Parlay evaluation.
//!
//! Aggregates a draft's legs into probability, edge and volatility metrics,
//! applies the tier's acceptance gates and, for accepted drafts, sizes the
//! stake and produces the final `Parlay`.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::builder::Draft;
use super::dedup::fingerprint;
use super::kelly::StakeSizer;
use super::odds::{combined_decimal_odds, decimal_to_american, implied_probability};
use super::risk::RejectionReason;
use super::scoring::ScoredLeg;
use super::tiers::{Profile, Tier};
use crate::types::{Leg, Parlay, ParlayStatus};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Evaluator constants, overridable from `[evaluator]` in config.toml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Combined probability below this is never accepted, whatever the tier says.
    pub absolute_min_probability: f64,
    /// Effective edge floor applied when a leg carries a favourable signal.
    pub edge_floor: f64,
    /// A leg composite above this counts as a favourable signal.
    pub favourable_composite: f64,
    /// A team sharp score above this counts as a favourable signal.
    pub favourable_sharp: f64,
    /// Extra edge required of hybrid and team-only profiles.
    pub team_edge_premium: f64,
    /// Combined decimal odds cap.
    pub max_payout_multiple: f64,
    /// Per-leg volatility used in the Sharpe-like denominator.
    pub leg_volatility: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            absolute_min_probability: 0.01,
            edge_floor: 0.005,
            favourable_composite: 50.0,
            favourable_sharp: 55.0,
            team_edge_premium: 0.01,
            max_payout_multiple: 1000.0,
            leg_volatility: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParlayMetrics {
    pub combined_probability: f64,
    pub implied_probability: f64,
    pub edge: f64,
    pub effective_edge: f64,
    pub edge_floored: bool,
    pub sharpe: f64,
    pub decimal_odds: f64,
    pub american_odds: i32,
}

pub struct ParlayEvaluator {
    config: EvaluatorConfig,
    sizer: StakeSizer,
}

impl ParlayEvaluator {
    pub fn new(config: EvaluatorConfig, sizer: StakeSizer) -> Self {
        Self { config, sizer }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Aggregate metrics under the independence approximation.
    pub fn metrics(&self, legs: &[ScoredLeg]) -> ParlayMetrics {
        let prices: Vec<f64> = legs.iter().filter_map(|s| s.leg.price()).collect();

        let combined: f64 = legs.iter().map(|s| s.leg.hit_rate()).product();
        let implied: f64 = prices.iter().map(|p| implied_probability(*p)).product();
        let edge = combined - implied;

        let favourable = legs.iter().any(|s| self.is_favourable(s));
        let effective_edge = if favourable {
            edge.max(self.config.edge_floor)
        } else {
            edge
        };
        let edge_floored = effective_edge > edge;

        let n = legs.len().max(1) as f64;
        let sharpe = effective_edge / (self.config.leg_volatility * n.sqrt());

        let decimal_odds = combined_decimal_odds(&prices, self.config.max_payout_multiple);

        ParlayMetrics {
            combined_probability: combined,
            implied_probability: implied,
            edge,
            effective_edge,
            edge_floored,
            sharpe,
            decimal_odds,
            american_odds: decimal_to_american(decimal_odds),
        }
    }

    fn is_favourable(&self, leg: &ScoredLeg) -> bool {
        leg.composite > self.config.favourable_composite
            || leg
                .leg
                .as_team()
                .and_then(|t| t.sharp_score)
                .is_some_and(|s| s > self.config.favourable_sharp)
    }

    /// Apply the tier's gates to `metrics`.
    pub fn check(
        &self,
        tier: &Tier,
        profile: &Profile,
        draft: &Draft,
        metrics: &ParlayMetrics,
        golden_categories: &HashSet<String>,
    ) -> Result<(), RejectionReason> {
        let confidence_floor = self
            .config
            .absolute_min_probability
            .max(tier.thresholds.min_confidence);
        if metrics.combined_probability < confidence_floor {
            return Err(RejectionReason::LowConfidence {
                combined: metrics.combined_probability,
                floor: confidence_floor,
            });
        }

        let mut edge_floor = tier.thresholds.min_edge;
        if profile.has_team_exposure() {
            edge_floor += self.config.team_edge_premium;
        }
        if metrics.effective_edge < edge_floor {
            return Err(RejectionReason::LowEdge {
                edge: metrics.effective_edge,
                floor: edge_floor,
            });
        }

        if metrics.sharpe < tier.thresholds.min_sharpe {
            return Err(RejectionReason::LowSharpe {
                sharpe: metrics.sharpe,
                floor: tier.thresholds.min_sharpe,
            });
        }

        if tier.name.is_top() && !golden_categories.is_empty() && draft.team_count() == 0 {
            let players = draft.player_count();
            let golden = draft
                .legs()
                .filter(|l| {
                    let category = l.category();
                    golden_categories
                        .iter()
                        .any(|g| g.eq_ignore_ascii_case(&category))
                })
                .count();
            if golden + 1 < players {
                return Err(RejectionReason::GoldenShortfall { golden, players });
            }
        }

        if profile.is_cross_sport() {
            for sport in &profile.sports {
                if !draft.legs().any(|l| l.sport().eq_ignore_ascii_case(sport)) {
                    return Err(RejectionReason::MissingSport(sport.clone()));
                }
            }
        }

        Ok(())
    }

    /// Evaluate a draft; accepted drafts come back as a sized, pending parlay.
    pub fn evaluate(
        &self,
        tier: &Tier,
        profile: &Profile,
        draft: &Draft,
        golden_categories: &HashSet<String>,
        target_date: NaiveDate,
    ) -> Result<Parlay, RejectionReason> {
        let metrics = self.metrics(&draft.legs);
        self.check(tier, profile, draft, &metrics, golden_categories)?;

        let stake = self.sizer.size(
            &tier.stake,
            metrics.combined_probability,
            metrics.decimal_odds,
        );
        let legs: Vec<Leg> = draft.legs().cloned().collect();

        debug!(
            tier = %tier.name,
            strategy = %draft.strategy,
            combined = format!("{:.4}", metrics.combined_probability),
            edge = format!("{:+.4}", metrics.edge),
            effective_edge = format!("{:+.4}", metrics.effective_edge),
            floored = metrics.edge_floored,
            sharpe = format!("{:.3}", metrics.sharpe),
            stake = %stake.amount,
            "Draft accepted"
        );

        Ok(Parlay {
            id: Uuid::new_v4(),
            target_date,
            tier: tier.name.to_string(),
            strategy: draft.strategy.clone(),
            fingerprint: fingerprint(&legs),
            legs,
            combined_probability: metrics.combined_probability,
            implied_probability: metrics.implied_probability,
            edge: metrics.edge,
            effective_edge: metrics.effective_edge,
            edge_floored: metrics.edge_floored,
            sharpe: metrics.sharpe,
            decimal_odds: metrics.decimal_odds,
            american_odds: metrics.american_odds,
            stake: stake.amount,
            status: ParlayStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
