//! Composite leg scoring.
//!
//! Converts price + hit rate + learned category weight into a 0–100 quality
//! score, then applies an ordered list of named adjustment rules so every
//! bonus and penalty is auditable on its own.

use tracing::{debug, info, warn};

use super::odds::{implied_probability, STANDARD_BREAKEVEN};
use crate::types::{CandidatePool, CategoryWeights, Leg};

// ---------------------------------------------------------------------------
// Pure scoring functions
// ---------------------------------------------------------------------------

/// Edge contribution saturates at ±10% edge.
const EDGE_POINTS_PER_UNIT: f64 = 400.0;
const MAX_EDGE_POINTS: f64 = 40.0;
const MAX_DISCOUNT_BONUS: f64 = 5.0;

/// Score a price against an estimated hit rate (fraction), 0–100.
///
/// Starts from 50, adds the clamped edge contribution, subtracts a juice
/// penalty when the price implies more than the standard break-even and adds
/// a small bonus when it implies less.
pub fn odds_value_score(price: f64, estimated_hit_rate: f64) -> f64 {
    let implied = implied_probability(price);
    let edge = estimated_hit_rate - implied;
    let edge_points = (edge * EDGE_POINTS_PER_UNIT).clamp(-MAX_EDGE_POINTS, MAX_EDGE_POINTS);

    let juice = if implied > STANDARD_BREAKEVEN {
        -(implied - STANDARD_BREAKEVEN) * 100.0
    } else {
        ((STANDARD_BREAKEVEN - implied) * 50.0).min(MAX_DISCOUNT_BONUS)
    };

    (50.0 + edge_points + juice).clamp(0.0, 100.0)
}

/// Multiplier from the externally calibrated category hit rate.
pub fn calibration_multiplier(calibrated_hit_rate: Option<f64>) -> f64 {
    match calibrated_hit_rate {
        Some(r) if r >= 0.65 => 1.5,
        Some(r) if r >= 0.55 => 1.2,
        Some(r) if r < 0.45 => 0.5,
        _ => 1.0,
    }
}

/// Weighted blend: 30% hit rate, 25% edge, 25% odds value, 20% category weight,
/// scaled by the calibration tier and clamped to 0–100.
///
/// `edge` is a fraction; -10%..+10% maps linearly onto 0..100.
/// `category_weight` is centred on 1.0 (neutral → 50 points).
pub fn composite_score(
    hit_rate_percent: f64,
    edge: f64,
    odds_value_score: f64,
    category_weight: f64,
    calibrated_hit_rate: Option<f64>,
) -> f64 {
    let hit = hit_rate_percent.clamp(0.0, 100.0);
    let edge_norm = ((edge + 0.10) / 0.20 * 100.0).clamp(0.0, 100.0);
    let odds = odds_value_score.clamp(0.0, 100.0);
    let weight = (category_weight * 50.0).clamp(0.0, 100.0);

    let blend = 0.30 * hit + 0.25 * edge_norm + 0.25 * odds + 0.20 * weight;
    (blend * calibration_multiplier(calibrated_hit_rate)).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Scoring rules
// ---------------------------------------------------------------------------

/// A named adjustment applied after the composite blend.
#[derive(Clone, Copy)]
pub struct ScoringRule {
    pub name: &'static str,
    pub applies: fn(&Leg) -> bool,
    pub contribution: fn(&Leg) -> f64,
}

impl std::fmt::Debug for ScoringRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringRule").field("name", &self.name).finish()
    }
}

impl ScoringRule {
    /// The contribution if the rule fires.
    pub fn evaluate(&self, leg: &Leg) -> Option<f64> {
        (self.applies)(leg).then(|| (self.contribution)(leg))
    }
}

/// Default rule list, evaluated in this order.
pub fn default_rules() -> Vec<ScoringRule> {
    vec![
        ScoringRule {
            name: "reliable_player",
            applies: |leg| leg.as_player().is_some_and(|p| p.reliable),
            contribution: |_| 4.0,
        },
        ScoringRule {
            name: "upstream_quality",
            applies: |leg| leg.quality_score().is_some(),
            contribution: |leg| (leg.quality_score().unwrap_or(50.0) - 50.0) * 0.1,
        },
        ScoringRule {
            name: "plus_money_value",
            applies: |leg| leg.price().is_some_and(|p| p >= 100.0) && leg.hit_rate() >= 0.50,
            contribution: |_| 3.0,
        },
        ScoringRule {
            name: "heavy_juice",
            applies: |leg| leg.price().is_some_and(|p| p < -200.0),
            contribution: |_| -5.0,
        },
        ScoringRule {
            name: "sharp_team_signal",
            applies: |leg| {
                leg.as_team()
                    .and_then(|t| t.sharp_score)
                    .is_some_and(|s| s > 55.0)
            },
            contribution: |_| 5.0,
        },
        ScoringRule {
            name: "thin_projection_buffer",
            applies: |leg| {
                leg.as_player()
                    .and_then(|p| p.projection_buffer())
                    .is_some_and(|b| b.abs() < 0.5)
            },
            contribution: |_| -4.0,
        },
    ]
}

// ---------------------------------------------------------------------------
// Scored leg
// ---------------------------------------------------------------------------

/// A leg annotated with its scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLeg {
    pub leg: Leg,
    pub odds_value: f64,
    pub composite: f64,
    /// Learned weight used in the blend (1.0 when none is known).
    pub category_weight: f64,
    /// Names of rules that fired, in evaluation order.
    pub rules_fired: Vec<&'static str>,
}

impl ScoredLeg {
    pub fn key(&self) -> String {
        self.leg.key()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ScoringEngine {
    rules: Vec<ScoringRule>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ScoringEngine {
    pub fn new(rules: Vec<ScoringRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    /// Score a single leg. Returns `None` for malformed legs.
    pub fn score_leg(&self, leg: &Leg, weights: &CategoryWeights) -> Option<ScoredLeg> {
        leg.validate().ok()?;
        let price = leg.price()?;
        let hit_rate = leg.hit_rate();
        let odds_value = odds_value_score(price, hit_rate);
        let edge = hit_rate - implied_probability(price);
        let weight = weights.lookup(&leg.category(), leg.side());

        let mut composite = composite_score(
            hit_rate * 100.0,
            edge,
            odds_value,
            weight.weight,
            weight.calibrated_hit_rate,
        );

        let mut rules_fired = Vec::new();
        for rule in &self.rules {
            if let Some(points) = rule.evaluate(leg) {
                composite += points;
                rules_fired.push(rule.name);
            }
        }

        Some(ScoredLeg {
            leg: leg.clone(),
            odds_value,
            composite: composite.clamp(0.0, 100.0),
            category_weight: weight.weight,
            rules_fired,
        })
    }

    /// Annotate the whole pool, skipping malformed legs, ranked by composite
    /// score (key breaks ties so ranking is reproducible).
    pub fn score_pool(&self, pool: &CandidatePool, weights: &CategoryWeights) -> Vec<ScoredLeg> {
        let mut scored = Vec::with_capacity(pool.len());
        let mut skipped = 0usize;

        for leg in pool.legs() {
            if let Err(e) = leg.validate() {
                warn!(error = %e, "Skipping malformed leg");
                skipped += 1;
                continue;
            }
            if let Some(s) = self.score_leg(&leg, weights) {
                debug!(
                    leg = %s.key(),
                    composite = format!("{:.1}", s.composite),
                    odds_value = format!("{:.1}", s.odds_value),
                    rules = ?s.rules_fired,
                    "Leg scored"
                );
                scored.push(s);
            }
        }

        sort_by_composite(&mut scored);

        info!(
            legs_in = pool.len(),
            scored = scored.len(),
            skipped,
            "Pool scored"
        );
        scored
    }
}

/// Composite descending, key ascending.
pub fn sort_by_composite(legs: &mut [ScoredLeg]) {
    legs.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.key().cmp(&b.key()))
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
