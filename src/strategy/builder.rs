//! Greedy parlay construction.
//!
//! Walks the ranked pool for one profile, taking each leg that clears usage,
//! conflict and quality checks until the profile's leg count is reached.

use std::cmp::Ordering;

use tracing::debug;

use super::lines::{select_line, LineOptions};
use super::risk::{ConflictDetector, RejectionReason, UsageTracker};
use super::scoring::{sort_by_composite, ScoredLeg};
use super::tiers::{LegMix, Profile, SortMode, Tier};
use crate::types::Leg;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Legs selected for one profile, lines resolved.
#[derive(Debug, Clone)]
pub struct Draft {
    pub strategy: String,
    pub legs: Vec<ScoredLeg>,
    /// Legs moved off their primary line.
    pub alternates: usize,
}

impl Draft {
    pub fn legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().map(|s| &s.leg)
    }

    pub fn player_count(&self) -> usize {
        self.legs.iter().filter(|s| !s.leg.is_team()).count()
    }

    pub fn team_count(&self) -> usize {
        self.legs.iter().filter(|s| s.leg.is_team()).count()
    }
}

#[derive(Debug, Clone)]
pub enum BuildOutcome {
    Drafted(Draft),
    /// Pool ran out before the profile was filled. Keys taken along the way
    /// stay consumed.
    Short { found: usize, needed: usize },
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ParlayBuilder<'a> {
    tier: &'a Tier,
}

impl<'a> ParlayBuilder<'a> {
    pub fn new(tier: &'a Tier) -> Self {
        Self { tier }
    }

    /// Order the profile's slice of the pool.
    pub fn candidates(&self, profile: &Profile, pool: &[ScoredLeg]) -> Vec<ScoredLeg> {
        let mut legs: Vec<ScoredLeg> = pool
            .iter()
            .filter(|s| profile.admits(&s.leg))
            .cloned()
            .collect();

        let mode = match profile.sort {
            SortMode::CategoryWeight if !self.tier.name.is_top() => SortMode::Composite,
            mode => mode,
        };

        match mode {
            SortMode::Composite => sort_by_composite(&mut legs),
            SortMode::HitRate => legs.sort_by(|a, b| {
                cmp_desc(a.leg.hit_rate(), b.leg.hit_rate())
                    .then_with(|| cmp_desc(a.composite, b.composite))
                    .then_with(|| a.key().cmp(&b.key()))
            }),
            SortMode::CategoryWeight => legs.sort_by(|a, b| {
                cmp_desc(a.category_weight, b.category_weight)
                    .then_with(|| cmp_desc(a.composite, b.composite))
                    .then_with(|| a.key().cmp(&b.key()))
            }),
        }
        legs
    }

    /// Build one draft for `profile`, mutating `tracker` as legs are taken.
    pub fn build(
        &self,
        profile: &Profile,
        pool: &[ScoredLeg],
        tracker: &mut UsageTracker,
    ) -> BuildOutcome {
        tracker.begin_parlay();

        let mut draft: Vec<ScoredLeg> = Vec::with_capacity(profile.legs);
        let mut resolved: Vec<Leg> = Vec::with_capacity(profile.legs);
        let mut alternates = 0usize;

        for candidate in self.candidates(profile, pool) {
            if draft.len() >= profile.legs {
                break;
            }

            if let Err(reason) = self.screen(profile, &candidate, &resolved, tracker) {
                debug!(
                    strategy = %profile.strategy,
                    leg = %candidate.key(),
                    %reason,
                    "Leg rejected"
                );
                continue;
            }

            let leg = match &candidate.leg {
                Leg::Team(_) => candidate.leg.clone(),
                Leg::Player(p) => {
                    let opts = LineOptions {
                        strategy: &profile.strategy,
                        use_alt_lines: profile.use_alt_lines,
                        prefer_plus_money: profile.prefer_plus_money,
                        buffer_multiplier: profile.buffer_multiplier,
                    };
                    let Some(choice) = select_line(p, &p.alt_lines, opts) else {
                        continue;
                    };
                    let applied = choice.apply(p);

                    if let (Some(buffer), Some(projection)) =
                        (applied.projection_buffer(), applied.projection)
                    {
                        if buffer < 0.0 && projection > 0.0 {
                            let reason = RejectionReason::NegativeEdge { buffer };
                            debug!(
                                strategy = %profile.strategy,
                                leg = %candidate.key(),
                                %reason,
                                "Leg rejected"
                            );
                            continue;
                        }
                    }

                    if choice.is_alternate() {
                        let resolved_key = Leg::Player(applied.clone()).key();
                        if tracker.is_used(&resolved_key) {
                            let reason = RejectionReason::KeyUsed(resolved_key);
                            debug!(
                                strategy = %profile.strategy,
                                leg = %candidate.key(),
                                %reason,
                                "Leg rejected"
                            );
                            continue;
                        }
                        alternates += 1;
                        debug!(
                            leg = %candidate.key(),
                            line = choice.line,
                            price = choice.price,
                            reason = %choice.reason,
                            "Alternate line selected"
                        );
                    }
                    Leg::Player(applied)
                }
            };

            // Exposure is counted on the pool's primary line; an alternate
            // line's key is reserved as well.
            tracker.commit(&candidate.leg);
            if leg != candidate.leg {
                tracker.reserve_key(leg.key());
            }
            resolved.push(candidate.leg.clone());
            draft.push(ScoredLeg { leg, ..candidate });
        }

        if draft.len() < profile.legs {
            debug!(
                strategy = %profile.strategy,
                found = draft.len(),
                needed = profile.legs,
                "Draft short, discarded"
            );
            return BuildOutcome::Short {
                found: draft.len(),
                needed: profile.legs,
            };
        }

        BuildOutcome::Drafted(Draft {
            strategy: profile.strategy.clone(),
            legs: draft,
            alternates,
        })
    }

    /// Every per-candidate check short of line selection.
    fn screen(
        &self,
        profile: &Profile,
        candidate: &ScoredLeg,
        draft: &[Leg],
        tracker: &UsageTracker,
    ) -> Result<(), RejectionReason> {
        let leg = &candidate.leg;
        tracker.check_global(leg)?;
        ConflictDetector::check(draft, leg)?;
        tracker.check_parlay(leg)?;

        let floor = self
            .tier
            .thresholds
            .min_hit_rate
            .max(profile.min_hit_rate.unwrap_or(0.0));
        if leg.hit_rate() < floor {
            return Err(RejectionReason::HitRateFloor {
                hit_rate: leg.hit_rate(),
                floor,
            });
        }

        if let Some(floor) = profile.min_odds_value {
            if candidate.odds_value < floor {
                return Err(RejectionReason::OddsValueFloor {
                    score: candidate.odds_value,
                    floor,
                });
            }
        }

        if profile.mix == LegMix::Hybrid {
            let cap = profile.hybrid_type_cap();
            let same_kind = draft.iter().filter(|l| l.is_team() == leg.is_team()).count();
            if same_kind >= cap {
                return Err(RejectionReason::HybridTypeCap {
                    kind: if leg.is_team() { "team" } else { "player" },
                    count: same_kind,
                });
            }
        }

        Ok(())
    }
}

fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
