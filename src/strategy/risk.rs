//! Exposure control.
//!
//! `UsageTracker` enforces per-tier leg reuse and player caps plus per-parlay
//! team and category caps. `ConflictDetector` rejects legs that contradict or
//! duplicate a leg already in the draft.

use std::collections::{HashMap, HashSet};

use super::tiers::UsageCaps;
use crate::types::{BetType, Leg};

// ---------------------------------------------------------------------------
// Rejection reasons
// ---------------------------------------------------------------------------

/// Why a candidate leg or a finished draft was turned away.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectionReason {
    #[error("leg {0} already used this tier")]
    KeyUsed(String),

    #[error("player {player} at cap ({count})")]
    PlayerCap { player: String, count: u32 },

    #[error("team {team} at cap ({count})")]
    TeamCap { team: String, count: u32 },

    #[error("category {category} at cap ({count})")]
    CategoryCap { category: String, count: u32 },

    #[error("duplicate leg {0} in draft")]
    DuplicateKey(String),

    #[error("draft already holds a {bet_type} leg on {event}")]
    SameMarket { event: String, bet_type: BetType },

    #[error("draft already holds {player} {stat}")]
    SamePlayerStat { player: String, stat: String },

    #[error("hit rate {hit_rate:.3} below floor {floor:.3}")]
    HitRateFloor { hit_rate: f64, floor: f64 },

    #[error("odds value {score:.1} below floor {floor:.1}")]
    OddsValueFloor { score: f64, floor: f64 },

    #[error("hybrid draft already holds {count} {kind} legs")]
    HybridTypeCap { kind: &'static str, count: usize },

    #[error("projection sits {buffer:.1} on the wrong side of the line")]
    NegativeEdge { buffer: f64 },

    #[error("combined probability {combined:.4} below {floor:.4}")]
    LowConfidence { combined: f64, floor: f64 },

    #[error("edge {edge:.4} below {floor:.4}")]
    LowEdge { edge: f64, floor: f64 },

    #[error("sharpe {sharpe:.4} below {floor:.4}")]
    LowSharpe { sharpe: f64, floor: f64 },

    #[error("only {golden} of {players} player legs in golden categories")]
    GoldenShortfall { golden: usize, players: usize },

    #[error("no leg from {0}")]
    MissingSport(String),
}

// ---------------------------------------------------------------------------
// Usage tracker
// ---------------------------------------------------------------------------

/// Mutable usage state for one tier run.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    caps: UsageCaps,
    used_keys: HashSet<String>,
    player_counts: HashMap<String, u32>,
    // Reset by `begin_parlay`.
    team_counts: HashMap<String, u32>,
    category_counts: HashMap<String, u32>,
}

impl UsageTracker {
    pub fn new(caps: UsageCaps) -> Self {
        Self {
            caps,
            used_keys: HashSet::new(),
            player_counts: HashMap::new(),
            team_counts: HashMap::new(),
            category_counts: HashMap::new(),
        }
    }

    pub fn caps(&self) -> UsageCaps {
        self.caps
    }

    /// Clear the per-parlay counters before a new draft.
    pub fn begin_parlay(&mut self) {
        self.team_counts.clear();
        self.category_counts.clear();
    }

    /// Tier-wide checks: key reuse and player exposure.
    pub fn check_global(&self, leg: &Leg) -> Result<(), RejectionReason> {
        let key = leg.key();
        if self.used_keys.contains(&key) {
            return Err(RejectionReason::KeyUsed(key));
        }
        if let Some(p) = leg.as_player() {
            let count = self.player_count(&p.player_id);
            if count >= self.caps.player {
                return Err(RejectionReason::PlayerCap {
                    player: p.player_id.clone(),
                    count,
                });
            }
        }
        Ok(())
    }

    /// Draft-scoped checks: team and category exposure.
    pub fn check_parlay(&self, leg: &Leg) -> Result<(), RejectionReason> {
        if let Some(t) = leg.as_team() {
            for team in [&t.home_team, &t.away_team] {
                let count = self.team_counts.get(team).copied().unwrap_or(0);
                if count >= self.caps.team {
                    return Err(RejectionReason::TeamCap {
                        team: team.clone(),
                        count,
                    });
                }
            }
        }
        let category = leg.category();
        let count = self.category_counts.get(&category).copied().unwrap_or(0);
        if count >= self.caps.category {
            return Err(RejectionReason::CategoryCap { category, count });
        }
        Ok(())
    }

    /// Record an accepted leg. Takes effect immediately, even if the draft is
    /// later discarded.
    pub fn commit(&mut self, leg: &Leg) {
        self.used_keys.insert(leg.key());
        match leg {
            Leg::Player(p) => {
                *self.player_counts.entry(p.player_id.clone()).or_insert(0) += 1;
            }
            Leg::Team(t) => {
                *self.team_counts.entry(t.home_team.clone()).or_insert(0) += 1;
                *self.team_counts.entry(t.away_team.clone()).or_insert(0) += 1;
            }
        }
        *self.category_counts.entry(leg.category()).or_insert(0) += 1;
    }

    /// Mark a key used without touching exposure counts. Used for the
    /// alternate line a primary leg was moved to.
    pub fn reserve_key(&mut self, key: String) {
        self.used_keys.insert(key);
    }

    pub fn is_used(&self, key: &str) -> bool {
        self.used_keys.contains(key)
    }

    pub fn player_count(&self, player_id: &str) -> u32 {
        self.player_counts.get(player_id).copied().unwrap_or(0)
    }

    pub fn used_count(&self) -> usize {
        self.used_keys.len()
    }
}

// ---------------------------------------------------------------------------
// Conflict detection
// ---------------------------------------------------------------------------

/// Stateless check of a candidate against the current draft.
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn check(draft: &[Leg], candidate: &Leg) -> Result<(), RejectionReason> {
        let key = candidate.key();
        for existing in draft {
            if existing.key() == key {
                return Err(RejectionReason::DuplicateKey(key));
            }
            match (existing, candidate) {
                (Leg::Team(a), Leg::Team(b))
                    if a.event_id == b.event_id && a.bet_type == b.bet_type =>
                {
                    return Err(RejectionReason::SameMarket {
                        event: b.event_id.clone(),
                        bet_type: b.bet_type,
                    });
                }
                (Leg::Player(a), Leg::Player(b))
                    if a.player_id == b.player_id && a.stat.eq_ignore_ascii_case(&b.stat) =>
                {
                    return Err(RejectionReason::SamePlayerStat {
                        player: b.player_id.clone(),
                        stat: b.stat.to_lowercase(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
