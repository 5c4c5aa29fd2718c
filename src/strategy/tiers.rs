//! Tier policy: the static table of quality tiers and their profile templates.
//!
//! Defaults live here; `config.toml` may replace the whole table with its own
//! `[[tiers]]` entries.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::types::{BetType, Leg, SlateError};

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// Quality band, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierName {
    Exploration,
    Validation,
    Execution,
}

impl TierName {
    /// Execution is the top tier: golden-category gate and category-weight
    /// ordering only apply there.
    pub fn is_top(&self) -> bool {
        matches!(self, TierName::Execution)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::Exploration => "exploration",
            TierName::Validation => "validation",
            TierName::Execution => "execution",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exposure caps enforced by the usage tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCaps {
    /// Parlays a single player may appear in across the tier run.
    pub player: u32,
    /// Legs per parlay touching the same team.
    pub team: u32,
    /// Legs per parlay sharing a category.
    pub category: u32,
}

/// Acceptance thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Per-leg hit-rate floor (fraction).
    pub min_hit_rate: f64,
    /// Minimum effective parlay edge.
    pub min_edge: f64,
    /// Minimum Sharpe-like ratio.
    pub min_sharpe: f64,
    /// Minimum combined probability.
    pub min_confidence: f64,
}

/// How much to stake on an accepted parlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StakePolicy {
    Flat {
        amount: Decimal,
    },
    Kelly {
        multiplier: f64,
        max_bet_pct: f64,
        min_stake: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: TierName,
    /// Parlays to produce for this tier.
    pub target_count: usize,
    pub caps: UsageCaps,
    pub thresholds: TierThresholds,
    pub stake: StakePolicy,
    pub profiles: Vec<Profile>,
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Which leg shapes a profile draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegMix {
    #[default]
    PlayerOnly,
    TeamOnly,
    Hybrid,
}

impl LegMix {
    pub fn admits(&self, leg: &Leg) -> bool {
        match self {
            LegMix::PlayerOnly => !leg.is_team(),
            LegMix::TeamOnly => leg.is_team(),
            LegMix::Hybrid => true,
        }
    }
}

/// Pool ordering preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    HitRate,
    #[default]
    Composite,
    /// Top tier only; other tiers fall back to `Composite`.
    CategoryWeight,
}

/// Immutable template for one parlay shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Strategy label carried onto the parlay.
    pub strategy: String,
    pub legs: usize,
    /// Empty means any sport.
    #[serde(default)]
    pub sports: Vec<String>,
    /// Applies to team legs; empty means any bet type.
    #[serde(default)]
    pub bet_types: Vec<BetType>,
    #[serde(default)]
    pub mix: LegMix,
    #[serde(default)]
    pub sort: SortMode,
    #[serde(default)]
    pub min_odds_value: Option<f64>,
    #[serde(default)]
    pub min_hit_rate: Option<f64>,
    #[serde(default)]
    pub use_alt_lines: bool,
    #[serde(default)]
    pub prefer_plus_money: bool,
    #[serde(default = "default_buffer_multiplier")]
    pub buffer_multiplier: f64,
}

fn default_buffer_multiplier() -> f64 {
    1.0
}

impl Profile {
    pub fn new(strategy: &str, legs: usize, mix: LegMix) -> Self {
        Self {
            strategy: strategy.to_string(),
            legs,
            sports: Vec::new(),
            bet_types: Vec::new(),
            mix,
            sort: SortMode::default(),
            min_odds_value: None,
            min_hit_rate: None,
            use_alt_lines: false,
            prefer_plus_money: false,
            buffer_multiplier: default_buffer_multiplier(),
        }
    }

    pub fn with_sports(mut self, sports: &[&str]) -> Self {
        self.sports = sports.iter().map(|s| s.to_lowercase()).collect();
        self
    }

    pub fn with_bet_types(mut self, bet_types: &[BetType]) -> Self {
        self.bet_types = bet_types.to_vec();
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_alt_lines(mut self, prefer_plus_money: bool, buffer_multiplier: f64) -> Self {
        self.use_alt_lines = true;
        self.prefer_plus_money = prefer_plus_money;
        self.buffer_multiplier = buffer_multiplier;
        self
    }

    pub fn with_floors(mut self, min_hit_rate: Option<f64>, min_odds_value: Option<f64>) -> Self {
        self.min_hit_rate = min_hit_rate;
        self.min_odds_value = min_odds_value;
        self
    }

    /// Whether a leg passes this profile's sport / bet-type / mix filters.
    pub fn admits(&self, leg: &Leg) -> bool {
        if !self.mix.admits(leg) {
            return false;
        }
        if !self.sports.is_empty() && !self.sports.iter().any(|s| s.eq_ignore_ascii_case(leg.sport())) {
            return false;
        }
        match leg.as_team() {
            Some(t) if !self.bet_types.is_empty() => self.bet_types.contains(&t.bet_type),
            _ => true,
        }
    }

    /// Cross-sport profiles must cover every named sport.
    pub fn is_cross_sport(&self) -> bool {
        self.sports.len() >= 2
    }

    /// Hybrid and team-only parlays face a stricter edge bar.
    pub fn has_team_exposure(&self) -> bool {
        matches!(self.mix, LegMix::Hybrid | LegMix::TeamOnly)
    }

    /// Maximum legs of either type in a hybrid parlay, leaving room for at
    /// least `max(1, legs / 3)` of the other.
    pub fn hybrid_type_cap(&self) -> usize {
        let min_other = (self.legs / 3).max(1);
        self.legs.saturating_sub(min_other)
    }
}

// ---------------------------------------------------------------------------
// Policy table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPolicy {
    pub tiers: Vec<Tier>,
}

impl TierPolicy {
    pub fn new(tiers: Vec<Tier>) -> Self {
        Self { tiers }
    }

    pub fn tier(&self, name: TierName) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Reject tables the builder cannot run against.
    pub fn validate(&self) -> Result<(), SlateError> {
        let invalid = |msg: String| Err(SlateError::InvalidPolicy(msg));

        if self.tiers.is_empty() {
            return invalid("no tiers defined".into());
        }
        let mut seen = HashSet::new();
        for tier in &self.tiers {
            if !seen.insert(tier.name) {
                return invalid(format!("tier {} defined twice", tier.name));
            }
            if tier.target_count == 0 {
                return invalid(format!("tier {} has a zero target count", tier.name));
            }
            if tier.caps.player == 0 || tier.caps.team == 0 || tier.caps.category == 0 {
                return invalid(format!("tier {} has a zero usage cap", tier.name));
            }
            if !(0.0..=1.0).contains(&tier.thresholds.min_hit_rate)
                || !(0.0..=1.0).contains(&tier.thresholds.min_confidence)
            {
                return invalid(format!("tier {} has a probability threshold outside 0..1", tier.name));
            }
            if let StakePolicy::Kelly { multiplier, max_bet_pct, .. } = tier.stake {
                if !(0.0..=1.0).contains(&multiplier) || !(0.0..=1.0).contains(&max_bet_pct) {
                    return invalid(format!("tier {} has Kelly settings outside 0..1", tier.name));
                }
            }
            if tier.profiles.is_empty() {
                return invalid(format!("tier {} has no profiles", tier.name));
            }
            for profile in &tier.profiles {
                if profile.legs < 2 {
                    return invalid(format!(
                        "profile {} in tier {} needs at least 2 legs",
                        profile.strategy, tier.name
                    ));
                }
                if profile.buffer_multiplier <= 0.0 {
                    return invalid(format!(
                        "profile {} in tier {} has a non-positive buffer multiplier",
                        profile.strategy, tier.name
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(vec![
            Tier {
                name: TierName::Exploration,
                target_count: 8,
                caps: UsageCaps { player: 3, team: 2, category: 3 },
                thresholds: TierThresholds {
                    min_hit_rate: 0.52,
                    min_edge: 0.0,
                    min_sharpe: 0.0,
                    min_confidence: 0.03,
                },
                stake: StakePolicy::Flat { amount: dec!(5) },
                profiles: vec![
                    Profile::new("explore_props", 4, LegMix::PlayerOnly),
                    Profile::new("explore_alt_plus", 3, LegMix::PlayerOnly)
                        .with_alt_lines(true, 1.0),
                    Profile::new("explore_hybrid", 4, LegMix::Hybrid)
                        .with_sort(SortMode::HitRate),
                    Profile::new("explore_cross_sport", 3, LegMix::Hybrid)
                        .with_sports(&["nba", "nhl"]),
                ],
            },
            Tier {
                name: TierName::Validation,
                target_count: 5,
                caps: UsageCaps { player: 2, team: 1, category: 2 },
                thresholds: TierThresholds {
                    min_hit_rate: 0.55,
                    min_edge: 0.01,
                    min_sharpe: 0.02,
                    min_confidence: 0.08,
                },
                stake: StakePolicy::Flat { amount: dec!(10) },
                profiles: vec![
                    Profile::new("validate_props", 3, LegMix::PlayerOnly)
                        .with_sort(SortMode::HitRate)
                        .with_floors(None, Some(45.0)),
                    Profile::new("validate_team_sides", 3, LegMix::TeamOnly)
                        .with_bet_types(&[BetType::Spread, BetType::Moneyline]),
                    Profile::new("validate_aggressive_alt", 3, LegMix::PlayerOnly)
                        .with_alt_lines(false, 1.25),
                ],
            },
            Tier {
                name: TierName::Execution,
                target_count: 3,
                caps: UsageCaps { player: 1, team: 1, category: 2 },
                thresholds: TierThresholds {
                    min_hit_rate: 0.58,
                    min_edge: 0.02,
                    min_sharpe: 0.05,
                    min_confidence: 0.15,
                },
                stake: StakePolicy::Kelly {
                    multiplier: 0.25,
                    max_bet_pct: 0.03,
                    min_stake: dec!(5),
                },
                profiles: vec![
                    Profile::new("execute_golden", 3, LegMix::PlayerOnly)
                        .with_sort(SortMode::CategoryWeight)
                        .with_floors(Some(0.60), Some(50.0)),
                    Profile::new("execute_core", 2, LegMix::PlayerOnly)
                        .with_sort(SortMode::HitRate),
                    Profile::new("execute_hybrid", 3, LegMix::Hybrid),
                ],
            },
        ])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
