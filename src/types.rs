//! Shared types for the SLATE engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that strategy, engine, and storage
//! modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction of a leg.
///
/// Player props use `Over`/`Under`. Team legs use `Home`/`Away` for spreads
/// and moneylines and `Over`/`Under` for totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
    Home,
    Away,
}

impl Side {
    /// +1 when a higher outcome favours this side, -1 when a lower one does.
    pub fn direction(&self) -> f64 {
        match self {
            Side::Over | Side::Home => 1.0,
            Side::Under | Side::Away => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Over => "over",
            Side::Under => "under",
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team market type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Spread,
    Total,
    Moneyline,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Spread => "spread",
            BetType::Total => "total",
            BetType::Moneyline => "moneyline",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempt to parse a string into a BetType (case-insensitive).
impl std::str::FromStr for BetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spread" | "spreads" | "handicap" => Ok(BetType::Spread),
            "total" | "totals" => Ok(BetType::Total),
            "moneyline" | "h2h" | "ml" => Ok(BetType::Moneyline),
            _ => Err(anyhow::anyhow!("Unknown bet type: {s}")),
        }
    }
}

/// Lifecycle status of a generated parlay. Settlement is handled elsewhere,
/// so the engine only ever emits `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParlayStatus {
    Pending,
}

impl fmt::Display for ParlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParlayStatus::Pending => write!(f, "pending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Legs
// ---------------------------------------------------------------------------

/// An alternate line offered for a player prop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltLine {
    pub line: f64,
    /// American odds.
    pub price: f64,
}

/// A player-stat over/under proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeg {
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    pub sport: String,
    pub event_id: String,
    /// Stat category, e.g. "points", "rebounds", "passing_yards".
    pub stat: String,
    pub side: Side,
    pub line: Option<f64>,
    /// American odds.
    pub price: Option<f64>,
    /// Estimated hit rate as a fraction (0.0–1.0).
    pub hit_rate: f64,
    /// Projected stat value from the upstream model.
    #[serde(default)]
    pub projection: Option<f64>,
    /// Upstream quality score (0–100), when the pipeline supplies one.
    #[serde(default)]
    pub quality_score: Option<f64>,
    /// Upstream reliability flag (stable minutes, confirmed starter, ...).
    #[serde(default)]
    pub reliable: bool,
    #[serde(default)]
    pub alt_lines: Vec<AltLine>,
}

impl PlayerLeg {
    /// Signed cushion between projection and line for this leg's side.
    /// Positive when the projection agrees with the bet direction.
    pub fn projection_buffer(&self) -> Option<f64> {
        let projection = self.projection?;
        let line = self.line?;
        Some((projection - line) * self.side.direction())
    }
}

/// A team spread / total / moneyline proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLeg {
    pub event_id: String,
    pub sport: String,
    pub home_team: String,
    pub away_team: String,
    pub bet_type: BetType,
    pub side: Side,
    /// Absent for moneylines.
    #[serde(default)]
    pub line: Option<f64>,
    pub price: Option<f64>,
    pub hit_rate: f64,
    #[serde(default)]
    pub quality_score: Option<f64>,
    /// Sharp-money signal (0–100) from the upstream pipeline.
    #[serde(default)]
    pub sharp_score: Option<f64>,
}

/// A single wagerable proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Leg {
    Player(PlayerLeg),
    Team(TeamLeg),
}

impl Leg {
    /// Canonical key: `event|bet_type|side` for team legs,
    /// `player|stat|side|line` for player legs.
    pub fn key(&self) -> String {
        match self {
            Leg::Team(t) => format!("{}|{}|{}", t.event_id, t.bet_type, t.side),
            Leg::Player(p) => format!(
                "{}|{}|{}|{}",
                p.player_id,
                p.stat.to_lowercase(),
                p.side,
                format_line(p.line)
            ),
        }
    }

    /// Usage category: the stat for player legs, the bet type for team legs.
    pub fn category(&self) -> String {
        match self {
            Leg::Player(p) => p.stat.to_lowercase(),
            Leg::Team(t) => t.bet_type.as_str().to_string(),
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Leg::Player(p) => p.side,
            Leg::Team(t) => t.side,
        }
    }

    pub fn sport(&self) -> &str {
        match self {
            Leg::Player(p) => &p.sport,
            Leg::Team(t) => &t.sport,
        }
    }

    pub fn event_id(&self) -> &str {
        match self {
            Leg::Player(p) => &p.event_id,
            Leg::Team(t) => &t.event_id,
        }
    }

    pub fn hit_rate(&self) -> f64 {
        match self {
            Leg::Player(p) => p.hit_rate,
            Leg::Team(t) => t.hit_rate,
        }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            Leg::Player(p) => p.price,
            Leg::Team(t) => t.price,
        }
    }

    pub fn line(&self) -> Option<f64> {
        match self {
            Leg::Player(p) => p.line,
            Leg::Team(t) => t.line,
        }
    }

    pub fn quality_score(&self) -> Option<f64> {
        match self {
            Leg::Player(p) => p.quality_score,
            Leg::Team(t) => t.quality_score,
        }
    }

    pub fn is_team(&self) -> bool {
        matches!(self, Leg::Team(_))
    }

    pub fn as_player(&self) -> Option<&PlayerLeg> {
        match self {
            Leg::Player(p) => Some(p),
            Leg::Team(_) => None,
        }
    }

    pub fn as_team(&self) -> Option<&TeamLeg> {
        match self {
            Leg::Team(t) => Some(t),
            Leg::Player(_) => None,
        }
    }

    /// Describe why a leg cannot be priced, if it can't.
    pub fn malformation(&self) -> Option<&'static str> {
        match self.price() {
            None => return Some("missing price"),
            // American odds live outside (-100, +100).
            Some(p) if !p.is_finite() || p.abs() < 100.0 => return Some("invalid price"),
            Some(_) => {}
        }
        let needs_line = match self {
            Leg::Player(_) => true,
            Leg::Team(t) => t.bet_type != BetType::Moneyline,
        };
        if needs_line && self.line().is_none() {
            return Some("missing line");
        }
        if !(0.0..=1.0).contains(&self.hit_rate()) {
            return Some("hit rate outside 0..1");
        }
        None
    }

    /// `malformation` as a typed error.
    pub fn validate(&self) -> Result<(), SlateError> {
        match self.malformation() {
            Some(reason) => Err(SlateError::MalformedLeg {
                key: self.key(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = self
            .price()
            .map(|p| format!("{p:+.0}"))
            .unwrap_or_else(|| "n/a".to_string());
        match self {
            Leg::Player(p) => write!(
                f,
                "{} {} {} {} ({price})",
                display_name(p),
                p.stat,
                p.side,
                format_line(p.line)
            ),
            Leg::Team(t) => write!(
                f,
                "{} @ {} {} {} {} ({price})",
                t.away_team,
                t.home_team,
                t.bet_type,
                t.side,
                format_line(t.line)
            ),
        }
    }
}

fn display_name(p: &PlayerLeg) -> &str {
    if p.player_name.is_empty() {
        &p.player_id
    } else {
        &p.player_name
    }
}

/// Lines are keyed at one decimal place so 24.5 and 24.50 collide.
pub fn format_line(line: Option<f64>) -> String {
    match line {
        Some(l) => format!("{l:.1}"),
        None => "-".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Legs supplied by the upstream eligibility/scoring pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidatePool {
    #[serde(default)]
    pub player_legs: Vec<PlayerLeg>,
    #[serde(default)]
    pub team_legs: Vec<TeamLeg>,
    /// Stat categories with strong calibrated history.
    #[serde(default)]
    pub golden_categories: HashSet<String>,
}

impl CandidatePool {
    pub fn len(&self) -> usize {
        self.player_legs.len() + self.team_legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All legs as the tagged union, player legs first.
    pub fn legs(&self) -> Vec<Leg> {
        self.player_legs
            .iter()
            .cloned()
            .map(Leg::Player)
            .chain(self.team_legs.iter().cloned().map(Leg::Team))
            .collect()
    }

    pub fn is_golden(&self, category: &str) -> bool {
        self.golden_categories
            .iter()
            .any(|g| g.eq_ignore_ascii_case(category))
    }
}

/// Learned weight for a category (optionally split by side).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    /// 1.0 is neutral.
    pub weight: f64,
    /// Historical hit rate for the category as a fraction.
    #[serde(default)]
    pub calibrated_hit_rate: Option<f64>,
}

impl Default for CategoryWeight {
    fn default() -> Self {
        Self {
            weight: 1.0,
            calibrated_hit_rate: None,
        }
    }
}

/// Mapping `category[_side] → weight` from the feedback subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights(pub HashMap<String, CategoryWeight>);

impl CategoryWeights {
    /// Side-specific entry first, then the bare category, then neutral.
    pub fn lookup(&self, category: &str, side: Side) -> CategoryWeight {
        let category = category.to_lowercase();
        self.0
            .get(&format!("{category}_{side}"))
            .or_else(|| self.0.get(&category))
            .copied()
            .unwrap_or_default()
    }

    pub fn insert(&mut self, key: &str, weight: CategoryWeight) {
        self.0.insert(key.to_lowercase(), weight);
    }
}

// ---------------------------------------------------------------------------
// Parlay
// ---------------------------------------------------------------------------

/// An accepted multi-leg bet, ready for the persistence sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parlay {
    pub id: Uuid,
    pub target_date: NaiveDate,
    pub tier: String,
    /// Strategy label of the profile that built it.
    pub strategy: String,
    /// Legs with resolved lines and prices, in selection order.
    pub legs: Vec<Leg>,
    pub combined_probability: f64,
    pub implied_probability: f64,
    /// Raw edge (combined − implied).
    pub edge: f64,
    /// Edge after the favourable-signal floor.
    pub effective_edge: f64,
    pub edge_floored: bool,
    pub sharpe: f64,
    pub decimal_odds: f64,
    pub american_odds: i32,
    pub stake: Decimal,
    pub fingerprint: String,
    pub status: ParlayStatus,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for Parlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {} legs {:+} | p={:.1}% edge={:+.1}% sharpe={:.3} stake=${}",
            self.tier,
            self.strategy,
            self.legs.len(),
            self.american_odds,
            self.combined_probability * 100.0,
            self.effective_edge * 100.0,
            self.sharpe,
            self.stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SLATE.
#[derive(Debug, thiserror::Error)]
pub enum SlateError {
    #[error("Malformed leg {key}: {reason}")]
    MalformedLeg { key: String, reason: String },

    #[error("Candidate pool too thin: {available} usable legs, need {required}")]
    PoolBelowFloor { available: usize, required: usize },

    #[error("Invalid tier policy: {0}")]
    InvalidPolicy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
