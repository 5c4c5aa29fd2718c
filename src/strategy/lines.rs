//! Alternate line selection for player props.
//!
//! Aggressive profiles may trade part of a leg's projection cushion for a
//! better price by moving to an alternate line. Everything else keeps the
//! primary line.

use std::fmt;

use super::odds::price_points;
use crate::types::{AltLine, PlayerLeg};

/// Alternates priced outside this window are ignored.
const MIN_ALT_PRICE: f64 = -150.0;
const MAX_ALT_PRICE: f64 = 200.0;
/// An alternate must beat the primary price by more than this many points.
const MIN_PRICE_IMPROVEMENT: f64 = 15.0;

/// Strategy tags that signal alternate-line intent.
const ALT_INTENT_MARKERS: &[&str] = &["alt", "aggressive", "plus", "boost"];

/// Minimum projection cushion required before an alternate is considered.
pub fn min_buffer_for_stat(stat: &str) -> f64 {
    match stat.to_lowercase().as_str() {
        "points" | "pts" => 2.0,
        "rebounds" | "reb" => 1.5,
        "assists" | "ast" => 1.5,
        "threes" | "threes_made" | "3pm" => 0.5,
        "pra" | "points_rebounds_assists" => 3.0,
        "passing_yards" => 15.0,
        "rushing_yards" | "receiving_yards" => 8.0,
        "hits" | "shots_on_goal" => 0.5,
        "strikeouts" => 1.0,
        _ => 1.0,
    }
}

/// Options pulled from the profile.
#[derive(Debug, Clone, Copy)]
pub struct LineOptions<'a> {
    pub strategy: &'a str,
    pub use_alt_lines: bool,
    pub prefer_plus_money: bool,
    pub buffer_multiplier: f64,
}

/// Why a line was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineReason {
    SafeProfile,
    NoProjection,
    InsufficientBuffer,
    NoQualifyingAlternate,
    PrimaryPriceKept,
    PlusMoneyAlternate,
    BetterPriceAlternate,
}

impl fmt::Display for LineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineReason::SafeProfile => "safe profile",
            LineReason::NoProjection => "no projection",
            LineReason::InsufficientBuffer => "insufficient buffer",
            LineReason::NoQualifyingAlternate => "no qualifying alternate",
            LineReason::PrimaryPriceKept => "primary price kept",
            LineReason::PlusMoneyAlternate => "plus-money alternate",
            LineReason::BetterPriceAlternate => "better-price alternate",
        };
        f.write_str(s)
    }
}

/// The selected line and price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineChoice {
    pub line: f64,
    pub price: f64,
    pub reason: LineReason,
}

impl LineChoice {
    pub fn is_alternate(&self) -> bool {
        matches!(
            self.reason,
            LineReason::PlusMoneyAlternate | LineReason::BetterPriceAlternate
        )
    }

    /// Copy of the leg with this line and price applied.
    pub fn apply(&self, leg: &PlayerLeg) -> PlayerLeg {
        PlayerLeg {
            line: Some(self.line),
            price: Some(self.price),
            ..leg.clone()
        }
    }
}

fn signals_alt_intent(strategy: &str) -> bool {
    let strategy = strategy.to_lowercase();
    ALT_INTENT_MARKERS.iter().any(|m| strategy.contains(m))
}

/// Choose between the primary line and the leg's alternates.
///
/// Returns `None` only when the leg itself has no primary line or price.
pub fn select_line(leg: &PlayerLeg, alternates: &[AltLine], opts: LineOptions<'_>) -> Option<LineChoice> {
    let primary_line = leg.line?;
    let primary_price = leg.price?;
    let primary = |reason| {
        Some(LineChoice {
            line: primary_line,
            price: primary_price,
            reason,
        })
    };

    if !opts.use_alt_lines || !signals_alt_intent(opts.strategy) {
        return primary(LineReason::SafeProfile);
    }

    let Some(projection) = leg.projection else {
        return primary(LineReason::NoProjection);
    };

    let direction = leg.side.direction();
    let buffer = (projection - primary_line) * direction;
    let min_buffer = min_buffer_for_stat(&leg.stat);
    if buffer < min_buffer * opts.buffer_multiplier {
        return primary(LineReason::InsufficientBuffer);
    }

    // Over: primary < alt <= projection - margin.
    // Under: projection + margin <= alt < primary.
    let margin = min_buffer / 2.0;
    let mut qualifying: Vec<AltLine> = alternates
        .iter()
        .copied()
        .filter(|alt| {
            let moved = (alt.line - primary_line) * direction;
            let room = (projection - alt.line) * direction;
            moved > 0.0
                && room >= margin
                && (MIN_ALT_PRICE..=MAX_ALT_PRICE).contains(&alt.price)
        })
        .collect();

    if qualifying.is_empty() {
        return primary(LineReason::NoQualifyingAlternate);
    }

    // Most cushion first: closest to the primary line.
    qualifying.sort_by(|a, b| {
        let da = (a.line - primary_line).abs();
        let db = (b.line - primary_line).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });

    if opts.prefer_plus_money {
        if let Some(alt) = qualifying.iter().find(|a| a.price >= 100.0) {
            return Some(LineChoice {
                line: alt.line,
                price: alt.price,
                reason: LineReason::PlusMoneyAlternate,
            });
        }
    }

    let best = qualifying.iter().copied().fold(None::<AltLine>, |best, alt| match best {
        Some(b) if price_points(b.price) >= price_points(alt.price) => Some(b),
        _ => Some(alt),
    });

    match best {
        Some(alt) if price_points(alt.price) - price_points(primary_price) > MIN_PRICE_IMPROVEMENT => {
            Some(LineChoice {
                line: alt.line,
                price: alt.price,
                reason: LineReason::BetterPriceAlternate,
            })
        }
        _ => primary(LineReason::PrimaryPriceKept),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
