//! Stake sizing.
//!
//! Applies a tier's stake policy to an accepted parlay: either a flat amount
//! or fractional Kelly on the combined probability and payout.

use rust_decimal::prelude::*;
use tracing::debug;

use super::tiers::StakePolicy;

/// Sized stake with the Kelly numbers that produced it (zero for flat stakes).
#[derive(Debug, Clone, PartialEq)]
pub struct SizedStake {
    /// Raw Kelly fraction, floored at zero.
    pub kelly_fraction: f64,
    /// Fraction of bankroll after multiplier and cap.
    pub bet_fraction: f64,
    pub amount: Decimal,
}

pub struct StakeSizer {
    bankroll: Decimal,
}

impl StakeSizer {
    pub fn new(bankroll: Decimal) -> Self {
        Self { bankroll }
    }

    pub fn bankroll(&self) -> Decimal {
        self.bankroll
    }

    /// Raw Kelly fraction: f* = (bp - q) / b, with b the net payout per unit.
    pub fn kelly_fraction(probability: f64, decimal_odds: f64) -> f64 {
        let b = decimal_odds - 1.0;
        if b <= 0.0 {
            return 0.0;
        }
        let q = 1.0 - probability;
        ((b * probability - q) / b).max(0.0)
    }

    /// Stake for a parlay, rounded to cents.
    ///
    /// Kelly stakes never fall below the policy's minimum, including when the
    /// Kelly fraction is zero.
    pub fn size(&self, policy: &StakePolicy, probability: f64, decimal_odds: f64) -> SizedStake {
        match *policy {
            StakePolicy::Flat { amount } => SizedStake {
                kelly_fraction: 0.0,
                bet_fraction: 0.0,
                amount: amount.max(Decimal::ZERO).round_dp(2),
            },
            StakePolicy::Kelly {
                multiplier,
                max_bet_pct,
                min_stake,
            } => {
                let kelly = Self::kelly_fraction(probability, decimal_odds);
                let capped = (kelly * multiplier).min(max_bet_pct);
                let fraction = Decimal::from_f64_retain(capped).unwrap_or(Decimal::ZERO);
                let raw = (fraction * self.bankroll).max(Decimal::ZERO);
                let amount = raw.max(min_stake).round_dp(2);

                debug!(
                    raw_kelly = format!("{:.2}%", kelly * 100.0),
                    fractional = format!("{:.2}%", capped * 100.0),
                    stake = %amount,
                    "Stake sized"
                );

                SizedStake {
                    kelly_fraction: kelly,
                    bet_fraction: capped,
                    amount,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
