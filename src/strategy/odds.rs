//! Price conversions.
//!
//! American odds are the wire format for every leg; decimal odds and
//! break-even probabilities are derived from them here and nowhere else.

/// Break-even probability of a standard -110 price (110 / 210).
pub const STANDARD_BREAKEVEN: f64 = 0.524;

/// Convert American odds to decimal odds (stake included).
///
/// -110 → 1.909, +150 → 2.50.
pub fn american_to_decimal(price: f64) -> f64 {
    if price > 0.0 {
        1.0 + price / 100.0
    } else if price < 0.0 {
        1.0 + 100.0 / price.abs()
    } else {
        1.0
    }
}

/// Convert decimal odds back to American odds, rounded to whole points.
pub fn decimal_to_american(decimal: f64) -> i32 {
    if decimal <= 1.0 {
        return 0;
    }
    let american = if decimal >= 2.0 {
        (decimal - 1.0) * 100.0
    } else {
        -100.0 / (decimal - 1.0)
    };
    american.round() as i32
}

/// Break-even probability implied by an American price.
pub fn implied_probability(price: f64) -> f64 {
    if price < 0.0 {
        let p = price.abs();
        p / (p + 100.0)
    } else if price > 0.0 {
        100.0 / (price + 100.0)
    } else {
        0.5
    }
}

/// Product of each leg's decimal odds, capped at `max_multiple`.
pub fn combined_decimal_odds(prices: &[f64], max_multiple: f64) -> f64 {
    let product: f64 = prices.iter().map(|p| american_to_decimal(*p)).product();
    product.min(max_multiple)
}

/// Map American odds onto a linear scale so prices on either side of even
/// money can be compared: -110 → -10, +105 → +5.
pub fn price_points(price: f64) -> f64 {
    if price >= 100.0 {
        price - 100.0
    } else if price <= -100.0 {
        price + 100.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
