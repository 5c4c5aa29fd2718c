//! Deterministic slate inputs: NBA and NHL player boards plus NBA team
//! markets with both sides of every market listed.

use slate::data::SlateInputs;
use slate::types::*;

const NBA_STATS: [(&str, f64, f64); 4] = [
    ("points", 24.5, 2.0),
    ("rebounds", 8.5, 1.5),
    ("assists", 6.5, 1.5),
    ("threes", 2.5, 0.5),
];

const PRICES: [f64; 5] = [-125.0, -115.0, -110.0, 105.0, -140.0];

pub fn nba_player(i: usize) -> PlayerLeg {
    let (stat, line, step) = NBA_STATS[i % NBA_STATS.len()];
    let side = if i % 5 == 3 { Side::Under } else { Side::Over };
    let buffer = step * (1.0 + (i % 3) as f64);
    let projection = line + buffer * side.direction();
    let alt_line = line + step * side.direction();

    PlayerLeg {
        player_id: format!("nba-{i:02}"),
        player_name: format!("NBA Player {i}"),
        sport: "nba".to_string(),
        event_id: format!("nba-g{}", i / 4),
        stat: stat.to_string(),
        side,
        line: Some(line),
        price: Some(PRICES[i % PRICES.len()]),
        hit_rate: 0.56 + ((i * 7) % 19) as f64 * 0.01,
        projection: Some(projection),
        quality_score: Some(45.0 + (i % 6) as f64 * 5.0),
        reliable: i % 4 == 0,
        alt_lines: vec![AltLine { line: alt_line, price: 110.0 + (i % 3) as f64 * 10.0 }],
    }
}

pub fn nhl_player(i: usize) -> PlayerLeg {
    let (stat, line) = if i % 2 == 0 { ("shots_on_goal", 2.5) } else { ("points", 0.5) };
    PlayerLeg {
        player_id: format!("nhl-{i:02}"),
        player_name: format!("NHL Player {i}"),
        sport: "nhl".to_string(),
        event_id: format!("nhl-g{}", i / 4),
        stat: stat.to_string(),
        side: Side::Over,
        line: Some(line),
        price: Some(if i % 3 == 0 { 100.0 } else { -120.0 }),
        hit_rate: 0.57 + (i % 5) as f64 * 0.025,
        projection: Some(line + 1.0),
        quality_score: None,
        reliable: false,
        alt_lines: Vec::new(),
    }
}

fn team_leg(game: usize, bet_type: BetType, side: Side, price: f64, hit: f64) -> TeamLeg {
    TeamLeg {
        event_id: format!("nba-g{game}"),
        sport: "nba".to_string(),
        home_team: format!("HOME{game}"),
        away_team: format!("AWAY{game}"),
        bet_type,
        side,
        line: match bet_type {
            BetType::Spread => Some(if side == Side::Home { -4.5 } else { 4.5 }),
            BetType::Total => Some(224.5),
            BetType::Moneyline => None,
        },
        price: Some(price),
        hit_rate: hit,
        quality_score: Some(55.0),
        sharp_score: Some(40.0 + (game * 5) as f64),
    }
}

pub fn team_legs() -> Vec<TeamLeg> {
    let mut legs = Vec::new();
    for g in 0..6 {
        let tilt = g as f64 * 0.01;
        legs.push(team_leg(g, BetType::Spread, Side::Home, -110.0, 0.55 + tilt));
        legs.push(team_leg(g, BetType::Spread, Side::Away, -110.0, 0.45 - tilt));
        legs.push(team_leg(g, BetType::Total, Side::Over, -105.0, 0.56));
        legs.push(team_leg(g, BetType::Total, Side::Under, -115.0, 0.44));
        legs.push(team_leg(g, BetType::Moneyline, Side::Home, -180.0, 0.66 + tilt));
    }
    legs
}

pub fn slate_pool() -> CandidatePool {
    CandidatePool {
        player_legs: (0..24).map(nba_player).chain((0..8).map(nhl_player)).collect(),
        team_legs: team_legs(),
        golden_categories: ["rebounds", "assists"].iter().map(|s| s.to_string()).collect(),
    }
}

pub fn slate_weights() -> CategoryWeights {
    let mut w = CategoryWeights::default();
    w.insert("points_over", CategoryWeight { weight: 1.1, calibrated_hit_rate: Some(0.56) });
    w.insert("rebounds", CategoryWeight { weight: 1.3, calibrated_hit_rate: Some(0.62) });
    w.insert("assists", CategoryWeight { weight: 1.2, calibrated_hit_rate: None });
    w.insert("threes_under", CategoryWeight { weight: 0.8, calibrated_hit_rate: Some(0.42) });
    w.insert("shots_on_goal", CategoryWeight { weight: 1.0, calibrated_hit_rate: Some(0.58) });
    w
}

pub fn slate_inputs() -> SlateInputs {
    SlateInputs {
        pool: slate_pool(),
        weights: slate_weights(),
    }
}
