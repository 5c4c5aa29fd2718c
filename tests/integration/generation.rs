//! End-to-end generation runs against in-memory, SQLite and JSON sinks.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;

use slate::data::SlateInputs;
use slate::engine::{GenerationReport, GenerationRunner, RunOutcome};
use slate::storage::{JsonSink, ParlaySink, SqliteSink};
use slate::strategy::evaluator::{EvaluatorConfig, ParlayEvaluator};
use slate::strategy::kelly::StakeSizer;
use slate::strategy::scoring::ScoringEngine;
use slate::strategy::tiers::{TierName, TierPolicy};
use slate::strategy::SlateOrchestrator;
use slate::types::{CandidatePool, Leg, Parlay, SlateError};

use crate::fixtures::{nba_player, slate_inputs};
use crate::mock_sink::MockSink;

mock! {
    pub Store {}

    #[async_trait]
    impl ParlaySink for Store {
        async fn persisted_fingerprints(&self, date: NaiveDate) -> Result<Vec<String>>;
        async fn persist(&self, parlays: &[Parlay]) -> Result<usize>;
        fn name(&self) -> &'static str;
    }
}

fn runner() -> GenerationRunner {
    GenerationRunner::new(
        ScoringEngine::default(),
        SlateOrchestrator::new(
            TierPolicy::default(),
            ParlayEvaluator::new(EvaluatorConfig::default(), StakeSizer::new(dec!(2500))),
        ),
        10,
    )
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

fn assert_tier_invariants(policy: &TierPolicy, parlays: &[Parlay]) {
    let mut by_tier: HashMap<&str, Vec<&Parlay>> = HashMap::new();
    for p in parlays {
        by_tier.entry(p.tier.as_str()).or_default().push(p);
    }

    for tier in &policy.tiers {
        let built = by_tier.remove(tier.name.as_str()).unwrap_or_default();
        assert!(built.len() <= tier.target_count, "{} over target", tier.name);

        let mut keys = HashSet::new();
        let mut players: HashMap<&str, u32> = HashMap::new();

        for parlay in &built {
            let profile = tier
                .profiles
                .iter()
                .find(|pr| pr.strategy == parlay.strategy)
                .unwrap_or_else(|| panic!("{} has no profile {}", tier.name, parlay.strategy));
            assert_eq!(parlay.legs.len(), profile.legs, "{parlay}");
            assert!(parlay.combined_probability >= tier.thresholds.min_confidence.max(0.01));
            assert!(parlay.effective_edge >= tier.thresholds.min_edge);
            assert!(parlay.sharpe >= tier.thresholds.min_sharpe);
            assert!(parlay.stake > Decimal::ZERO);

            let mut teams: HashMap<&str, u32> = HashMap::new();
            let mut categories: HashMap<String, u32> = HashMap::new();
            let mut markets = HashSet::new();
            let mut player_stats = HashSet::new();

            for leg in &parlay.legs {
                assert!(keys.insert(leg.key()), "key reused in {}: {}", tier.name, leg.key());
                assert!(leg.hit_rate() >= tier.thresholds.min_hit_rate);
                *categories.entry(leg.category()).or_default() += 1;

                match leg {
                    Leg::Player(p) => {
                        *players.entry(p.player_id.as_str()).or_default() += 1;
                        assert!(player_stats.insert((p.player_id.as_str(), p.stat.to_lowercase())));
                    }
                    Leg::Team(t) => {
                        assert!(
                            markets.insert((t.event_id.as_str(), t.bet_type)),
                            "both sides of {} {} in one parlay",
                            t.event_id,
                            t.bet_type
                        );
                        *teams.entry(t.home_team.as_str()).or_default() += 1;
                        *teams.entry(t.away_team.as_str()).or_default() += 1;
                    }
                }
            }

            assert!(teams.values().all(|c| *c <= tier.caps.team));
            assert!(categories.values().all(|c| *c <= tier.caps.category));
        }

        assert!(players.values().all(|c| *c <= tier.caps.player));
    }
}

// ---------------------------------------------------------------------------
// Full runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_run_respects_tier_invariants() {
    let sink = MockSink::new();
    let report = runner().run(&slate_inputs(), &sink, date()).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.tiers.len(), 3);
    assert!(report.tier(TierName::Exploration).unwrap().generated > 0);

    let stored = sink.stored();
    assert_eq!(stored.len(), report.total_persisted());
    assert_tier_invariants(&TierPolicy::default(), &stored);

    let fingerprints: HashSet<_> = stored.iter().map(|p| p.fingerprint.as_str()).collect();
    assert_eq!(fingerprints.len(), stored.len());
    assert!(stored.iter().all(|p| p.target_date == date()));
}

#[tokio::test]
async fn test_top_tier_player_parlays_lean_on_golden_categories() {
    let sink = MockSink::new();
    let inputs = slate_inputs();
    runner().run(&inputs, &sink, date()).await.unwrap();

    for parlay in sink.stored().iter().filter(|p| p.tier == "execution") {
        if parlay.legs.iter().any(Leg::is_team) {
            continue;
        }
        let golden = parlay
            .legs
            .iter()
            .filter(|l| inputs.pool.is_golden(&l.category()))
            .count();
        assert!(golden + 1 >= parlay.legs.len(), "{parlay}");
    }
}

#[tokio::test]
async fn test_rerun_fills_slots_without_writing() {
    let sink = MockSink::new();
    let inputs = slate_inputs();

    let first = runner().run(&inputs, &sink, date()).await.unwrap();
    let stored = sink.stored().len();
    assert!(stored > 0);

    let second = runner().run(&inputs, &sink, date()).await.unwrap();
    assert!(second.is_complete());
    assert_eq!(second.seeded_fingerprints, stored);
    assert_eq!(second.total_persisted(), 0);
    assert_eq!(sink.stored().len(), stored);

    for (a, b) in first.tiers.iter().zip(&second.tiers) {
        assert_eq!(b.generated, 0, "{} regenerated", b.tier);
        assert_eq!(a.filled(), b.filled());
        assert_eq!(b.already_persisted, a.generated + a.already_persisted);
    }
}

#[tokio::test]
async fn test_new_date_is_not_deduplicated_against_old_one() {
    let sink = MockSink::new();
    let inputs = slate_inputs();
    let first = runner().run(&inputs, &sink, date()).await.unwrap();

    let next_day = date().succ_opt().unwrap();
    let second = runner().run(&inputs, &sink, next_day).await.unwrap();
    assert_eq!(second.seeded_fingerprints, 0);
    assert_eq!(second.total_persisted(), first.total_persisted());
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_persistence_failure_aborts_at_first_tier() {
    let sink = MockSink::new();
    sink.fail_from_call(1);

    let report = runner().run(&slate_inputs(), &sink, date()).await.unwrap();
    match &report.outcome {
        RunOutcome::Aborted { tier, reason } => {
            assert_eq!(*tier, TierName::Exploration);
            assert!(reason.contains("disk full"));
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert!(report.tiers.is_empty());
    assert!(sink.stored().is_empty());
    assert_eq!(sink.persist_calls(), 1);
}

#[tokio::test]
async fn test_persistence_failure_keeps_earlier_tiers() {
    let sink = MockSink::new();
    sink.fail_from_call(2);

    let report = runner().run(&slate_inputs(), &sink, date()).await.unwrap();
    match &report.outcome {
        RunOutcome::Aborted { tier, .. } => {
            assert!(report.tier(*tier).is_none());
            assert_eq!(report.tiers[0].tier, TierName::Exploration);
            assert!(report.tiers[1..].iter().all(|t| t.generated == 0));
        }
        // Later tiers may legitimately produce nothing to persist.
        RunOutcome::Completed => assert_eq!(sink.persist_calls(), 1),
    }
    assert_eq!(sink.stored().len(), report.total_persisted());
    assert!(sink.stored().iter().all(|p| p.tier == "exploration"));
}

#[tokio::test]
async fn test_seed_failure_stops_before_generation() {
    let mut sink = MockStore::new();
    sink.expect_persisted_fingerprints()
        .times(1)
        .returning(|_| Err(anyhow!("database locked")));
    sink.expect_persist().times(0);
    sink.expect_name().return_const("mock");

    let err = runner().run(&slate_inputs(), &sink, date()).await.unwrap_err();
    assert!(format!("{err:#}").contains("database locked"));
}

#[tokio::test]
async fn test_each_nonempty_tier_persists_once() {
    let mut sink = MockStore::new();
    sink.expect_persisted_fingerprints()
        .returning(|_| Ok(Vec::new()));
    sink.expect_persist()
        .times(1..=3)
        .returning(|parlays| {
            assert!(!parlays.is_empty());
            let tiers: HashSet<_> = parlays.iter().map(|p| p.tier.clone()).collect();
            assert_eq!(tiers.len(), 1);
            Ok(parlays.len())
        });
    sink.expect_name().return_const("mock");

    let report = runner().run(&slate_inputs(), &sink, date()).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(
        report.total_persisted(),
        report.tiers.iter().map(|t| t.generated).sum::<usize>()
    );
}

#[tokio::test]
async fn test_thin_pool_rejected_before_seeding() {
    let mut sink = MockStore::new();
    sink.expect_persisted_fingerprints().times(0);
    sink.expect_persist().times(0);
    sink.expect_name().return_const("mock");

    let inputs = SlateInputs {
        pool: CandidatePool {
            player_legs: (0..4).map(nba_player).collect(),
            ..Default::default()
        },
        weights: Default::default(),
    };
    let err = runner().run(&inputs, &sink, date()).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SlateError>(),
        Some(SlateError::PoolBelowFloor { available: 4, required: 10 })
    ));
}

#[tokio::test]
async fn test_sparse_pool_terminates_short_of_target() {
    let sink = MockSink::new();
    let inputs = SlateInputs {
        pool: CandidatePool {
            player_legs: (0..12).map(nba_player).collect(),
            ..Default::default()
        },
        weights: Default::default(),
    };

    let report = runner().run(&inputs, &sink, date()).await.unwrap();
    assert!(report.is_complete());
    let exploration = report.tier(TierName::Exploration).unwrap();
    assert!(exploration.filled() < exploration.target);
    assert!(exploration.short_profiles > 0);
    assert_tier_invariants(&TierPolicy::default(), &sink.stored());
}

// ---------------------------------------------------------------------------
// Real storage backends
// ---------------------------------------------------------------------------

async fn run_twice(sink: &dyn ParlaySink) -> (GenerationReport, GenerationReport) {
    let inputs = slate_inputs();
    let first = runner().run(&inputs, sink, date()).await.unwrap();
    let second = runner().run(&inputs, sink, date()).await.unwrap();
    (first, second)
}

#[tokio::test]
async fn test_sqlite_rerun_is_idempotent() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let sink = SqliteSink::from_pool(pool).await.unwrap();

    let (first, second) = run_twice(&sink).await;
    let count = sink.count_for_date(date()).await.unwrap() as usize;
    assert_eq!(count, first.total_persisted());
    assert_eq!(second.total_persisted(), 0);

    let loaded = sink.load_for_date(date()).await.unwrap();
    assert_tier_invariants(&TierPolicy::default(), &loaded);
}

#[tokio::test]
async fn test_json_rerun_is_idempotent() {
    let path = std::env::temp_dir().join(format!("slate_gen_{}.json", uuid::Uuid::new_v4()));
    let sink = JsonSink::new(&path);

    let (first, second) = run_twice(&sink).await;
    let stored = sink.load_all().await.unwrap();
    assert_eq!(stored.len(), first.total_persisted());
    assert_eq!(second.total_persisted(), 0);
    assert!(stored.iter().all(|p| p.stake > Decimal::ZERO));

    let _ = std::fs::remove_file(&path);
}
