//! SQLite sink.
//!
//! One row per parlay, legs stored as JSON. `UNIQUE(target_date,
//! fingerprint)` backs up the in-memory deduplicator; each tier is written in
//! a single transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::ParlaySink;
use crate::types::{Leg, Parlay, ParlayStatus, SlateError};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS parlays (
    id                   TEXT PRIMARY KEY,
    target_date          TEXT NOT NULL,
    tier                 TEXT NOT NULL,
    strategy             TEXT NOT NULL,
    leg_count            INTEGER NOT NULL,
    legs_json            TEXT NOT NULL,
    combined_probability REAL NOT NULL,
    implied_probability  REAL NOT NULL,
    edge                 REAL NOT NULL,
    effective_edge       REAL NOT NULL,
    edge_floored         INTEGER NOT NULL,
    sharpe               REAL NOT NULL,
    decimal_odds         REAL NOT NULL,
    american_odds        INTEGER NOT NULL,
    stake                TEXT NOT NULL,
    fingerprint          TEXT NOT NULL,
    status               TEXT NOT NULL,
    created_at           TEXT NOT NULL,
    UNIQUE (target_date, fingerprint)
)
"#;

#[derive(Debug)]
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// Connect and make sure the schema exists.
    ///
    /// `url` is a sqlx SQLite URL, e.g. `sqlite://slate.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self> {
        if !url.starts_with("sqlite:") {
            return Err(SlateError::Storage(format!("not a SQLite URL: {url}")).into());
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .with_context(|| format!("Failed to open database {url}"))?;
        let sink = Self::from_pool(pool).await?;
        info!(url, "SQLite sink ready");
        Ok(sink)
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .context("Failed to create parlays table")?;
        Ok(Self { pool })
    }

    pub async fn count_for_date(&self, date: NaiveDate) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM parlays WHERE target_date = ?")
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count parlays")?;
        Ok(row.get::<i64, _>("n"))
    }

    /// Stored parlays for `date`, in insertion order.
    pub async fn load_for_date(&self, date: NaiveDate) -> Result<Vec<Parlay>> {
        let rows = sqlx::query("SELECT * FROM parlays WHERE target_date = ? ORDER BY rowid")
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to load parlays")?;
        rows.iter().map(row_to_parlay).collect()
    }
}

fn row_to_parlay(row: &SqliteRow) -> Result<Parlay> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("target_date")?;
    let legs_json: String = row.try_get("legs_json")?;
    let stake: String = row.try_get("stake")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    let legs: Vec<Leg> = serde_json::from_str(&legs_json).context("Corrupt legs_json")?;
    let status = match status.as_str() {
        "pending" => ParlayStatus::Pending,
        other => {
            return Err(SlateError::Storage(format!("unknown parlay status {other:?}")).into())
        }
    };

    Ok(Parlay {
        id: Uuid::parse_str(&id).with_context(|| format!("Bad parlay id {id}"))?,
        target_date: NaiveDate::parse_from_str(&date, DATE_FORMAT)
            .with_context(|| format!("Bad target date {date}"))?,
        tier: row.try_get("tier")?,
        strategy: row.try_get("strategy")?,
        legs,
        combined_probability: row.try_get("combined_probability")?,
        implied_probability: row.try_get("implied_probability")?,
        edge: row.try_get("edge")?,
        effective_edge: row.try_get("effective_edge")?,
        edge_floored: row.try_get("edge_floored")?,
        sharpe: row.try_get("sharpe")?,
        decimal_odds: row.try_get("decimal_odds")?,
        american_odds: row.try_get("american_odds")?,
        stake: Decimal::from_str(&stake).with_context(|| format!("Bad stake {stake}"))?,
        fingerprint: row.try_get("fingerprint")?,
        status,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .with_context(|| format!("Bad timestamp {created_at}"))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl ParlaySink for SqliteSink {
    async fn persisted_fingerprints(&self, date: NaiveDate) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT fingerprint FROM parlays WHERE target_date = ?")
            .bind(date.format(DATE_FORMAT).to_string())
            .fetch_all(&self.pool)
            .await
            .context("Failed to read persisted fingerprints")?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("fingerprint").map_err(Into::into))
            .collect()
    }

    async fn persist(&self, parlays: &[Parlay]) -> Result<usize> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut written = 0usize;

        for p in parlays {
            let legs_json = serde_json::to_string(&p.legs).context("Failed to serialise legs")?;
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO parlays (
                    id, target_date, tier, strategy, leg_count, legs_json,
                    combined_probability, implied_probability, edge, effective_edge,
                    edge_floored, sharpe, decimal_odds, american_odds, stake,
                    fingerprint, status, created_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(p.id.to_string())
            .bind(p.target_date.format(DATE_FORMAT).to_string())
            .bind(&p.tier)
            .bind(&p.strategy)
            .bind(p.legs.len() as i64)
            .bind(legs_json)
            .bind(p.combined_probability)
            .bind(p.implied_probability)
            .bind(p.edge)
            .bind(p.effective_edge)
            .bind(p.edge_floored)
            .bind(p.sharpe)
            .bind(p.decimal_odds)
            .bind(p.american_odds)
            .bind(p.stake.to_string())
            .bind(&p.fingerprint)
            .bind(p.status.to_string())
            .bind(p.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert parlay {}", p.id))?;

            if result.rows_affected() == 0 {
                debug!(fingerprint = %p.fingerprint, "Parlay already stored");
            } else {
                written += 1;
            }
        }

        tx.commit().await.context("Failed to commit parlays")?;
        info!(written, batch = parlays.len(), "Parlays persisted");
        Ok(written)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
