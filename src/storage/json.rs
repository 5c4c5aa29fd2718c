//! JSON file sink.
//!
//! Keeps every generated parlay in one pretty-printed array. Meant for dry
//! runs and local inspection, not concurrent writers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::ParlaySink;
use crate::types::Parlay;

pub struct JsonSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored parlay. A missing file is an empty store.
    pub async fn load_all(&self) -> Result<Vec<Parlay>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No parlay file yet");
            return Ok(Vec::new());
        }
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read parlays from {}", self.path.display()))?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        let parlays: Vec<Parlay> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse parlays from {}", self.path.display()))?;
        Ok(parlays)
    }
}

#[async_trait]
impl ParlaySink for JsonSink {
    async fn persisted_fingerprints(&self, date: NaiveDate) -> Result<Vec<String>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .filter(|p| p.target_date == date)
            .map(|p| p.fingerprint)
            .collect())
    }

    async fn persist(&self, parlays: &[Parlay]) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.load_all().await?;
        let mut seen: HashSet<(NaiveDate, String)> = stored
            .iter()
            .map(|p| (p.target_date, p.fingerprint.clone()))
            .collect();

        let mut written = 0usize;
        for parlay in parlays {
            if seen.insert((parlay.target_date, parlay.fingerprint.clone())) {
                stored.push(parlay.clone());
                written += 1;
            }
        }

        let json = serde_json::to_string_pretty(&stored).context("Failed to serialise parlays")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write parlays to {}", self.path.display()))?;

        info!(path = %self.path.display(), written, total = stored.len(), "Parlays saved");
        Ok(written)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::player;
    use crate::types::{Leg, ParlayStatus, Side};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("slate_test_parlays_{}.json", Uuid::new_v4()));
        p
    }

    fn parlay(date: NaiveDate, fingerprint: &str) -> Parlay {
        Parlay {
            id: Uuid::new_v4(),
            target_date: date,
            tier: "validation".into(),
            strategy: "core".into(),
            legs: vec![Leg::Player(player("p1", "points", Side::Over, 20.5, -110.0, 0.6))],
            combined_probability: 0.36,
            implied_probability: 0.27,
            edge: 0.09,
            effective_edge: 0.09,
            edge_floored: false,
            sharpe: 0.12,
            decimal_odds: 3.64,
            american_odds: 264,
            stake: dec!(10),
            fingerprint: fingerprint.into(),
            status: ParlayStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let path = temp_path();
        let sink = JsonSink::new(&path);
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        let written = sink.persist(&[parlay(date, "a"), parlay(date, "b")]).await.unwrap();
        assert_eq!(written, 2);

        let loaded = sink.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].stake, dec!(10));
        assert_eq!(loaded[0].legs[0].key(), "p1|points|over|20.5");

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_fingerprints_scoped_to_date() {
        let path = temp_path();
        let sink = JsonSink::new(&path);
        let d1 = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

        sink.persist(&[parlay(d1, "a"), parlay(d2, "b")]).await.unwrap();
        assert_eq!(sink.persisted_fingerprints(d1).await.unwrap(), vec!["a".to_string()]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_duplicate_fingerprint_skipped() {
        let path = temp_path();
        let sink = JsonSink::new(&path);
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();

        sink.persist(&[parlay(date, "a")]).await.unwrap();
        let written = sink.persist(&[parlay(date, "a"), parlay(date, "c")]).await.unwrap();
        assert_eq!(written, 1);
        assert_eq!(sink.load_all().await.unwrap().len(), 2);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let sink = JsonSink::new(temp_path());
        assert!(sink.load_all().await.unwrap().is_empty());
    }
}
