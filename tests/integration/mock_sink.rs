//! Mock sink for integration testing.
//!
//! Stores parlays in memory and can be told to fail, either on every call or
//! from a given `persist` call onward.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use slate::storage::ParlaySink;
use slate::types::Parlay;

#[derive(Clone, Default)]
pub struct MockSink {
    stored: Arc<Mutex<Vec<Parlay>>>,
    persist_calls: Arc<Mutex<usize>>,
    /// If set, all operations return this error.
    force_error: Arc<Mutex<Option<String>>>,
    /// 1-based `persist` call from which writes fail.
    fail_from_call: Arc<Mutex<Option<usize>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_from_call(&self, call: usize) {
        *self.fail_from_call.lock().unwrap() = Some(call);
    }

    pub fn stored(&self) -> Vec<Parlay> {
        self.stored.lock().unwrap().clone()
    }

    pub fn persist_calls(&self) -> usize {
        *self.persist_calls.lock().unwrap()
    }
}

#[async_trait]
impl ParlaySink for MockSink {
    async fn persisted_fingerprints(&self, date: NaiveDate) -> Result<Vec<String>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self
            .stored
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.target_date == date)
            .map(|p| p.fingerprint.clone())
            .collect())
    }

    async fn persist(&self, parlays: &[Parlay]) -> Result<usize> {
        let call = {
            let mut calls = self.persist_calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        if let Some(from) = *self.fail_from_call.lock().unwrap() {
            if call >= from {
                return Err(anyhow!("disk full on write {call}"));
            }
        }

        let mut stored = self.stored.lock().unwrap();
        let mut written = 0;
        for p in parlays {
            let exists = stored
                .iter()
                .any(|s| s.target_date == p.target_date && s.fingerprint == p.fingerprint);
            if !exists {
                stored.push(p.clone());
                written += 1;
            }
        }
        Ok(written)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests for the mock itself
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_sink_has_no_fingerprints() {
        let sink = MockSink::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(sink.persisted_fingerprints(date).await.unwrap().is_empty());
        assert_eq!(sink.name(), "mock");
    }

    #[tokio::test]
    async fn test_forced_error() {
        let sink = MockSink::new();
        sink.set_error("connection lost");
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let err = sink.persisted_fingerprints(date).await.unwrap_err();
        assert!(err.to_string().contains("connection lost"));
        assert!(sink.persist(&[]).await.is_err());
        assert_eq!(sink.persist_calls(), 1);
    }

    #[tokio::test]
    async fn test_fail_from_call() {
        let sink = MockSink::new();
        sink.fail_from_call(2);
        assert!(sink.persist(&[]).await.is_ok());
        assert!(sink.persist(&[]).await.is_err());
        assert!(sink.persist(&[]).await.is_err());
    }
}
