//! Persistence layer.
//!
//! `ParlaySink` is the seam between generation and storage. Two backends:
//! SQLite for production runs and a JSON file for dry runs.

pub mod json;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::Parlay;

pub use json::JsonSink;
pub use sqlite::SqliteSink;

/// Destination for accepted parlays.
#[async_trait]
pub trait ParlaySink: Send + Sync {
    /// Fingerprints of every parlay already stored for `date`.
    async fn persisted_fingerprints(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Store a batch (one tier). Parlays whose fingerprint is already stored
    /// for their date are skipped. Returns the number actually written.
    async fn persist(&self, parlays: &[Parlay]) -> Result<usize>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Open the sink named in config.
pub async fn open_sink(config: &StorageConfig) -> Result<Box<dyn ParlaySink>> {
    match config.backend {
        StorageBackend::Sqlite => {
            let url = config.resolved_database_url();
            Ok(Box::new(SqliteSink::connect(&url).await?))
        }
        StorageBackend::Json => {
            let sink = JsonSink::new(&config.json_path);
            info!(path = %sink.path().display(), "JSON sink ready");
            Ok(Box::new(sink))
        }
    }
}
