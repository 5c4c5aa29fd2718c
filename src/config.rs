//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. The
//! database URL may be overridden by an environment variable named in the
//! config, so credentials stay out of the file.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::strategy::evaluator::EvaluatorConfig;
use crate::strategy::tiers::{Tier, TierPolicy};
use crate::types::SlateError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    /// Replaces the built-in tier table when present.
    #[serde(default)]
    pub tiers: Option<Vec<Tier>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    pub pool_path: String,
    pub weights_path: String,
    /// Usable legs required before any construction starts.
    pub min_pool_size: usize,
    pub bankroll: Decimal,
    /// Defaults to today (UTC) when absent.
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Env var that, when set, overrides `database_url`.
    #[serde(default)]
    pub database_url_env: Option<String>,
    #[serde(default = "default_json_path")]
    pub json_path: String,
}

fn default_database_url() -> String {
    "sqlite://slate.db?mode=rwc".to_string()
}

fn default_json_path() -> String {
    "slate_parlays.json".to_string()
}

impl StorageConfig {
    pub fn resolved_database_url(&self) -> String {
        self.database_url_env
            .as_deref()
            .and_then(|name| AppConfig::resolve_env(name).ok())
            .unwrap_or_else(|| self.database_url.clone())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), SlateError> {
        let generation = &self.generation;
        if generation.pool_path.trim().is_empty() {
            return Err(SlateError::Config("generation.pool_path is empty".into()));
        }
        if generation.bankroll <= Decimal::ZERO {
            return Err(SlateError::Config(format!(
                "generation.bankroll must be positive, got {}",
                generation.bankroll
            )));
        }
        if self.storage.backend == StorageBackend::Json
            && self.storage.json_path.trim().is_empty()
        {
            return Err(SlateError::Config("storage.json_path is empty".into()));
        }
        Ok(())
    }

    /// The configured tier table, or the built-in default.
    pub fn tier_policy(&self) -> TierPolicy {
        match &self.tiers {
            Some(tiers) => TierPolicy::new(tiers.clone()),
            None => TierPolicy::default(),
        }
    }

    pub fn target_date(&self) -> NaiveDate {
        self.generation
            .target_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
