//! SLATE: tiered parlay construction engine.
//!
//! Entry point. Loads configuration, initialises structured logging, reads
//! the candidate pool and category weights, runs one generation pass for the
//! target date and persists the result. Exits non-zero if the run aborts.

use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, info};

use slate::config;
use slate::data;
use slate::engine::{GenerationRunner, RunOutcome};
use slate::storage;

const BANNER: &str = r#"
 ____  _        _  _____ _____
/ ___|| |      / \|_   _| ____|
\___ \| |     / _ \ | | |  _|
 ___) | |___ / ___ \| | | |___
|____/|_____/_/   \_\_| |_____|

  Scored Legs, Assembled in Tiers, Evaluated
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    let target_date = cfg.target_date();
    info!(
        config = %config_path,
        %target_date,
        bankroll = %cfg.generation.bankroll,
        backend = ?cfg.storage.backend,
        "SLATE starting up"
    );

    let runner = GenerationRunner::from_config(&cfg)?;
    let inputs = data::load_inputs(&cfg.generation.pool_path, &cfg.generation.weights_path).await?;
    let sink = storage::open_sink(&cfg.storage).await?;

    let report = runner.run(&inputs, sink.as_ref(), target_date).await?;
    println!("{report}");
    // Release the database before reporting the exit status.
    drop(sink);

    if let RunOutcome::Aborted { tier, reason } = &report.outcome {
        error!(%tier, %reason, "Run aborted");
    } else {
        info!("SLATE finished");
    }
    Ok(ExitCode::from(report.outcome.exit_code()))
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slate=info"));

    let json_logging = std::env::var("SLATE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
