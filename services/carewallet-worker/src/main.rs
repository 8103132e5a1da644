//! CareWallet Worker
//!
//! Connects to PostgreSQL, applies migrations, and runs the expiry sweep
//! (stale one-time codes, expired token-blacklist entries, overdue
//! withdrawal intents) until Ctrl+C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! # Sweep every five minutes
//! carewallet-worker
//!
//! # One sweep, then exit
//! carewallet-worker --once
//!
//! # Environment overrides
//! CAREWALLET__SWEEPER__INTERVAL=1m carewallet-worker
//! ```

mod config;

use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use carewallet_core::ExpirySweeper;
use carewallet_db::Database;

use crate::config::{LoggingConfig, WorkerConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// CareWallet background worker
#[derive(Parser, Debug)]
#[command(name = "carewallet-worker")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "CAREWALLET_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CAREWALLET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "CAREWALLET_LOG_FORMAT")]
    log_format: Option<String>,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Skip migrations on startup
    #[arg(long)]
    skip_migrations: bool,

    /// Run a single sweep and exit
    #[arg(long)]
    once: bool,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut worker_config = WorkerConfig::load(args.config.as_deref())?;

    if let Some(db_url) = args.database_url {
        worker_config.database.postgres_url = db_url;
    }
    if let Some(level) = args.log_level {
        worker_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        worker_config.logging.format = format;
    }
    worker_config.database.run_migrations = !args.skip_migrations;

    init_logging(&worker_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting CareWallet worker"
    );

    let db = init_database(&worker_config).await?;
    let sweeper = ExpirySweeper::new(db.store());

    if args.once {
        let report = sweeper.sweep_once().await?;
        tracing::info!(
            codes = report.codes,
            blacklist = report.blacklist,
            intents = report.intents,
            "Single sweep finished"
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interval = worker_config.sweeper.interval;
    let task = tokio::spawn(async move { sweeper.run(interval, shutdown_rx).await });

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    task.await?;

    db.pg.close().await;
    tracing::info!("Worker shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Connect, migrate if configured, and check the pool answers
async fn init_database(config: &WorkerConfig) -> anyhow::Result<Database> {
    let db = Database::connect(&config.database).await?;

    let health = db.health_check().await?;
    if !health.healthy {
        anyhow::bail!("Database health check failed");
    }

    tracing::info!(postgres = health.postgres, "Database health check passed");
    Ok(db)
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping sweeper...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, stopping sweeper...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["carewallet-worker", "--once", "--log-format", "json"]);
        assert!(args.once);
        assert!(!args.skip_migrations);
        assert_eq!(args.log_format.as_deref(), Some("json"));
    }
}
