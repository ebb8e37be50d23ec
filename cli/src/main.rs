//! Utility billing service: CLI entry point
//!
//! Runs the periodic bill issuance batch as a long-lived process, suitable
//! for a systemd unit or a container.
//!
//! ```sh
//! # Run with default config (~/.config/utility-billing/config.toml)
//! billing-service
//!
//! # Custom config path
//! billing-service --config /etc/utility-billing/config.toml
//!
//! # Validate config without starting
//! billing-service --check
//!
//! # Bill every active consumer once and exit
//! billing-service --run-once
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use utility_billing::config::AppConfig;
use utility_billing::service::{init_tracing, ServiceHandle, ServiceOptions};
use utility_billing::RunOutcome;

/// Utility billing service: issues bills to active consumers on a schedule.
#[derive(Parser, Debug)]
#[command(
    name = "billing-service",
    version,
    about = "Periodic bill issuance for utility consumers",
    long_about = "Loads the active rate table and replaces the current bill of every \
                  active consumer balance on a cron schedule.\n\n\
                  Default config: ~/.config/utility-billing/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BILLING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Perform a single billing run and exit instead of scheduling.
    #[arg(long)]
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(utility_billing::default_config_path);

    let loaded = AppConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);
    match loaded {
        Ok(_) => info!("Configuration loaded from {}", config_path.display()),
        Err(e) => {
            if cli.check {
                eprintln!("❌ Invalid configuration in {}: {}", config_path.display(), e);
                std::process::exit(2);
            }
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file  : {}", config_path.display());
        println!("   Database     : {}", config.database.url);
        println!("   Log level    : {}", config.logging.level);
        println!("   Billing cron : {}", config.billing.cron);
        println!("   Guard scope  : {:?}", config.billing.guard_scope);
        println!("   Rate type    : {}", config.billing.rate_type);
        return Ok(());
    }

    // ── Start service ──────────────────────────────────────────
    let mut options = ServiceOptions::new(config);
    options.auto_migrate = !cli.no_migrate;
    options.schedule = options.schedule && !cli.run_once;

    let handle = ServiceHandle::start(options).await?;

    if cli.run_once {
        match handle.run_once().await {
            RunOutcome::Completed(summary) => info!(
                period = %summary.period,
                processed = summary.processed,
                errors = summary.errors,
                "Single billing run finished"
            ),
            RunOutcome::Aborted(reason) => warn!(%reason, "Single billing run aborted"),
            RunOutcome::Skipped(reason) => warn!(?reason, "Single billing run skipped"),
        }
        handle.shutdown().await;
        return Ok(());
    }

    if !handle.is_scheduled() {
        warn!("Billing is not scheduled; the service will idle until shutdown");
    }

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.shutdown().await;

    Ok(())
}
