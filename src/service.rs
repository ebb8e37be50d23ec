//! Billing service runtime.
//!
//! [`ServiceHandle`] owns the full lifecycle: database init, migrations,
//! repository wiring, the billing orchestrator, its cron scheduler and
//! graceful shutdown. The CLI binary is a thin wrapper around it.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::billing::{
    BillingOrchestrator, BillingScheduler, FixedConsumption, RunOutcome,
};
use crate::config::AppConfig;
use crate::domain::charges::SectionRateCalculator;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
use crate::infrastructure::init_database;
use crate::shared::errors::{AppError, InfraError};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the billing service.
pub struct ServiceOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Register the cron job (default: follows `billing.enabled`).
    pub schedule: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        let config = AppConfig::default();
        Self {
            schedule: config.billing.enabled,
            config,
            auto_migrate: true,
        }
    }
}

impl ServiceOptions {
    pub fn new(config: AppConfig) -> Self {
        Self {
            schedule: config.billing.enabled,
            config,
            auto_migrate: true,
        }
    }
}

// ── ServiceHandle ──────────────────────────────────────────────────

/// Handle to a running billing service.
///
/// ```rust,no_run
/// use utility_billing::service::{ServiceHandle, ServiceOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServiceHandle::start(ServiceOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServiceHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    pub orchestrator: Arc<BillingOrchestrator>,
    /// The configuration the service was started with.
    pub config: AppConfig,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    scheduler: Option<BillingScheduler>,
}

impl ServiceHandle {
    /// Start the billing service.
    ///
    /// Database and migration failures are fatal. A scheduler that cannot
    /// be registered is logged and the service keeps running without
    /// billing automation.
    pub async fn start(opts: ServiceOptions) -> Result<Self, AppError> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting utility billing service...");

        // ── Database ───────────────────────────────────────────
        let db_config = app_cfg.database.to_database_config();
        let db = init_database(&db_config).await.map_err(InfraError::from)?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await.map_err(InfraError::from)?;
            info!("Migrations completed");
        }

        // ── Repositories & orchestrator ────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        let shutdown = ShutdownCoordinator::new(app_cfg.service.shutdown_timeout);

        let billing = &app_cfg.billing;
        let orchestrator = Arc::new(
            BillingOrchestrator::new(repos.clone())
                .with_config(billing.orchestrator_config())
                .with_calculator(Arc::new(SectionRateCalculator))
                .with_consumption_source(Arc::new(FixedConsumption::new(
                    billing.placeholder_consumption,
                )))
                .with_bill_builder(billing.bill_builder())
                .with_shutdown(shutdown.signal()),
        );
        info!(
            rate_type = %billing.rate_type,
            guard_scope = ?billing.guard_scope,
            run_timeout_secs = billing.run_timeout_secs,
            "🧾 Billing orchestrator ready"
        );

        // ── Scheduler ──────────────────────────────────────────
        let scheduler = if opts.schedule {
            match BillingScheduler::start(orchestrator.clone(), &billing.cron).await {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    error!(error = %e, "❌ Billing scheduler not registered; continuing without billing automation");
                    None
                }
            }
        } else {
            info!("Billing scheduler disabled");
            None
        };

        info!("🚀 Billing service started.");

        Ok(Self {
            repos,
            orchestrator,
            config: app_cfg,
            db,
            shutdown,
            scheduler,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduler.is_some()
    }

    /// Perform one billing run right now, outside the schedule.
    pub async fn run_once(&self) -> RunOutcome {
        self.orchestrator.run_tick().await
    }

    /// Stop scheduling, give an in-flight run the grace period to finish,
    /// then close the database.
    pub async fn shutdown(mut self) {
        info!("🛑 Shutting down billing service...");
        self.shutdown.signal().trigger();

        if let Some(scheduler) = self.scheduler.take() {
            scheduler.shutdown().await;
        }

        let orchestrator = self.orchestrator.clone();
        let drained = self
            .shutdown
            .shutdown_with_cleanup(|| async move { orchestrator.wait_idle().await })
            .await;
        if !drained {
            warn!("Billing run still in flight at shutdown; remaining consumers not billed");
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Billing service shutdown complete");
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServiceHandle::start`]).
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
