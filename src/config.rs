//! Service configuration
//!
//! Loaded from a TOML file. Every field has a default, so an empty file
//! (or no file at all) yields a runnable configuration.
//!
//! ```toml
//! [database]
//! url = "sqlite:///var/lib/billing/billing.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [billing]
//! cron = "0 0 2 1 * *"
//! guard_scope = "period"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::billing::{GuardScope, OrchestratorConfig, DEFAULT_BILLING_CRON};
use crate::domain::bill::BillBuilder;
use crate::domain::rate_table::DEFAULT_RATE_TYPE;
use crate::infrastructure::database::{DatabaseConfig, PoolConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Upper bound for `due_after_days` and `usage_window_days`
pub const MAX_BILLING_DAYS: i64 = 3650;

/// Default location: `<config dir>/utility-billing/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("utility-billing")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Seconds an in-flight run may take to finish after shutdown starts
    pub shutdown_timeout: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.pool.max_connections,
            min_connections: defaults.pool.min_connections,
            connect_timeout_secs: defaults.pool.connect_timeout_secs,
        }
    }
}

impl DatabaseSettings {
    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            pool: PoolConfig {
                max_connections: self.max_connections,
                min_connections: self.min_connections,
                connect_timeout_secs: self.connect_timeout_secs,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Register the scheduled job at startup
    pub enabled: bool,
    /// Six-field cron expression, seconds first
    pub cron: String,
    pub run_timeout_secs: u64,
    pub due_after_days: i64,
    pub usage_window_days: i64,
    /// Consumption billed to every consumer until metering is wired in
    pub placeholder_consumption: Decimal,
    pub rate_type: String,
    pub guard_scope: GuardScope,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: DEFAULT_BILLING_CRON.to_string(),
            run_timeout_secs: 30,
            due_after_days: 30,
            usage_window_days: 30,
            placeholder_consumption: Decimal::ONE_HUNDRED,
            rate_type: DEFAULT_RATE_TYPE.to_string(),
            guard_scope: GuardScope::Period,
        }
    }
}

impl BillingConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            rate_type: self.rate_type.clone(),
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            guard_scope: self.guard_scope,
        }
    }

    pub fn bill_builder(&self) -> BillBuilder {
        BillBuilder::new(self.due_after_days, self.usage_window_days)
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let billing = &self.billing;
        if billing.cron.trim().is_empty() {
            return Err(ConfigError::Invalid("billing.cron must not be empty".into()));
        }
        if billing.run_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "billing.run_timeout_secs must be positive".into(),
            ));
        }
        for (field, days) in [
            ("due_after_days", billing.due_after_days),
            ("usage_window_days", billing.usage_window_days),
        ] {
            if !(0..=MAX_BILLING_DAYS).contains(&days) {
                return Err(ConfigError::Invalid(format!(
                    "billing.{field} must be between 0 and {MAX_BILLING_DAYS} (got {days})"
                )));
            }
        }
        if billing.placeholder_consumption < Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "billing.placeholder_consumption must not be negative".into(),
            ));
        }
        if billing.rate_type.trim().is_empty() {
            return Err(ConfigError::Invalid("billing.rate_type must not be empty".into()));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("database.url must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();

        assert_eq!(config.service.shutdown_timeout, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.billing.enabled);
        assert_eq!(config.billing.cron, DEFAULT_BILLING_CRON);
        assert_eq!(config.billing.rate_type, "RATES");
        assert_eq!(config.billing.guard_scope, GuardScope::Period);
        assert_eq!(config.billing.placeholder_consumption, Decimal::ONE_HUNDRED);
        assert_eq!(config.database.to_database_config().pool.max_connections, 10);
    }

    #[test]
    fn sections_override_individual_fields() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "sqlite://./other.db?mode=rwc"

            [logging]
            format = "json"

            [billing]
            cron = "0 0 2 1 * *"
            run_timeout_secs = 120
            guard_scope = "process"
            placeholder_consumption = 250.5
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url, "sqlite://./other.db?mode=rwc");
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");

        let orchestrator = config.billing.orchestrator_config();
        assert_eq!(orchestrator.run_timeout, Duration::from_secs(120));
        assert_eq!(orchestrator.guard_scope, GuardScope::Process);
        assert_eq!(config.billing.placeholder_consumption, Decimal::new(2505, 1));
        assert_eq!(config.billing.due_after_days, 30);
    }

    #[test]
    fn unknown_guard_scope_is_a_parse_error() {
        let err = AppConfig::from_toml("[billing]\nguard_scope = \"forever\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_run_timeout_is_rejected() {
        let err = AppConfig::from_toml("[billing]\nrun_timeout_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn day_counts_are_bounded() {
        let huge = AppConfig::from_toml("[billing]\ndue_after_days = 9000000000000000").unwrap_err();
        assert!(matches!(huge, ConfigError::Invalid(_)));

        let window = AppConfig::from_toml("[billing]\nusage_window_days = 3651").unwrap_err();
        assert!(matches!(window, ConfigError::Invalid(_)));

        let negative = AppConfig::from_toml("[billing]\ndue_after_days = -1").unwrap_err();
        assert!(matches!(negative, ConfigError::Invalid(_)));

        let longest = AppConfig::from_toml("[billing]\ndue_after_days = 3650").unwrap();
        assert_eq!(
            longest.billing.bill_builder().due_after,
            chrono::Duration::days(MAX_BILLING_DAYS)
        );
    }

    #[test]
    fn negative_consumption_is_rejected() {
        let err = AppConfig::from_toml("[billing]\nplaceholder_consumption = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/utility-billing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn default_path_ends_with_crate_dir() {
        let path = default_config_path();
        assert!(path.ends_with("utility-billing/config.toml"));
    }
}
