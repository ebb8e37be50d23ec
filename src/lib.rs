//! # Utility Billing
//!
//! Periodic bill issuance for utility consumers.
//!
//! ## Architecture
//!
//! - **domain**: rate tables, consumer balances, bills and the charge calculator
//! - **application**: the billing batch (guard, orchestrator, scheduler)
//! - **infrastructure**: SeaORM persistence and the in-memory store
//! - **service**: process bootstrap and graceful shutdown
//! - **shared**: error types and shutdown signalling

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod service;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::billing::{BillingOrchestrator, BillingScheduler, RunOutcome, RunSummary};

// Re-export database types for easy access
pub use infrastructure::database::repositories::SeaOrmRepositoryProvider;
pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider};

pub use service::{init_tracing, ServiceHandle, ServiceOptions};
