//! Application layer - use cases built on the domain

pub mod billing;

pub use billing::{BillingOrchestrator, BillingScheduler, OrchestratorConfig, RunOutcome};
