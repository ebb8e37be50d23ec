//! Periodic bill issuance
//!
//! [`BillingScheduler`] ticks [`BillingOrchestrator`], which guards,
//! loads the rate table once and bills every active consumer.

pub mod consumption;
pub mod guard;
pub mod orchestrator;
pub mod scheduler;

pub use consumption::{ConsumptionSource, FixedConsumption};
pub use guard::{BillingPeriod, GuardScope, RunGuard};
pub use orchestrator::{
    AbortReason, BillingOrchestrator, OrchestratorConfig, RecordFailure, RunOutcome, RunSummary,
    SkipReason,
};
pub use scheduler::{BillingScheduler, DEFAULT_BILLING_CRON};
