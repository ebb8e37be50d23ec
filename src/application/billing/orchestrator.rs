//! Bill issuance batch
//!
//! One run loads the active rate table once, walks the active balance
//! cursor sequentially and replaces each consumer's current bill. Failures
//! are contained at the narrowest level they can be:
//!
//! - rate table or cursor unavailable: the run aborts before any write
//! - a bad record (decode, consumption, charges, update): counted, skipped
//! - the cursor failing mid-iteration: recorded as the run's stream error
//!
//! Nothing escapes [`BillingOrchestrator::run_at`]; the caller only sees
//! a [`RunOutcome`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use metrics::{counter, histogram};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::consumption::{ConsumptionSource, FixedConsumption};
use super::guard::{BillingPeriod, GuardScope, RunGuard};
use crate::domain::balance::{BalanceDocument, ConsumerBalance};
use crate::domain::bill::{Bill, BillBuilder};
use crate::domain::charges::{ChargeCalculator, ChargeError, Exemptions, SectionRateCalculator};
use crate::domain::rate_table::{RateTable, DEFAULT_RATE_TYPE};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::DomainError;
use crate::shared::shutdown::ShutdownSignal;

/// Configuration for the billing batch
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Type key of the active rate table
    pub rate_type: String,
    /// Upper bound for one whole run
    pub run_timeout: Duration,
    pub guard_scope: GuardScope,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            rate_type: DEFAULT_RATE_TYPE.to_string(),
            run_timeout: Duration::from_secs(30),
            guard_scope: GuardScope::Period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The guard already handed this period (or the process latch) out
    AlreadyBilled(BillingPeriod),
    /// Another run is still in flight
    Busy,
    ShuttingDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    #[error("no rate table with type {0}")]
    RateTableMissing(String),

    #[error("rate table unavailable: {0}")]
    RateTableUnavailable(String),

    #[error("balance stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("run deadline exceeded while {0}")]
    DeadlineExceeded(&'static str),
}

/// Why one record did not get a bill
#[derive(Debug, Error)]
pub enum RecordFailure {
    #[error(transparent)]
    Decode(DomainError),

    #[error("consumption lookup failed: {0}")]
    Consumption(DomainError),

    #[error(transparent)]
    Charge(ChargeError),

    #[error("update failed: {0}")]
    Update(DomainError),

    #[error("update matched no record")]
    NotMatched,

    #[error("run deadline exceeded while {0}")]
    Deadline(&'static str),
}

impl RecordFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Consumption(_) => "consumption",
            Self::Charge(_) => "charge",
            Self::Update(_) => "update",
            Self::NotMatched => "not_matched",
            Self::Deadline(_) => "deadline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub period: BillingPeriod,
    pub run_at: DateTime<Utc>,
    /// Records the cursor handed out
    pub yielded: u64,
    /// Records that received a new bill
    pub processed: u64,
    /// Records that failed in isolation
    pub errors: u64,
    /// Cursor failure that ended iteration early
    pub stream_error: Option<String>,
    /// The run deadline cut iteration short
    pub deadline_exceeded: bool,
}

impl RunSummary {
    fn new(period: BillingPeriod, run_at: DateTime<Utc>) -> Self {
        Self {
            period,
            run_at,
            yielded: 0,
            processed: 0,
            errors: 0,
            stream_error: None,
            deadline_exceeded: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Skipped(SkipReason),
    Aborted(AbortReason),
    Completed(RunSummary),
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Skipped(_) => "skipped",
            Self::Aborted(_) => "aborted",
            Self::Completed(_) => "completed",
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Issues bills to every active consumer, at most once per guard claim.
pub struct BillingOrchestrator {
    repos: Arc<dyn RepositoryProvider>,
    calculator: Arc<dyn ChargeCalculator>,
    consumption: Arc<dyn ConsumptionSource>,
    builder: BillBuilder,
    config: OrchestratorConfig,
    guard: RunGuard,
    running: Mutex<()>,
    shutdown: ShutdownSignal,
}

impl BillingOrchestrator {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            repos,
            calculator: Arc::new(SectionRateCalculator),
            consumption: Arc::new(FixedConsumption::default()),
            builder: BillBuilder::default(),
            guard: RunGuard::new(config.guard_scope),
            config,
            running: Mutex::new(()),
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.guard = RunGuard::new(config.guard_scope);
        self.config = config;
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn ChargeCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn with_consumption_source(mut self, source: Arc<dyn ConsumptionSource>) -> Self {
        self.consumption = source;
        self
    }

    pub fn with_bill_builder(mut self, builder: BillBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Entry point for scheduler ticks
    pub async fn run_tick(&self) -> RunOutcome {
        self.run_at(Utc::now()).await
    }

    /// Run the batch as of `now`. `now` becomes every bill's issue date.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunOutcome {
        if self.shutdown.is_triggered() {
            debug!("Billing tick ignored: shutting down");
            return self.finish(RunOutcome::Skipped(SkipReason::ShuttingDown), None);
        }

        let Ok(_running) = self.running.try_lock() else {
            info!("Billing tick skipped: previous run still in progress");
            return self.finish(RunOutcome::Skipped(SkipReason::Busy), None);
        };

        let period = BillingPeriod::of(now);
        if !self.guard.try_claim(period) {
            debug!(
                %period,
                scope = ?self.guard.scope(),
                last_claimed = ?self.guard.last_claimed(),
                "Billing tick skipped: already billed"
            );
            return self.finish(RunOutcome::Skipped(SkipReason::AlreadyBilled(period)), None);
        }

        info!(%period, run_at = %now, "🧾 Billing run started");
        let started = Instant::now();
        let deadline = started + self.config.run_timeout;

        let outcome = self.execute(now, period, deadline).await;
        if matches!(outcome, RunOutcome::Aborted(_)) {
            self.guard.release(period);
        }

        self.finish(outcome, Some(started.elapsed()))
    }

    /// Resolves once no run is in flight.
    pub async fn wait_idle(&self) {
        let _idle = self.running.lock().await;
    }

    fn finish(&self, outcome: RunOutcome, elapsed: Option<Duration>) -> RunOutcome {
        counter!("billing_runs_total", "outcome" => outcome.label()).increment(1);
        if let Some(elapsed) = elapsed {
            histogram!("billing_run_duration_seconds").record(elapsed.as_secs_f64());
        }
        outcome
    }

    async fn load_rate_table(&self, deadline: Instant) -> Result<RateTable, AbortReason> {
        let rate_type = self.config.rate_type.as_str();
        match timeout_at(deadline, self.repos.rate_tables().find_active(rate_type)).await {
            Err(_) => Err(AbortReason::DeadlineExceeded("loading rate table")),
            Ok(Err(e)) => Err(AbortReason::RateTableUnavailable(e.to_string())),
            Ok(Ok(None)) => Err(AbortReason::RateTableMissing(rate_type.to_string())),
            Ok(Ok(Some(table))) => Ok(table),
        }
    }

    async fn execute(
        &self,
        now: DateTime<Utc>,
        period: BillingPeriod,
        deadline: Instant,
    ) -> RunOutcome {
        let table = match self.load_rate_table(deadline).await {
            Ok(table) => Arc::new(table),
            Err(reason) => {
                error!(%period, %reason, "❌ Billing run aborted: rate table");
                return RunOutcome::Aborted(reason);
            }
        };
        info!(
            rate_table_id = table.id,
            effective_date = %table.effective_date,
            sections = table.sections.len(),
            "Rate table loaded"
        );

        let balances = self.repos.balances();
        let mut stream = match timeout_at(deadline, balances.stream_active()).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let reason = AbortReason::StreamUnavailable(e.to_string());
                error!(%period, %reason, "❌ Billing run aborted: balance stream");
                return RunOutcome::Aborted(reason);
            }
            Err(_) => {
                let reason = AbortReason::DeadlineExceeded("opening balance stream");
                error!(%period, %reason, "❌ Billing run aborted: balance stream");
                return RunOutcome::Aborted(reason);
            }
        };

        let exemptions = Exemptions::none();
        let mut summary = RunSummary::new(period, now);

        loop {
            if Instant::now() >= deadline {
                summary.deadline_exceeded = true;
                break;
            }

            let doc = match timeout_at(deadline, stream.next()).await {
                Err(_) => {
                    summary.deadline_exceeded = true;
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    summary.stream_error = Some(e.to_string());
                    break;
                }
                Ok(Some(Ok(doc))) => doc,
            };
            summary.yielded += 1;

            match self.issue_bill(&doc, &table, &exemptions, now, deadline).await {
                Ok(bill) => {
                    summary.processed += 1;
                    counter!("billing_bills_issued_total").increment(1);
                    debug!(
                        consumer_id = doc.id,
                        bill_id = %bill.id,
                        sections = bill.charges.section_count(),
                        amount_due = %bill.amount_due(),
                        "Bill issued"
                    );
                }
                Err(failure) => {
                    summary.errors += 1;
                    counter!("billing_record_errors_total", "kind" => failure.kind()).increment(1);
                    warn!(consumer_id = doc.id, kind = failure.kind(), error = %failure, "Bill not issued");
                }
            }
        }
        drop(stream);

        if summary.deadline_exceeded {
            warn!(
                %period,
                timeout_secs = self.config.run_timeout.as_secs(),
                "⏱️ Billing run deadline exceeded; remaining consumers not processed"
            );
        }

        info!(
            %period,
            yielded = summary.yielded,
            processed = summary.processed,
            errors = summary.errors,
            "✅ Billing run finished"
        );

        if let Some(stream_error) = &summary.stream_error {
            error!(
                %period,
                error = %stream_error,
                processed = summary.processed,
                "❌ Balance stream terminated with error"
            );
        }

        RunOutcome::Completed(summary)
    }

    /// Decode, price, build and write one consumer's bill. No write happens
    /// unless every earlier step succeeded.
    async fn issue_bill(
        &self,
        doc: &BalanceDocument,
        table: &RateTable,
        exemptions: &Exemptions,
        now: DateTime<Utc>,
        deadline: Instant,
    ) -> Result<Bill, RecordFailure> {
        let balance = ConsumerBalance::decode(doc).map_err(RecordFailure::Decode)?;
        let usage = self.builder.usage_period(now);

        let consumption = timeout_at(deadline, self.consumption.consumption_for(&balance, &usage))
            .await
            .map_err(|_| RecordFailure::Deadline("looking up consumption"))?
            .map_err(RecordFailure::Consumption)?;

        let charges = self
            .calculator
            .calculate(table, consumption, exemptions)
            .map_err(RecordFailure::Charge)?;

        let bill = self
            .builder
            .build(Uuid::new_v4(), now, &balance, consumption, charges);

        let outcome = timeout_at(
            deadline,
            self.repos.balances().replace_current_bill(balance.id, &bill),
        )
        .await
        .map_err(|_| RecordFailure::Deadline("updating current bill"))?
        .map_err(RecordFailure::Update)?;

        if outcome.matched_none() {
            return Err(RecordFailure::NotMatched);
        }

        Ok(bill)
    }
}
