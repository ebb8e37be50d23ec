//! Cron trigger for the billing batch

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use super::orchestrator::{BillingOrchestrator, RunOutcome};
use crate::shared::errors::InfraError;

/// Default cadence: every 30 seconds (six-field cron, seconds first)
pub const DEFAULT_BILLING_CRON: &str = "*/30 * * * * *";

/// Owns the cron job that ticks the orchestrator.
///
/// Ticks may overlap or repeat; the orchestrator's guard decides whether a
/// tick does any work.
pub struct BillingScheduler {
    scheduler: JobScheduler,
}

impl BillingScheduler {
    pub async fn start(
        orchestrator: Arc<BillingOrchestrator>,
        cron: &str,
    ) -> Result<Self, InfraError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| InfraError::Scheduler(format!("creating scheduler: {e:?}")))?;

        let job = Job::new_async(cron, move |_uuid, _lock| {
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                match orchestrator.run_tick().await {
                    RunOutcome::Completed(summary) => {
                        debug!(period = %summary.period, processed = summary.processed, "Billing tick done")
                    }
                    RunOutcome::Skipped(reason) => debug!(?reason, "Billing tick skipped"),
                    RunOutcome::Aborted(reason) => warn!(%reason, "Billing tick aborted"),
                }
            })
        })
        .map_err(|e| InfraError::Scheduler(format!("invalid cron {cron:?}: {e:?}")))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| InfraError::Scheduler(format!("adding billing job: {e:?}")))?;
        scheduler
            .start()
            .await
            .map_err(|e| InfraError::Scheduler(format!("starting scheduler: {e:?}")))?;

        info!(cron, "⏰ Billing scheduler started");

        Ok(Self { scheduler })
    }

    /// Stop firing new ticks. A run already in flight is not interrupted.
    pub async fn shutdown(mut self) {
        match self.scheduler.shutdown().await {
            Ok(()) => info!("Billing scheduler stopped"),
            Err(e) => warn!(error = ?e, "Billing scheduler did not stop cleanly"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn orchestrator() -> Arc<BillingOrchestrator> {
        Arc::new(BillingOrchestrator::new(Arc::new(
            InMemoryRepositoryProvider::new(),
        )))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn invalid_cron_is_rejected() {
        let result = BillingScheduler::start(orchestrator(), "every now and then").await;

        assert!(matches!(result, Err(InfraError::Scheduler(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn starts_and_stops() {
        let scheduler = BillingScheduler::start(orchestrator(), DEFAULT_BILLING_CRON)
            .await
            .unwrap();

        scheduler.shutdown().await;
    }
}
