//! Bill assembly

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::model::{Bill, UsagePeriod};
use crate::domain::balance::ConsumerBalance;
use crate::domain::charges::ChargeBreakdown;

/// Builds bills with derived dates. Pure: freeze `now` and the id to get
/// the same bill every time.
#[derive(Debug, Clone, Copy)]
pub struct BillBuilder {
    pub due_after: Duration,
    pub usage_window: Duration,
}

impl Default for BillBuilder {
    fn default() -> Self {
        Self {
            due_after: Duration::days(30),
            usage_window: Duration::days(30),
        }
    }
}

impl BillBuilder {
    pub fn new(due_after_days: i64, usage_window_days: i64) -> Self {
        Self {
            due_after: Duration::days(due_after_days),
            usage_window: Duration::days(usage_window_days),
        }
    }

    /// Usage window ending at `now`
    pub fn usage_period(&self, now: DateTime<Utc>) -> UsagePeriod {
        UsagePeriod {
            start: now - self.usage_window,
            end: now,
        }
    }

    pub fn build(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
        balance: &ConsumerBalance,
        consumption: Decimal,
        charges: ChargeBreakdown,
    ) -> Bill {
        Bill {
            id,
            issue_date: now,
            due_date: now + self.due_after,
            usage_period: self.usage_period(now),
            consumer_class: balance.consumer_class.clone(),
            meter_number: balance.meter_number.clone(),
            consumption,
            charges,
            is_paid: false,
        }
    }
}
