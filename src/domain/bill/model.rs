//! Bill domain value

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::charges::ChargeBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsagePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: Uuid,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub usage_period: UsagePeriod,
    pub consumer_class: String,
    pub meter_number: String,
    pub consumption: Decimal,
    pub charges: ChargeBreakdown,
    pub is_paid: bool,
}

impl Bill {
    pub fn amount_due(&self) -> Decimal {
        self.charges.amount_due
    }
}
