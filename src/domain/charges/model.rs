//! Charge breakdown value types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::rate_table::RateUnit;

/// Rate sections and line items excluded from charge computation.
///
/// Empty for every consumer today; kept as the hook for per-consumer
/// exemptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exemptions {
    pub sections: BTreeSet<String>,
    pub items: BTreeSet<String>,
}

impl Exemptions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn exempts_section(&self, name: &str) -> bool {
        self.sections.contains(name)
    }

    pub fn exempts_item(&self, name: &str) -> bool {
        self.items.contains(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemCharge {
    pub name: String,
    pub unit: RateUnit,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCharge {
    pub name: String,
    pub rate: Decimal,
    pub base_amount: Decimal,
    pub items: Vec<LineItemCharge>,
    pub subtotal: Decimal,
}

/// Output of a charge calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeBreakdown {
    pub rate_table_id: i32,
    pub rate_table_date: DateTime<Utc>,
    pub sections: Vec<SectionCharge>,
    pub amount_due: Decimal,
}

impl ChargeBreakdown {
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}
