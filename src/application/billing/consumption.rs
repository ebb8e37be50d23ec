//! Consumption lookup
//!
//! Metering integration lives outside this crate; the batch asks a
//! [`ConsumptionSource`] for each consumer's usage over the bill's window.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::balance::ConsumerBalance;
use crate::domain::bill::UsagePeriod;
use crate::domain::DomainResult;

#[async_trait]
pub trait ConsumptionSource: Send + Sync {
    async fn consumption_for(
        &self,
        balance: &ConsumerBalance,
        period: &UsagePeriod,
    ) -> DomainResult<Decimal>;
}

/// Same quantity for every consumer. Placeholder until meter readings
/// are wired in.
#[derive(Debug, Clone, Copy)]
pub struct FixedConsumption {
    quantity: Decimal,
}

impl FixedConsumption {
    pub fn new(quantity: Decimal) -> Self {
        Self { quantity }
    }
}

impl Default for FixedConsumption {
    fn default() -> Self {
        Self::new(Decimal::ONE_HUNDRED)
    }
}

#[async_trait]
impl ConsumptionSource for FixedConsumption {
    async fn consumption_for(
        &self,
        _balance: &ConsumerBalance,
        _period: &UsagePeriod,
    ) -> DomainResult<Decimal> {
        Ok(self.quantity)
    }
}
