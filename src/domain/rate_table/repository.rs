//! Rate table repository interface

use async_trait::async_trait;

use super::model::RateTable;
use crate::domain::DomainResult;

#[async_trait]
pub trait RateTableRepository: Send + Sync {
    /// Load the active table for `rate_type`.
    ///
    /// `Ok(None)` when no table carries the key; `Err(Decode)` when one
    /// does but its sections cannot be read.
    async fn find_active(&self, rate_type: &str) -> DomainResult<Option<RateTable>>;

    /// Insert or replace the table stored under `table.rate_type`.
    async fn save(&self, table: RateTable) -> DomainResult<RateTable>;
}
