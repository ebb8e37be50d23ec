//! Balance repository interface

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::model::{BalanceDocument, UpdateOutcome};
use crate::domain::bill::Bill;
use crate::domain::DomainResult;

/// Lazy cursor over balance records.
///
/// An `Err` item is a cursor failure (e.g. the connection dropped), not a
/// bad record: records that fail to decode are still yielded as `Ok`.
pub type BalanceStream<'a> = BoxStream<'a, DomainResult<BalanceDocument>>;

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Open a cursor over every record flagged active. Order is unspecified.
    async fn stream_active<'a>(&'a self) -> DomainResult<BalanceStream<'a>>;

    /// Replace only the `currentBill` of the record keyed by `id`.
    async fn replace_current_bill(&self, id: i64, bill: &Bill) -> DomainResult<UpdateOutcome>;

    async fn find_by_id(&self, id: i64) -> DomainResult<Option<BalanceDocument>>;

    async fn current_bill(&self, id: i64) -> DomainResult<Option<Bill>>;

    async fn save(&self, doc: BalanceDocument) -> DomainResult<()>;
}
