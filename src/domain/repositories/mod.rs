//! Repository traits for the domain layer

use super::balance::BalanceRepository;
use super::rate_table::RateTableRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Built once by the service bootstrap and passed to every component
/// that touches the store:
///
/// ```ignore
/// async fn load(repos: &dyn RepositoryProvider) -> DomainResult<()> {
///     let table = repos.rate_tables().find_active("RATES").await?;
///     let mut stream = repos.balances().stream_active().await?;
///     Ok(())
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn rate_tables(&self) -> &dyn RateTableRepository;
    fn balances(&self) -> &dyn BalanceRepository;
}
