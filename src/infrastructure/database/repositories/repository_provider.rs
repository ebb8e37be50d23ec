//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::balance::BalanceRepository;
use crate::domain::rate_table::RateTableRepository;
use crate::domain::repositories::RepositoryProvider;

use super::balance_repository::SeaOrmBalanceRepository;
use super::rate_table_repository::SeaOrmRateTableRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
pub struct SeaOrmRepositoryProvider {
    rate_tables: SeaOrmRateTableRepository,
    balances: SeaOrmBalanceRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            rate_tables: SeaOrmRateTableRepository::new(db.clone()),
            balances: SeaOrmBalanceRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn rate_tables(&self) -> &dyn RateTableRepository {
        &self.rate_tables
    }

    fn balances(&self) -> &dyn BalanceRepository {
        &self.balances
    }
}
