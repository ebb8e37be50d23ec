//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_rate_tables;
mod m20240601_000002_create_balances;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_rate_tables::Migration),
            Box::new(m20240601_000002_create_balances::Migration),
        ]
    }
}
