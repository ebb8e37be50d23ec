//! Create balances table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Balances::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Balances::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Balances::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Balances::Document).text().not_null())
                    .col(ColumnDef::new(Balances::CurrentBill).text())
                    .to_owned(),
            )
            .await?;

        // The batch filters on is_active
        manager
            .create_index(
                Index::create()
                    .name("idx_balances_is_active")
                    .table(Balances::Table)
                    .col(Balances::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Balances::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Balances {
    Table,
    Id,
    IsActive,
    Document,
    CurrentBill,
}
