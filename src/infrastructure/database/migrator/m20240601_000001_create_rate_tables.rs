//! Create rate_tables table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RateTables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RateTables::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RateTables::Type).string().not_null())
                    .col(
                        ColumnDef::new(RateTables::EffectiveDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RateTables::Sections)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(RateTables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RateTables::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One table per type key
        manager
            .create_index(
                Index::create()
                    .name("idx_rate_tables_type")
                    .table(RateTables::Table)
                    .col(RateTables::Type)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RateTables::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum RateTables {
    Table,
    Id,
    Type,
    EffectiveDate,
    Sections,
    CreatedAt,
    UpdatedAt,
}
