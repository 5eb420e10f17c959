//! Migration: create histories table.
//!
//! No foreign key on product_id: entries outlive the products they describe.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Histories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Histories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Histories::ProductId).uuid().not_null())
                    .col(ColumnDef::new(Histories::ProductName).string().not_null())
                    .col(ColumnDef::new(Histories::ActionType).string_len(16).not_null())
                    .col(ColumnDef::new(Histories::UserId).uuid().not_null())
                    .col(ColumnDef::new(Histories::UserName).string().not_null())
                    .col(ColumnDef::new(Histories::OldStockLevel).integer().null())
                    .col(ColumnDef::new(Histories::OldPrice).double().null())
                    .col(ColumnDef::new(Histories::NewStockLevel).integer().null())
                    .col(ColumnDef::new(Histories::NewPrice).double().null())
                    .col(ColumnDef::new(Histories::Quantity).integer().null())
                    .col(ColumnDef::new(Histories::Reference).string().null())
                    .col(
                        ColumnDef::new(Histories::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_histories_timestamp")
                    .table(Histories::Table)
                    .col(Histories::Timestamp)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Histories::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Histories {
    Table,
    Id,
    ProductId,
    ProductName,
    ActionType,
    UserId,
    UserName,
    OldStockLevel,
    OldPrice,
    NewStockLevel,
    NewPrice,
    Quantity,
    Reference,
    Timestamp,
}
