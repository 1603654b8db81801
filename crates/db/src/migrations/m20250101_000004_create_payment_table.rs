//! Create payment table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000003_create_vote_table::Vote;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payment::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Payment::VoteId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Payment::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Payment::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(Payment::Reference)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Payment::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Payment::PhoneNumber).string_len(20).not_null())
                    .col(ColumnDef::new(Payment::Provider).string_len(16).not_null())
                    .col(ColumnDef::new(Payment::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Payment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Payment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_vote")
                            .from(Payment::Table, Payment::VoteId)
                            .to(Vote::Table, Vote::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: created_at (for reconciliation reports)
        manager
            .create_index(
                Index::create()
                    .name("idx_payment_created_at")
                    .table(Payment::Table)
                    .col(Payment::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Payment {
    Table,
    Id,
    VoteId,
    AmountMinor,
    Quantity,
    Reference,
    Status,
    PhoneNumber,
    Provider,
    PaidAt,
    CreatedAt,
    UpdatedAt,
}
