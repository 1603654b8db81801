//! Create vote table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_contestant_table::Contestant;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vote::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vote::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vote::ContestantId).big_integer().not_null())
                    .col(ColumnDef::new(Vote::VoterIp).string_len(45))
                    .col(ColumnDef::new(Vote::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(Vote::IsPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Vote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Vote::Quantity).gte(1))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vote_contestant")
                            .from(Vote::Table, Vote::ContestantId)
                            .to(Contestant::Table, Contestant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: contestant_id (for tallies and listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_vote_contestant_id")
                    .table(Vote::Table)
                    .col(Vote::ContestantId)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: one free vote per (contestant, address)
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_vote_free_contestant_voter_ip
                ON vote (contestant_id, voter_ip)
                WHERE is_paid = false;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Vote {
    Table,
    Id,
    ContestantId,
    VoterIp,
    Quantity,
    IsPaid,
    CreatedAt,
}
