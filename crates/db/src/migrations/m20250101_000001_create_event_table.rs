//! Create event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Event::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Event::PublicId)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Event::OrganizerId).string_len(64).not_null())
                    .col(ColumnDef::new(Event::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Event::LogoUrl).string_len(512))
                    .col(
                        ColumnDef::new(Event::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Event::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Event::VoteType).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Event::MaxVotesPerUser)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Event::PricePerVoteMinor).big_integer())
                    .col(
                        ColumnDef::new(Event::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Event::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: organizer_id (for listing an organizer's events)
        manager
            .create_index(
                Index::create()
                    .name("idx_event_organizer_id")
                    .table(Event::Table)
                    .col(Event::OrganizerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Event {
    Table,
    Id,
    PublicId,
    OrganizerId,
    Name,
    LogoUrl,
    StartDate,
    EndDate,
    VoteType,
    MaxVotesPerUser,
    PricePerVoteMinor,
    CreatedAt,
    UpdatedAt,
}
