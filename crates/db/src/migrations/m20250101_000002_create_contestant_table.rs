//! Create contestant table migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_event_table::Event;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Contestant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Contestant::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Contestant::EventId).big_integer().not_null())
                    .col(ColumnDef::new(Contestant::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Contestant::Bio).text())
                    .col(ColumnDef::new(Contestant::PhotoUrl).string_len(512))
                    .col(
                        ColumnDef::new(Contestant::VoteCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Contestant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Contestant::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contestant_event")
                            .from(Contestant::Table, Contestant::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for listing an event's contestants)
        manager
            .create_index(
                Index::create()
                    .name("idx_contestant_event_id")
                    .table(Contestant::Table)
                    .col(Contestant::EventId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Contestant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Contestant {
    Table,
    Id,
    EventId,
    Name,
    Bio,
    PhotoUrl,
    VoteCount,
    CreatedAt,
    UpdatedAt,
}
