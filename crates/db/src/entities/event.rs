//! Event entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How votes for an event are cast.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// One vote per address per contestant, no charge.
    #[sea_orm(string_value = "free")]
    Free,
    /// Votes are bought through a mobile-money charge.
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// A voting event owned by an organizer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Public identifier shared in voting links.
    #[sea_orm(unique)]
    pub public_id: String,

    /// Subject of the organizer's access token.
    #[sea_orm(indexed)]
    pub organizer_id: String,

    pub name: String,

    #[sea_orm(nullable)]
    pub logo_url: Option<String>,

    /// Voting opens at this instant (inclusive).
    pub start_date: DateTimeWithTimeZone,

    /// Voting closes at this instant (exclusive).
    pub end_date: DateTimeWithTimeZone,

    pub vote_type: VoteType,

    pub max_votes_per_user: i32,

    /// Price of one vote in minor units; set iff the event is paid.
    #[sea_orm(nullable)]
    pub price_per_vote_minor: Option<i64>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::contestant::Entity")]
    Contestant,
}

impl Related<super::contestant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contestant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether votes must be paid for.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self.vote_type, VoteType::Paid)
    }

    /// Whether `now` falls inside `[start_date, end_date)`.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now < self.end_date
    }

    /// Price of one vote in major units.
    #[must_use]
    pub fn price_per_vote(&self) -> Option<Decimal> {
        self.price_per_vote_minor
            .map(evote_common::from_minor_units)
    }
}
