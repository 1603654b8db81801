//! Vote entity.
//!
//! Votes are immutable: there is no update path in the repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vote")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub contestant_id: i64,

    /// Network address the vote came from.
    #[sea_orm(nullable)]
    pub voter_ip: Option<String>,

    pub quantity: i32,

    /// Paid votes are exempt from the one-per-address rule; their
    /// uniqueness comes from the payment link.
    pub is_paid: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contestant::Entity",
        from = "Column::ContestantId",
        to = "super::contestant::Column::Id",
        on_delete = "Cascade"
    )]
    Contestant,

    #[sea_orm(has_one = "super::payment::Entity")]
    Payment,
}

impl Related<super::contestant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contestant.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
