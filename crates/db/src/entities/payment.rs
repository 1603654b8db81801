//! Payment entity.

use std::fmt;
use std::str::FromStr;

use evote_common::AppError;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supported mobile-money networks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    #[sea_orm(string_value = "mtn")]
    Mtn,
    #[sea_orm(string_value = "vodafone")]
    Vodafone,
    #[sea_orm(string_value = "airteltigo")]
    AirtelTigo,
}

impl PaymentProvider {
    /// Name used in requests and metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mtn => "mtn",
            Self::Vodafone => "vodafone",
            Self::AirtelTigo => "airteltigo",
        }
    }

    /// Network code the processor expects in `mobile_money.provider`.
    #[must_use]
    pub const fn gateway_code(self) -> &'static str {
        match self {
            Self::Mtn => "mtn",
            Self::Vodafone => "vod",
            Self::AirtelTigo => "atl",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtn" => Ok(Self::Mtn),
            "vodafone" | "vod" => Ok(Self::Vodafone),
            "airteltigo" | "atl" => Ok(Self::AirtelTigo),
            other => Err(AppError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// A verified payment; owns the vote it bought.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub vote_id: i64,

    /// Amount reported by the processor, in minor units.
    pub amount_minor: i64,

    pub quantity: i32,

    /// Processor transaction reference; the reconciliation idempotency key.
    #[sea_orm(unique)]
    pub reference: String,

    pub status: String,

    pub phone_number: String,

    pub provider: PaymentProvider,

    #[sea_orm(nullable)]
    pub paid_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vote::Entity",
        from = "Column::VoteId",
        to = "super::vote::Column::Id",
        on_delete = "Cascade"
    )]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Amount in major units.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        evote_common::from_minor_units(self.amount_minor)
    }
}
