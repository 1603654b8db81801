//! Vote recording.
//!
//! A vote row and the matching tally increment are written in one
//! transaction, so `contestant.vote_count` always equals the sum of the
//! contestant's vote quantities. The increment is a single
//! `vote_count = vote_count + n` statement: concurrent voters serialize on
//! the contestant row instead of losing updates.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use evote_common::{AppError, AppResult, charge_amount, from_minor_units};
use evote_db::entities::vote;
use evote_db::repositories::{ContestantRepository, EventRepository, VoteRepository};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::{debug, info};

/// Which path a vote arrives through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    /// Free event; one vote per address per contestant.
    Free,
    /// Bought through a verified payment.
    Paid,
}

/// Vote as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub id: i64,
    pub contestant: i64,
    pub quantity: i32,
    pub timestamp: DateTime<Utc>,
    /// Event price times quantity; zero on free events.
    pub total_amount: Decimal,
}

impl VoteResponse {
    /// Build the response for a vote cast at `price_per_vote_minor`.
    #[must_use]
    pub fn new(vote: vote::Model, price_per_vote_minor: Option<i64>) -> Self {
        let total_minor = price_per_vote_minor
            .and_then(|price| charge_amount(price, vote.quantity).ok())
            .unwrap_or(0);

        Self {
            id: vote.id,
            contestant: vote.contestant_id,
            quantity: vote.quantity,
            timestamp: vote.created_at.with_timezone(&Utc),
            total_amount: from_minor_units(total_minor),
        }
    }
}

/// Records votes and keeps contestant tallies in step with them.
#[derive(Clone)]
pub struct VoteRecorder {
    db: Arc<DatabaseConnection>,
}

impl VoteRecorder {
    /// Create a new vote recorder.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Cast a free vote from `voter_ip`.
    ///
    /// The event must be free and open, `quantity` must be within the
    /// event's per-voter limit, and the address must not have voted for
    /// this contestant before.
    pub async fn record_vote(
        &self,
        contestant_id: i64,
        quantity: i32,
        voter_ip: Option<IpAddr>,
    ) -> AppResult<vote::Model> {
        check_quantity(quantity)?;
        let voter_ip = voter_ip
            .ok_or_else(|| AppError::Validation("Voter address is unknown".to_string()))?
            .to_string();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let contestant = ContestantRepository::find_by_id_in(&txn, contestant_id)
            .await?
            .ok_or_else(|| AppError::ContestantNotFound(contestant_id.to_string()))?;
        let event = EventRepository::find_by_id_in(&txn, contestant.event_id)
            .await?
            .ok_or_else(|| AppError::EventNotFound(contestant.event_id.to_string()))?;

        if event.is_paid() {
            return Err(AppError::Validation(
                "This event requires payment; use the payment flow".to_string(),
            ));
        }
        if !event.is_open_at(Utc::now()) {
            return Err(AppError::Validation("Voting is closed for this event".to_string()));
        }
        if quantity > event.max_votes_per_user {
            return Err(AppError::Validation(format!(
                "At most {} votes per voter",
                event.max_votes_per_user
            )));
        }

        if VoteRepository::has_free_vote(&txn, contestant.id, &voter_ip).await? {
            debug!(contestant_id, voter_ip = %voter_ip, "Duplicate free vote rejected");
            return Err(AppError::DuplicateVote { contestant_id });
        }

        let vote = Self::record_in(&txn, contestant.id, quantity, Some(voter_ip), VoteKind::Free)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(contestant_id, quantity, vote_id = vote.id, "Free vote recorded");
        Ok(vote)
    }

    /// Insert a vote and add its quantity to the contestant's tally on an
    /// open transaction. The caller owns commit and rollback.
    pub async fn record_in<C: ConnectionTrait>(
        conn: &C,
        contestant_id: i64,
        quantity: i32,
        voter_ip: Option<String>,
        kind: VoteKind,
    ) -> AppResult<vote::Model> {
        check_quantity(quantity)?;

        let vote = VoteRepository::insert(
            conn,
            vote::ActiveModel {
                contestant_id: Set(contestant_id),
                voter_ip: Set(voter_ip),
                quantity: Set(quantity),
                is_paid: Set(kind == VoteKind::Paid),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            },
        )
        .await?;

        ContestantRepository::increment_vote_count(conn, contestant_id, i64::from(quantity))
            .await?;

        Ok(vote)
    }
}

fn check_quantity(quantity: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}
