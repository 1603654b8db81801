//! Vote repository.

use std::sync::Arc;

use crate::entities::{Vote, vote};
use crate::is_unique_violation;
use evote_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect,
};

/// Vote repository for database operations.
///
/// Votes are created only through [`VoteRepository::insert`] inside the
/// recorder's transaction and are never updated.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a vote by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<vote::Model>> {
        Vote::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of vote rows for a contestant.
    pub async fn count_by_contestant(&self, contestant_id: i64) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::ContestantId.eq(contestant_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Sum of quantities over a contestant's votes; what `vote_count`
    /// must always equal.
    pub async fn sum_quantity(&self, contestant_id: i64) -> AppResult<i64> {
        let total: Option<Option<i64>> = Vote::find()
            .select_only()
            .column_as(vote::Column::Quantity.sum(), "total")
            .filter(vote::Column::ContestantId.eq(contestant_id))
            .into_tuple()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// Whether a free vote already exists for this contestant and address.
    pub async fn has_free_vote<C: ConnectionTrait>(
        conn: &C,
        contestant_id: i64,
        voter_ip: &str,
    ) -> AppResult<bool> {
        let count = Vote::find()
            .filter(vote::Column::ContestantId.eq(contestant_id))
            .filter(vote::Column::VoterIp.eq(voter_ip))
            .filter(vote::Column::IsPaid.eq(false))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert a vote on the given connection or transaction.
    ///
    /// A unique-index hit (a concurrent free vote from the same address)
    /// is reported as [`AppError::DuplicateVote`].
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        let contestant_id = model.contestant_id.clone().take().unwrap_or_default();
        model.insert(conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateVote { contestant_id }
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}
