//! Contestant repository.

use std::sync::Arc;

use crate::entities::{Contestant, contestant};
use evote_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};

/// Contestant repository for database operations.
#[derive(Clone)]
pub struct ContestantRepository {
    db: Arc<DatabaseConnection>,
}

impl ContestantRepository {
    /// Create a new contestant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a contestant by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<contestant::Model>> {
        Self::find_by_id_in(self.db.as_ref(), id).await
    }

    /// Get a contestant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<contestant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ContestantNotFound(id.to_string()))
    }

    /// Find a contestant by ID on the given connection or transaction.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: i64,
    ) -> AppResult<Option<contestant::Model>> {
        Contestant::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List an event's contestants in creation order.
    pub async fn find_by_event(&self, event_id: i64) -> AppResult<Vec<contestant::Model>> {
        Contestant::find()
            .filter(contestant::Column::EventId.eq(event_id))
            .order_by_asc(contestant::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Contestants of several events in one query, ordered by event then
    /// creation.
    pub async fn find_by_events(&self, event_ids: &[i64]) -> AppResult<Vec<contestant::Model>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        Contestant::find()
            .filter(contestant::Column::EventId.is_in(event_ids.iter().copied()))
            .order_by_asc(contestant::Column::EventId)
            .order_by_asc(contestant::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new contestant.
    pub async fn create(&self, model: contestant::ActiveModel) -> AppResult<contestant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a contestant's profile. The tally is never written here.
    pub async fn update(&self, mut model: contestant::ActiveModel) -> AppResult<contestant::Model> {
        model.vote_count = NotSet;
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a contestant. Its votes and their payments go with it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Contestant::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add `by` to a contestant's tally as a single `UPDATE ... SET
    /// vote_count = vote_count + by`, so concurrent increments serialize on
    /// the row lock instead of overwriting each other.
    pub async fn increment_vote_count<C: ConnectionTrait>(
        conn: &C,
        id: i64,
        by: i64,
    ) -> AppResult<()> {
        let result = Contestant::update_many()
            .col_expr(
                contestant::Column::VoteCount,
                Expr::col(contestant::Column::VoteCount).add(by),
            )
            .filter(contestant::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::ContestantNotFound(id.to_string()));
        }
        Ok(())
    }
}
