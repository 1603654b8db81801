//! Payment repository.

use std::sync::Arc;

use crate::entities::{Payment, payment};
use crate::is_unique_violation;
use evote_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Payment repository for database operations.
#[derive(Clone)]
pub struct PaymentRepository {
    db: Arc<DatabaseConnection>,
}

impl PaymentRepository {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a payment by processor reference.
    pub async fn find_by_reference(&self, reference: &str) -> AppResult<Option<payment::Model>> {
        Self::find_by_reference_in(self.db.as_ref(), reference).await
    }

    /// Get a payment by processor reference, returning an error if not found.
    pub async fn get_by_reference(&self, reference: &str) -> AppResult<payment::Model> {
        self.find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::PaymentNotFound(reference.to_string()))
    }

    /// Find a payment by reference on the given connection or transaction.
    pub async fn find_by_reference_in<C: ConnectionTrait>(
        conn: &C,
        reference: &str,
    ) -> AppResult<Option<payment::Model>> {
        Payment::find()
            .filter(payment::Column::Reference.eq(reference))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a payment on the given connection or transaction.
    ///
    /// A unique-index hit on `reference` means another verification already
    /// recorded this transaction; it is reported as [`AppError::Conflict`].
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: payment::ActiveModel,
    ) -> AppResult<payment::Model> {
        let reference = model.reference.clone().take().unwrap_or_default();
        model.insert(conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Payment {reference} already recorded"))
            } else {
                AppError::Database(e.to_string())
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::payment::PaymentProvider;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_payment(reference: &str) -> payment::Model {
        let now = Utc::now();
        payment::Model {
            id: 1,
            vote_id: 1,
            amount_minor: 600,
            quantity: 3,
            reference: reference.to_string(),
            status: "success".to_string(),
            phone_number: "0551234567".to_string(),
            provider: PaymentProvider::Mtn,
            paid_at: Some(now.into()),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_reference() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_payment("txn_ref_001")]])
                .into_connection(),
        );

        let repo = PaymentRepository::new(db);
        let payment = repo.find_by_reference("txn_ref_001").await.unwrap().unwrap();

        assert_eq!(payment.amount_minor, 600);
        assert_eq!(payment.amount().to_string(), "6.00");
    }

    #[tokio::test]
    async fn test_get_by_reference_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<payment::Model>::new()])
                .into_connection(),
        );

        let repo = PaymentRepository::new(db);
        match repo.get_by_reference("missing").await {
            Err(AppError::PaymentNotFound(reference)) => assert_eq!(reference, "missing"),
            _ => panic!("Expected PaymentNotFound error"),
        }
    }
}
