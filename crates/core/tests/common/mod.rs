//! Shared fixtures for service tests: a migrated in-memory database and a
//! scripted payment processor.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use evote_common::config::PaymentConfig;
use evote_common::{AppError, AppResult};
use evote_core::{
    ChargeAuthorization, ChargeRequest, PaymentGateway, PaymentService, VerifiedTransaction,
};
use evote_db::entities::event::VoteType;
use evote_db::entities::{Contestant, Payment, Vote, contestant, event};
use evote_db::repositories::{ContestantRepository, EventRepository, VoteRepository};
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, PaginatorTrait, Set};
use serde_json::json;

pub const ORGANIZER: &str = "organizer1";
pub const WEBHOOK_SIGNATURE: &str = "valid-signature";

pub async fn database() -> Arc<DatabaseConnection> {
    Arc::new(evote_db::test_utils::in_memory().await.unwrap())
}

pub async fn seed_event(
    db: &Arc<DatabaseConnection>,
    vote_type: VoteType,
    price_per_vote_minor: Option<i64>,
) -> event::Model {
    let now = Utc::now();
    EventRepository::new(db.clone())
        .create(event::ActiveModel {
            public_id: Set(evote_common::IdGenerator::new().generate()),
            organizer_id: Set(ORGANIZER.to_string()),
            name: Set("Campus Awards".to_string()),
            logo_url: Set(None),
            start_date: Set((now - Duration::hours(1)).into()),
            end_date: Set((now + Duration::days(1)).into()),
            vote_type: Set(vote_type),
            max_votes_per_user: Set(5),
            price_per_vote_minor: Set(price_per_vote_minor),
            created_at: Set(now.into()),
            updated_at: Set(None),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn seed_contestant(
    db: &Arc<DatabaseConnection>,
    event_id: i64,
    id: Option<i64>,
) -> contestant::Model {
    ContestantRepository::new(db.clone())
        .create(contestant::ActiveModel {
            id: id.map_or(ActiveValue::NotSet, Set),
            event_id: Set(event_id),
            name: Set("Ama Mensah".to_string()),
            bio: Set(None),
            photo_url: Set(None),
            vote_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap()
}

pub async fn vote_count(db: &Arc<DatabaseConnection>, contestant_id: i64) -> i64 {
    ContestantRepository::new(db.clone())
        .get_by_id(contestant_id)
        .await
        .unwrap()
        .vote_count
}

/// Tally must equal the sum of recorded vote quantities.
pub async fn assert_tally_consistent(db: &Arc<DatabaseConnection>, contestant_id: i64) {
    let sum = VoteRepository::new(db.clone())
        .sum_quantity(contestant_id)
        .await
        .unwrap();
    assert_eq!(vote_count(db, contestant_id).await, sum);
}

pub async fn total_votes(db: &Arc<DatabaseConnection>) -> u64 {
    Vote::find().count(db.as_ref()).await.unwrap()
}

pub async fn total_payments(db: &Arc<DatabaseConnection>) -> u64 {
    Payment::find().count(db.as_ref()).await.unwrap()
}

pub async fn total_contestants(db: &Arc<DatabaseConnection>) -> u64 {
    Contestant::find().count(db.as_ref()).await.unwrap()
}

pub fn payment_config() -> PaymentConfig {
    PaymentConfig {
        base_url: "https://processor.test".to_string(),
        secret_key: "sk_test".to_string(),
        timeout_secs: 5,
        customer_email_domain: "voters.evote.local".to_string(),
        callback_url: Some("https://evote.test/paid".to_string()),
    }
}

pub fn payment_service(db: &Arc<DatabaseConnection>, gateway: &Arc<StubGateway>) -> PaymentService {
    PaymentService::new(db.clone(), gateway.clone(), &payment_config())
}

/// Processor double: charges are recorded, verifications are scripted.
#[derive(Default)]
pub struct StubGateway {
    pub charges: Mutex<Vec<ChargeRequest>>,
    transactions: Mutex<HashMap<String, VerifiedTransaction>>,
    pub verify_calls: AtomicUsize,
    pub fail_initialize: bool,
}

impl StubGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            fail_initialize: true,
            ..Self::default()
        })
    }

    pub fn script(
        &self,
        reference: &str,
        status: &str,
        amount_minor: i64,
        metadata: serde_json::Value,
    ) {
        self.transactions.lock().unwrap().insert(
            reference.to_string(),
            VerifiedTransaction {
                reference: reference.to_string(),
                status: status.to_string(),
                amount_minor,
                paid_at: Some(Utc::now()),
                metadata,
            },
        );
    }

    pub fn script_success(
        &self,
        reference: &str,
        contestant_id: i64,
        quantity: i32,
        amount_minor: i64,
    ) {
        self.script(
            reference,
            "success",
            amount_minor,
            json!({
                "contestant_id": contestant_id,
                "quantity": quantity,
                "phone_number": "0551234567",
                "provider": "mtn",
            }),
        );
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initialize(&self, request: &ChargeRequest) -> AppResult<ChargeAuthorization> {
        if self.fail_initialize {
            return Err(AppError::GatewayUnavailable(
                "connection refused".to_string(),
            ));
        }
        let mut charges = self.charges.lock().unwrap();
        charges.push(request.clone());
        let n = charges.len();
        Ok(ChargeAuthorization {
            authorization_url: format!("https://checkout.test/{n}"),
            reference: format!("txn_ref_{n:03}"),
        })
    }

    async fn verify(&self, reference: &str) -> AppResult<VerifiedTransaction> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.transactions
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| {
                AppError::VerificationFailed("Transaction reference not found".to_string())
            })
    }

    fn verify_webhook_signature(&self, _payload: &[u8], signature: &str) -> bool {
        signature == WEBHOOK_SIGNATURE
    }
}
