//! Payment reconciliation.
//!
//! `initiate` only talks to the processor; nothing is stored until `verify`
//! sees a successful transaction. A verified reference then becomes exactly
//! one vote and one payment, written in the same transaction as the tally
//! update. Replays are absorbed twice over: an existing payment short-circuits
//! before the processor is called, and the unique index on
//! `payment.reference` turns a lost race into "already processed".

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use evote_common::config::PaymentConfig;
use evote_common::{AppError, AppResult, charge_amount, from_minor_units};
use evote_db::entities::payment::PaymentProvider;
use evote_db::entities::{payment, vote};
use evote_db::repositories::{
    ContestantRepository, EventRepository, PaymentRepository, VoteRepository,
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use super::auth::Organizer;
use super::gateway::{ChargeMetadata, ChargeRequest, PaymentGateway};
use super::vote::{VoteKind, VoteRecorder, VoteResponse};

/// Webhook event announcing a completed charge.
const CHARGE_SUCCESS_EVENT: &str = "charge.success";

/// Input for starting a paid vote.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InitiatePaymentInput {
    #[validate(length(min = 9, max = 20))]
    pub phone_number: String,
    pub contestant_id: i64,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub provider: String,
}

/// Checkout link for a started payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInitiation {
    pub payment_url: String,
    pub reference: String,
}

/// Payment as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub reference: String,
    pub vote: i64,
    pub amount: Decimal,
    pub quantity: i32,
    pub status: String,
    pub phone_number: String,
    pub provider: PaymentProvider,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(p: payment::Model) -> Self {
        Self {
            amount: p.amount(),
            reference: p.reference,
            vote: p.vote_id,
            quantity: p.quantity,
            status: p.status,
            phone_number: p.phone_number,
            provider: p.provider,
            paid_at: p.paid_at.map(|t| t.with_timezone(&Utc)),
            created_at: p.created_at.with_timezone(&Utc),
        }
    }
}

/// Outcome of verifying a reference.
#[derive(Debug, Clone)]
pub struct VerifiedVote {
    pub vote: vote::Model,
    pub payment: payment::Model,
    /// The reference had been recorded by an earlier call.
    pub already_processed: bool,
    /// Price per vote of the contestant's event, in minor units.
    pub price_per_vote_minor: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedVoteResponse {
    pub vote: VoteResponse,
    pub payment: PaymentResponse,
    pub already_processed: bool,
}

impl From<VerifiedVote> for VerifiedVoteResponse {
    fn from(v: VerifiedVote) -> Self {
        Self {
            vote: VoteResponse::new(v.vote, v.price_per_vote_minor),
            payment: v.payment.into(),
            already_processed: v.already_processed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    reference: String,
}

/// Orchestrates paid votes: initiate, verify, record.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DatabaseConnection>,
    contestant_repo: ContestantRepository,
    event_repo: EventRepository,
    vote_repo: VoteRepository,
    payment_repo: PaymentRepository,
    gateway: Arc<dyn PaymentGateway>,
    customer_email_domain: String,
    callback_url: Option<String>,
}

impl PaymentService {
    /// Create a new payment service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        config: &PaymentConfig,
    ) -> Self {
        Self {
            contestant_repo: ContestantRepository::new(db.clone()),
            event_repo: EventRepository::new(db.clone()),
            vote_repo: VoteRepository::new(db.clone()),
            payment_repo: PaymentRepository::new(db.clone()),
            db,
            gateway,
            customer_email_domain: config.customer_email_domain.clone(),
            callback_url: config.callback_url.clone(),
        }
    }

    /// Start a mobile-money charge for `quantity` votes.
    ///
    /// Stores nothing; the vote exists only once [`Self::verify`] sees the
    /// charge succeed.
    pub async fn initiate(&self, input: InitiatePaymentInput) -> AppResult<PaymentInitiation> {
        input.validate()?;
        let provider: PaymentProvider = input.provider.parse()?;

        let contestant = self.contestant_repo.get_by_id(input.contestant_id).await?;
        let event = self.event_repo.get_by_id(contestant.event_id).await?;

        if !event.is_paid() {
            return Err(AppError::Validation(
                "This event is free; vote directly".to_string(),
            ));
        }
        if !event.is_open_at(Utc::now()) {
            return Err(AppError::Validation("Voting is closed for this event".to_string()));
        }
        let price_minor = event.price_per_vote_minor.ok_or_else(|| {
            AppError::Internal(format!("Paid event {} has no price_per_vote", event.id))
        })?;
        let amount_minor = charge_amount(price_minor, input.quantity)?;

        let phone_number = input.phone_number.trim().to_string();
        let request = ChargeRequest {
            email: format!("{phone_number}@{}", self.customer_email_domain),
            amount_minor,
            phone_number: phone_number.clone(),
            provider,
            metadata: ChargeMetadata {
                contestant_id: contestant.id,
                quantity: input.quantity,
                phone_number,
                provider: provider.as_str().to_string(),
            },
            callback_url: self.callback_url.clone(),
        };

        let authorization = self.gateway.initialize(&request).await?;

        info!(
            reference = %authorization.reference,
            contestant_id = contestant.id,
            quantity = input.quantity,
            amount_minor,
            provider = %provider,
            "Payment initiated"
        );

        Ok(PaymentInitiation {
            payment_url: authorization.authorization_url,
            reference: authorization.reference,
        })
    }

    /// Turn a successful processor transaction into a vote and a payment.
    ///
    /// Safe to call any number of times for the same reference: only the
    /// first successful call records anything, later ones return that
    /// record with `already_processed` set.
    pub async fn verify(
        &self,
        reference: Option<&str>,
        voter_ip: Option<IpAddr>,
    ) -> AppResult<VerifiedVote> {
        let reference = reference
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(AppError::MissingReference)?;

        if let Some(existing) = self.payment_repo.find_by_reference(reference).await? {
            debug!(reference, "Reference already processed");
            return self.processed(existing).await;
        }

        let transaction = self.gateway.verify(reference).await?;
        if !transaction.is_success() {
            info!(reference, status = %transaction.status, "Payment not completed");
            return Err(AppError::PaymentNotCompleted {
                reference: reference.to_string(),
                status: transaction.status,
            });
        }

        let metadata = transaction.charge_metadata()?;
        let provider: PaymentProvider = metadata.provider.parse()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if let Some(existing) = PaymentRepository::find_by_reference_in(&txn, reference).await? {
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return self.processed(existing).await;
        }

        let contestant = ContestantRepository::find_by_id_in(&txn, metadata.contestant_id)
            .await?
            .ok_or_else(|| AppError::ContestantNotFound(metadata.contestant_id.to_string()))?;

        let price_per_vote_minor = EventRepository::find_by_id_in(&txn, contestant.event_id)
            .await?
            .and_then(|event| event.price_per_vote_minor);
        if let Some(price_minor) = price_per_vote_minor
            && charge_amount(price_minor, metadata.quantity).ok() != Some(transaction.amount_minor)
        {
            warn!(
                reference,
                amount_minor = transaction.amount_minor,
                price_minor,
                quantity = metadata.quantity,
                "Processor amount differs from the event price"
            );
        }

        let vote = VoteRecorder::record_in(
            &txn,
            contestant.id,
            metadata.quantity,
            voter_ip.map(|ip| ip.to_string()),
            VoteKind::Paid,
        )
        .await?;

        let now = Utc::now();
        let inserted = PaymentRepository::insert(
            &txn,
            payment::ActiveModel {
                vote_id: Set(vote.id),
                amount_minor: Set(transaction.amount_minor),
                quantity: Set(metadata.quantity),
                reference: Set(reference.to_string()),
                status: Set(transaction.status.clone()),
                phone_number: Set(metadata.phone_number.clone()),
                provider: Set(provider),
                paid_at: Set(Some(transaction.paid_at.unwrap_or(now).into())),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            },
        )
        .await;

        let payment = match inserted {
            Ok(payment) => payment,
            Err(AppError::Conflict(_)) => {
                // A concurrent verify won the race; drop our vote with the txn.
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                let existing = self.payment_repo.get_by_reference(reference).await?;
                return self.processed(existing).await;
            }
            Err(e) => return Err(e),
        };

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            reference,
            contestant_id = contestant.id,
            quantity = vote.quantity,
            amount = %from_minor_units(payment.amount_minor),
            "Paid vote recorded"
        );

        Ok(VerifiedVote {
            vote,
            payment,
            already_processed: false,
            price_per_vote_minor,
        })
    }

    /// Look up a recorded payment. Only the event's organizer may see it.
    pub async fn get_payment(
        &self,
        organizer: &Organizer,
        reference: &str,
    ) -> AppResult<payment::Model> {
        let payment = self.payment_repo.get_by_reference(reference).await?;
        let vote = self
            .vote_repo
            .find_by_id(payment.vote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vote {}", payment.vote_id)))?;
        let contestant = self.contestant_repo.get_by_id(vote.contestant_id).await?;
        let event = self.event_repo.get_by_id(contestant.event_id).await?;

        if !organizer.owns(&event.organizer_id) {
            return Err(AppError::Forbidden("Not the event owner".to_string()));
        }
        Ok(payment)
    }

    /// Handle a signed processor webhook.
    ///
    /// The pushed body is only used for its reference; the transaction is
    /// re-verified with the processor. Returns `None` for ignored events.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> AppResult<Option<VerifiedVote>> {
        let signature = signature.ok_or(AppError::Unauthorized)?;
        if !self.gateway.verify_webhook_signature(payload, signature) {
            warn!("Webhook signature mismatch");
            return Err(AppError::Unauthorized);
        }

        let event: WebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook body: {e}")))?;

        if event.event != CHARGE_SUCCESS_EVENT {
            debug!(event = %event.event, "Ignoring webhook event");
            return Ok(None);
        }

        self.verify(Some(&event.data.reference), None).await.map(Some)
    }

    async fn processed(&self, payment: payment::Model) -> AppResult<VerifiedVote> {
        let vote = self
            .vote_repo
            .find_by_id(payment.vote_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vote {}", payment.vote_id)))?;

        let price_per_vote_minor = match self.contestant_repo.find_by_id(vote.contestant_id).await? {
            Some(contestant) => self
                .event_repo
                .find_by_id(contestant.event_id)
                .await?
                .and_then(|event| event.price_per_vote_minor),
            None => None,
        };

        Ok(VerifiedVote {
            vote,
            payment,
            already_processed: true,
            price_per_vote_minor,
        })
    }
}
