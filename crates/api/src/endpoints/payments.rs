//! Payment endpoints.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use evote_common::AppResult;
use evote_core::{InitiatePaymentInput, PaymentInitiation, PaymentResponse, VerifiedVoteResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    extractors::{AuthOrganizer, ClientIp},
    middleware::AppState,
    response::ApiResponse,
};

/// Header carrying the processor's HMAC of a webhook body.
const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Verify payment request.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Serialize)]
struct PaymentBody {
    payment: PaymentResponse,
}

async fn initiate(
    State(state): State<AppState>,
    Json(req): Json<InitiatePaymentInput>,
) -> AppResult<ApiResponse<PaymentInitiation>> {
    let initiation = state.payment_service.initiate(req).await?;
    Ok(ApiResponse::ok("Payment initiated.", initiation))
}

async fn verify(
    State(state): State<AppState>,
    ClientIp(voter_ip): ClientIp,
    Json(req): Json<VerifyPaymentRequest>,
) -> AppResult<ApiResponse<VerifiedVoteResponse>> {
    let verified = state
        .payment_service
        .verify(req.reference.as_deref(), voter_ip)
        .await?;

    let message = if verified.already_processed {
        "Payment already processed."
    } else {
        "Payment verified and vote recorded."
    };
    Ok(ApiResponse::ok(message, verified.into()))
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = state.payment_service.handle_webhook(&body, signature).await?;
    Ok(Json(json!({ "received": true, "recorded": outcome.is_some() })))
}

async fn show(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<ApiResponse<PaymentBody>> {
    let payment = state
        .payment_service
        .get_payment(&organizer, &reference)
        .await?;

    Ok(ApiResponse::ok(
        "Payment retrieved successfully.",
        PaymentBody {
            payment: payment.into(),
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/init", post(initiate))
        .route("/verify", post(verify))
        .route("/webhook", post(webhook))
        .route("/{reference}", get(show))
}
