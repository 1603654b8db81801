//! API integration tests.
//!
//! The router runs against a migrated in-memory database and a scripted
//! payment processor.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::from_fn_with_state,
};
use chrono::{Duration, Utc};
use evote_api::{AppState, auth_middleware, router as api_router};
use evote_common::config::{AuthConfig, Config, DatabaseConfig, PaymentConfig, ServerConfig};
use evote_common::{AppError, AppResult};
use evote_core::{ChargeAuthorization, ChargeRequest, PaymentGateway, VerifiedTransaction};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;

const JWT_SECRET: &str = "test-jwt-secret";

/// Processor that approves every charge it created.
struct ApprovingGateway;

#[async_trait]
impl PaymentGateway for ApprovingGateway {
    async fn initialize(&self, request: &ChargeRequest) -> AppResult<ChargeAuthorization> {
        Ok(ChargeAuthorization {
            authorization_url: "https://checkout.test/1".to_string(),
            reference: format!("txn_{}_{}", request.metadata.contestant_id, request.amount_minor),
        })
    }

    async fn verify(&self, reference: &str) -> AppResult<VerifiedTransaction> {
        let mut parts = reference.split('_').skip(1);
        let (Some(contestant_id), Some(amount)) = (parts.next(), parts.next()) else {
            return Err(AppError::VerificationFailed("Transaction reference not found".to_string()));
        };
        let amount_minor: i64 = amount.parse().unwrap();
        Ok(VerifiedTransaction {
            reference: reference.to_string(),
            status: "success".to_string(),
            amount_minor,
            paid_at: Some(Utc::now()),
            metadata: json!({
                "contestant_id": contestant_id,
                "quantity": amount_minor / 200,
                "phone_number": "0551234567",
                "provider": "mtn",
            }),
        })
    }

    fn verify_webhook_signature(&self, _payload: &[u8], signature: &str) -> bool {
        signature == "good"
    }
}

fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        payment: PaymentConfig {
            base_url: "https://processor.test".to_string(),
            secret_key: "sk_test".to_string(),
            timeout_secs: 5,
            customer_email_domain: "voters.evote.local".to_string(),
            callback_url: None,
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.to_string(),
            issuer: None,
        },
    }
}

async fn create_test_router() -> Router {
    let db = Arc::new(evote_db::test_utils::in_memory().await.unwrap());
    let state = AppState::new(db, Arc::new(ApprovingGateway), &create_test_config());

    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn token(sub: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": sub, "exp": (Utc::now() + Duration::hours(1)).timestamp() }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", "41.66.1.10, 10.0.0.1");
    if let Some(sub) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(sub)));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create_event(app: &Router, vote_type: &str, price: Option<&str>) -> i64 {
    let start = Utc::now() - Duration::hours(1);
    let (status, body) = send(
        app,
        "POST",
        "/events",
        Some("organizer1"),
        Some(json!({
            "name": "Campus Awards",
            "start_date": start,
            "end_date": start + Duration::days(2),
            "vote_type": vote_type,
            "max_votes_per_user": 3,
            "price_per_vote": price,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["event"]["id"].as_i64().unwrap()
}

async fn create_contestant(app: &Router, event_id: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/contestants",
        Some("organizer1"),
        Some(json!({ "event_id": event_id, "name": "Ama Mensah" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["contestant"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_router().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router().await;
    let (status, _) = send(&app, "GET", "/nonexistent", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_event_requires_auth() {
    let app = create_test_router().await;
    let (status, _) = send(&app, "POST", "/events", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_lifecycle() {
    let app = create_test_router().await;
    let event_id = create_event(&app, "paid", Some("2.00")).await;
    create_contestant(&app, event_id).await;

    let (status, body) = send(&app, "GET", &format!("/events/{event_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event retrieved successfully.");
    assert_eq!(body["event"]["price_per_vote"], "2.00");
    assert_eq!(body["event"]["contestants"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/events", Some("organizer1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);
    assert_eq!(body["events"][0]["id"], event_id);
    assert_eq!(body["events"][0]["contestants"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/events/{event_id}"),
        Some("intruder"),
        Some(json!({ "name": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/events/{event_id}"),
        Some("organizer1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/events/{event_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn test_paid_event_without_price_is_rejected() {
    let app = create_test_router().await;
    let start = Utc::now();
    let (status, body) = send(
        &app,
        "POST",
        "/events",
        Some("organizer1"),
        Some(json!({
            "name": "Campus Awards",
            "start_date": start,
            "end_date": start + Duration::days(2),
            "vote_type": "paid",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_free_vote_once_per_address() {
    let app = create_test_router().await;
    let event_id = create_event(&app, "free", None).await;
    let contestant_id = create_contestant(&app, event_id).await;
    let uri = format!("/votes/{contestant_id}");

    let (status, body) = send(&app, "POST", &uri, None, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["vote"]["contestant"], contestant_id);
    assert_eq!(body["vote"]["quantity"], 1);
    assert_eq!(body["vote"]["total_amount"], "0.00");

    let (status, body) = send(&app, "POST", &uri, None, Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_VOTE");

    let (_, body) = send(&app, "GET", &format!("/contestants/{contestant_id}"), None, None).await;
    assert_eq!(body["contestant"]["vote_count"], 1);
}

#[tokio::test]
async fn test_payment_flow() {
    let app = create_test_router().await;
    let event_id = create_event(&app, "paid", Some("2.00")).await;
    let contestant_id = create_contestant(&app, event_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/payments/init",
        None,
        Some(json!({
            "phone_number": "0551234567",
            "contestant_id": contestant_id,
            "quantity": 3,
            "provider": "mtn",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["payment_url"], "https://checkout.test/1");
    let reference = body["reference"].as_str().unwrap().to_string();
    assert_eq!(reference, format!("txn_{contestant_id}_600"));

    let (status, body) = send(
        &app,
        "POST",
        "/payments/verify",
        None,
        Some(json!({ "reference": reference })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["vote"]["contestant"], contestant_id);
    assert_eq!(body["vote"]["quantity"], 3);
    assert_eq!(body["vote"]["total_amount"], "6.00");
    assert_eq!(body["payment"]["amount"], "6.00");
    assert_eq!(body["already_processed"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/payments/verify",
        None,
        Some(json!({ "reference": reference })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_processed"], true);

    let (_, body) = send(&app, "GET", &format!("/contestants/{contestant_id}"), None, None).await;
    assert_eq!(body["contestant"]["vote_count"], 3);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/payments/{reference}"),
        Some("organizer1"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment"]["provider"], "mtn");
}

#[tokio::test]
async fn test_verify_without_reference() {
    let app = create_test_router().await;
    let (status, body) = send(&app, "POST", "/payments/verify", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_REFERENCE");
}

#[tokio::test]
async fn test_unsupported_provider() {
    let app = create_test_router().await;
    let event_id = create_event(&app, "paid", Some("2.00")).await;
    let contestant_id = create_contestant(&app, event_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/payments/init",
        None,
        Some(json!({
            "phone_number": "0551234567",
            "contestant_id": contestant_id,
            "quantity": 1,
            "provider": "glo",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_PROVIDER");
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let app = create_test_router().await;
    let request = Request::builder()
        .method("POST")
        .uri("/payments/webhook")
        .header("x-paystack-signature", "forged")
        .body(Body::from(r#"{"event":"charge.success","data":{"reference":"txn_1_200"}}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
