//! API endpoints.

mod contestants;
mod events;
mod payments;
mod votes;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/events", events::router())
        .nest("/contestants", contestants::router())
        .nest("/votes", votes::router())
        .nest("/payments", payments::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
