//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use evote_common::Config;
use evote_core::{
    AuthService, ContestantService, EventService, PaymentGateway, PaymentService, VoteRecorder,
};
use evote_db::repositories::{ContestantRepository, EventRepository};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub contestant_service: ContestantService,
    pub vote_recorder: VoteRecorder,
    pub payment_service: PaymentService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        config: &Config,
    ) -> Self {
        let event_repo = EventRepository::new(Arc::clone(&db));
        let contestant_repo = ContestantRepository::new(Arc::clone(&db));

        Self {
            auth_service: AuthService::new(&config.auth),
            event_service: EventService::new(event_repo.clone(), contestant_repo.clone()),
            contestant_service: ContestantService::new(contestant_repo, event_repo),
            vote_recorder: VoteRecorder::new(Arc::clone(&db)),
            payment_service: PaymentService::new(db, gateway, &config.payment),
        }
    }
}

/// Authentication middleware.
///
/// A valid bearer token attaches the [`evote_core::Organizer`] to the
/// request; anything else passes through anonymously and is rejected by
/// handlers that require an organizer.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.auth_service.authenticate(token.trim()) {
            Ok(organizer) => {
                req.extensions_mut().insert(organizer);
            }
            Err(_) => tracing::debug!("Ignoring invalid bearer token"),
        }
    }

    next.run(req).await
}
