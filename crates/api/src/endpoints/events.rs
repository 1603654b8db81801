//! Event endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use evote_common::AppResult;
use evote_core::{
    ContestantResponse, CreateEventInput, EventDetailResponse, EventResponse, UpdateEventInput,
};
use serde::Serialize;

use crate::{
    extractors::AuthOrganizer,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

#[derive(Serialize)]
struct EventBody<T> {
    event: T,
}

#[derive(Serialize)]
struct EventsBody {
    events: Vec<EventDetailResponse>,
}

#[derive(Serialize)]
struct ContestantsBody {
    contestants: Vec<ContestantResponse>,
}

async fn create(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Json(req): Json<CreateEventInput>,
) -> AppResult<ApiResponse<EventBody<EventResponse>>> {
    let event = state.event_service.create(&organizer, req).await?;

    Ok(ApiResponse::created(
        "Event created successfully.",
        EventBody {
            event: event.into(),
        },
    ))
}

async fn list(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<EventsBody>> {
    let events = state.event_service.list(&organizer).await?;

    Ok(ApiResponse::ok(
        "Events retrieved successfully.",
        EventsBody { events },
    ))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<EventBody<EventDetailResponse>>> {
    let event = state.event_service.get(id).await?;

    Ok(ApiResponse::ok(
        "Event retrieved successfully.",
        EventBody { event },
    ))
}

async fn update(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateEventInput>,
) -> AppResult<ApiResponse<EventBody<EventResponse>>> {
    let event = state.event_service.update(&organizer, id, req).await?;

    Ok(ApiResponse::ok(
        "Event updated successfully.",
        EventBody {
            event: event.into(),
        },
    ))
}

async fn delete(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.event_service.delete(&organizer, id).await?;
    Ok(no_content())
}

async fn contestants(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ContestantsBody>> {
    let contestants = state.contestant_service.list_by_event(id).await?;

    Ok(ApiResponse::ok(
        "Contestants retrieved successfully.",
        ContestantsBody {
            contestants: contestants.into_iter().map(Into::into).collect(),
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/{id}/contestants", get(contestants))
}
