//! Contestant endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use evote_common::AppResult;
use evote_core::{ContestantResponse, CreateContestantInput, UpdateContestantInput};
use serde::Serialize;

use crate::{
    extractors::AuthOrganizer,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

#[derive(Serialize)]
struct ContestantBody {
    contestant: ContestantResponse,
}

async fn create(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Json(req): Json<CreateContestantInput>,
) -> AppResult<ApiResponse<ContestantBody>> {
    let contestant = state.contestant_service.create(&organizer, req).await?;

    Ok(ApiResponse::created(
        "Contestant added successfully.",
        ContestantBody {
            contestant: contestant.into(),
        },
    ))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ContestantBody>> {
    let contestant = state.contestant_service.get(id).await?;

    Ok(ApiResponse::ok(
        "Contestant retrieved successfully.",
        ContestantBody {
            contestant: contestant.into(),
        },
    ))
}

async fn update(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateContestantInput>,
) -> AppResult<ApiResponse<ContestantBody>> {
    let contestant = state.contestant_service.update(&organizer, id, req).await?;

    Ok(ApiResponse::ok(
        "Contestant updated successfully.",
        ContestantBody {
            contestant: contestant.into(),
        },
    ))
}

async fn delete(
    AuthOrganizer(organizer): AuthOrganizer,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    state.contestant_service.delete(&organizer, id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", get(show).patch(update).delete(delete))
}
