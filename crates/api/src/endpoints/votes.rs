//! Free vote endpoint.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use evote_common::AppResult;
use evote_core::VoteResponse;
use serde::{Deserialize, Serialize};

use crate::{extractors::ClientIp, middleware::AppState, response::ApiResponse};

const fn default_quantity() -> i32 {
    1
}

/// Cast vote request.
#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Serialize)]
struct VoteBody {
    vote: VoteResponse,
}

async fn cast(
    State(state): State<AppState>,
    ClientIp(voter_ip): ClientIp,
    Path(contestant_id): Path<i64>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteBody>> {
    let vote = state
        .vote_recorder
        .record_vote(contestant_id, req.quantity, voter_ip)
        .await?;

    // Only free events reach this path, so the vote carries no charge.
    Ok(ApiResponse::created(
        "Vote cast successfully.",
        VoteBody {
            vote: VoteResponse::new(vote, None),
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{contestant_id}", post(cast))
}
