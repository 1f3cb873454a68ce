//! Vote submission endpoint.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use voicebank_core::models::VoteOutcome;
use voicebank_core::ChallengeToken;

use crate::error::{save_error_response, SaveOp};
use crate::handlers::header_string;
use crate::services::ingest::{ClipIngest, VoteSubmission};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub is_valid: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub challenge: Option<String>,
}

/// Record a validation vote on a clip.
#[utoipa::path(
    post,
    path = "/api/v1/{locale}/clips/{clip_id}/votes",
    tag = "clips",
    params(
        ("locale" = String, Path, description = "Locale the clip belongs to"),
        ("clip_id" = i64, Path, description = "Clip being voted on"),
        ("client_id" = String, Header, description = "Voting client")
    ),
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote persisted", body = VoteOutcome),
        (status = 400, description = "Missing client_id", body = String),
        (status = 422, description = "Clip not found", body = String),
        (status = 500, description = "Persistence failure", body = String)
    )
)]
#[tracing::instrument(skip_all, fields(locale = %locale, clip_id))]
pub async fn save_clip_vote(
    State(state): State<Arc<AppState>>,
    Path((locale, clip_id)): Path<(String, i64)>,
    headers: HeaderMap,
    Json(body): Json<VoteRequest>,
) -> Response {
    let vote = VoteSubmission {
        clip_id,
        client_id: header_string(&headers, "client_id"),
        is_valid: body.is_valid,
        comment: body.comment,
        challenge: ChallengeToken::parse(body.challenge.as_deref()),
    };

    match ClipIngest::new(&state).save_vote(vote).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => save_error_response(SaveOp::Vote, &err),
    }
}
