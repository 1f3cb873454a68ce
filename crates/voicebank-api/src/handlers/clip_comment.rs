//! Clip comment endpoint.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use voicebank_core::AppError;

use crate::error::{save_error_response, SaveOp};
use crate::handlers::header_string;
use crate::services::ingest::ClipIngest;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub comment: String,
}

/// Attach a free-text comment to the clip recorded for a sentence. The
/// sentence is addressed by header; the path's clip id is legacy routing.
#[utoipa::path(
    post,
    path = "/api/v1/{locale}/clips/{clip_id}/comment",
    tag = "clips",
    params(
        ("locale" = String, Path, description = "Locale the clip belongs to"),
        ("client_id" = String, Header, description = "Commenting client"),
        ("sentence_id" = String, Header, description = "Sentence whose clip is commented on")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment persisted"),
        (status = 400, description = "Missing client_id or sentence_id", body = String),
        (status = 422, description = "Sentence has no clip", body = String),
        (status = 500, description = "Persistence failure")
    )
)]
#[tracing::instrument(skip_all, fields(locale = %locale))]
pub async fn save_comment(
    State(state): State<Arc<AppState>>,
    Path((locale, _clip_id)): Path<(String, i64)>,
    headers: HeaderMap,
    Json(body): Json<CommentRequest>,
) -> Response {
    let client_id = header_string(&headers, "client_id");
    let sentence_id = header_string(&headers, "sentence_id");

    match ClipIngest::new(&state)
        .save_comment(client_id.as_deref(), sentence_id.as_deref(), &body.comment)
        .await
    {
        Ok(success) => Json(serde_json::json!({ "success": success })).into_response(),
        Err(err @ (AppError::MissingParameter(_) | AppError::ClipNotFound)) => {
            save_error_response(SaveOp::Clip, &err)
        }
        Err(err) => {
            tracing::error!(error = %err, "comment save failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to save comment" })),
            )
                .into_response()
        }
    }
}
