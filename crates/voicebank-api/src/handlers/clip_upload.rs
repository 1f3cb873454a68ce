//! Clip upload endpoint.

use axum::{
    extract::{Path, Request, State},
    http::header::CONTENT_LENGTH,
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;

use voicebank_core::models::UploadOutcome;
use voicebank_core::ChallengeToken;

use crate::error::{save_error_response, SaveOp};
use crate::handlers::header_string;
use crate::services::ingest::{ClipIngest, UploadRequest};
use crate::state::AppState;

/// Save the raw request body as an audio clip.
///
/// Errors are returned as plain text of the form
/// `save_clip_error: <code>: <message>` so the recording frontend can parse
/// them apart from other failures.
#[utoipa::path(
    post,
    path = "/api/v1/{locale}/clips",
    tag = "clips",
    params(
        ("locale" = String, Path, description = "Locale the contribution belongs to"),
        ("client_id" = String, Header, description = "Contributing client"),
        ("sentence_id" = String, Header, description = "Sentence being recorded"),
        ("source" = Option<String>, Header, description = "Recording surface label"),
        ("challenge" = Option<String>, Header, description = "Challenge campaign token")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Clip transcoded and persisted", body = UploadOutcome),
        (status = 400, description = "Missing client_id or sentence_id", body = String),
        (status = 204, description = "Clip already exists for this pair"),
        (status = 422, description = "Sentence not found", body = String),
        (status = 500, description = "Transcode, file-save, or persistence failure", body = String)
    )
)]
#[tracing::instrument(skip_all, fields(locale = %locale))]
pub async fn save_clip(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
    request: Request,
) -> Response {
    let headers = request.headers();

    let client_id = header_string(headers, "client_id");
    let sentence_id = header_string(headers, "sentence_id");
    let source = header_string(headers, "source");
    let content_type = header_string(headers, "content-type");
    let challenge = ChallengeToken::parse(header_string(headers, "challenge").as_deref());
    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());

    let body = request
        .into_body()
        .into_data_stream()
        .map_err(std::io::Error::other)
        .boxed();

    let upload = UploadRequest {
        client_id,
        sentence_id,
        source,
        content_type,
        content_length,
        challenge,
        body,
    };

    match ClipIngest::new(&state).save_clip(upload).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(err) => save_error_response(SaveOp::Clip, &err),
    }
}
