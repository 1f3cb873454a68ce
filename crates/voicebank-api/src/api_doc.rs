//! OpenAPI document for the clip API.

use axum::Json;
use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::clip_comment::CommentRequest;
use crate::handlers::clip_vote::VoteRequest;
use voicebank_core::models::{
    ChallengeFlags, ClipCandidate, SampledSentence, UploadOutcome, VoteOutcome,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::clip_upload::save_clip,
        crate::handlers::clip_vote::save_clip_vote,
        crate::handlers::clip_comment::save_comment,
        crate::handlers::clips_get::serve_random_clips,
    ),
    components(schemas(
        UploadOutcome,
        VoteOutcome,
        ChallengeFlags,
        ClipCandidate,
        SampledSentence,
        VoteRequest,
        CommentRequest,
        ErrorResponse,
    )),
    tags(
        (name = "clips", description = "Clip recording, validation, and sampling")
    )
)]
pub struct ApiDoc;

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
