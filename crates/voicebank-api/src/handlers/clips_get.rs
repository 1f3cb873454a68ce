//! Random-clip sampling endpoint.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use voicebank_core::models::ClipCandidate;
use voicebank_core::AppError;

use crate::error::HttpAppError;
use crate::handlers::header_string;
use crate::services::sampler::ClipSampler;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RandomClipsQuery {
    pub count: Option<usize>,
}

/// Serve a batch of clips the caller may listen to and validate. May
/// return fewer than `count`; clients must handle short results.
#[utoipa::path(
    get,
    path = "/api/v1/{locale}/clips",
    tag = "clips",
    params(
        ("locale" = String, Path, description = "Locale to sample from"),
        ("count" = Option<usize>, Query, description = "Requested batch size (default 1)"),
        ("client_id" = String, Header, description = "Requesting client; own clips are excluded")
    ),
    responses(
        (status = 200, description = "Sampled clips", body = [ClipCandidate]),
        (status = 400, description = "Missing client_id", body = crate::error::ErrorResponse),
        (status = 500, description = "Eligibility query failure", body = crate::error::ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(locale = %locale))]
pub async fn serve_random_clips(
    State(state): State<Arc<AppState>>,
    Path(locale): Path<String>,
    Query(query): Query<RandomClipsQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<ClipCandidate>>, HttpAppError> {
    let client_id = header_string(&headers, "client_id")
        .ok_or(AppError::MissingParameter("client_id"))
        .map_err(HttpAppError::from)?;
    let count = query.count.unwrap_or(1);

    let clips = ClipSampler::new(&state)
        .get_random_clips(&client_id, &locale, count)
        .await
        .map_err(HttpAppError::from)?;

    Ok(Json(clips))
}
