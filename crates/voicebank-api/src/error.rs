//! HTTP error response conversion
//!
//! Two error surfaces coexist here. Read paths return the JSON
//! [`ErrorResponse`] via [`HttpAppError`] (a newtype because of Rust's
//! orphan rules: IntoResponse is external and AppError lives in
//! voicebank-core). The clip/vote save paths return the frontend's
//! expected plain-text body `save_<op>_error: <code>: <message>` via
//! [`save_error_response`], which also emits the structured diagnostic
//! event.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use voicebank_core::{AppError, ErrorMetadata, LogLevel};

use crate::telemetry::save_error_event;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for AppError to implement IntoResponse.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, "request rejected"),
        LogLevel::Warn => tracing::warn!(error = %error, "request rejected"),
        LogLevel::Error => tracing::error!(error = %error, "request failed"),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
            code: app_error.error_code().to_string(),
        });

        (status, body).into_response()
    }
}

/// Which save state machine produced the error.
#[derive(Debug, Clone, Copy)]
pub enum SaveOp {
    Clip,
    Vote,
}

impl SaveOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveOp::Clip => "clip",
            SaveOp::Vote => "vote",
        }
    }
}

/// Render a save failure as the plain-text body the recording frontend
/// parses, and emit the fingerprinted diagnostic event.
pub fn save_error_response(op: SaveOp, error: &AppError) -> Response {
    let status_code = error.http_status_code();
    let status =
        StatusCode::from_u16(status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = error.client_message();
    let body = format!(
        "save_{}_error: {}: {}",
        op.as_str(),
        error.error_code(),
        message
    );

    save_error_event(
        op.as_str(),
        error.error_code(),
        &message,
        status_code,
        error.log_level(),
    );

    (status, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn save_error_body_is_the_parseable_triple() {
        let err = AppError::MissingParameter("sentence_id");
        let response = save_error_response(SaveOp::Clip, &err);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            "save_clip_error: MISSING_PARAM: missing parameter: sentence_id"
        );
    }

    #[tokio::test]
    async fn vote_errors_use_the_vote_prefix() {
        let err = AppError::ClipNotFound;
        let response = save_error_response(SaveOp::Vote, &err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_text(response).await,
            "save_vote_error: CLIP_NOT_FOUND: clip not found"
        );
    }

    #[tokio::test]
    async fn json_errors_carry_the_code() {
        let response = HttpAppError(AppError::MissingParameter("client_id")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value =
            serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["code"], "MISSING_PARAM");
    }
}
