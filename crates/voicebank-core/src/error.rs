//! Error types module
//!
//! All failures surfaced by the clip pipeline are unified under [`AppError`].
//! Each variant carries its HTTP mapping and machine-readable code through
//! the [`ErrorMetadata`] trait so the API layer can render responses and
//! emit deduplicatable diagnostics without matching on variants.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the
//! `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like duplicate uploads
    Debug,
    /// Warning level - for rejected but well-formed input
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "MISSING_PARAM"). Doubles as the
    /// diagnostic fingerprint component for operator-side deduplication.
    fn error_code(&self) -> &'static str;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("sentence not found")]
    SentenceNotFound,

    #[error("clip not found")]
    ClipNotFound,

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("transcoder failed: {0}")]
    Transcode(String),

    #[error("error saving audio file: {0}")]
    FileSave(String),

    /// Post-transcode rejection (duration out of bounds). Surfaced to the
    /// caller with the same code as a persistence failure.
    #[error("{0}")]
    ClipValidation(String),

    #[cfg(feature = "sqlx")]
    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::MissingParameter(_) => 400,
            AppError::SentenceNotFound | AppError::ClipNotFound => 422,
            AppError::AlreadyExists(_) => 204,
            AppError::Transcode(_)
            | AppError::FileSave(_)
            | AppError::ClipValidation(_)
            | AppError::Database(_)
            | AppError::Internal(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingParameter(_) => "MISSING_PARAM",
            AppError::SentenceNotFound => "SENTENCE_NOT_FOUND",
            AppError::ClipNotFound => "CLIP_NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::Transcode(_) => "ffmpeg",
            AppError::FileSave(_) => "AUDIO_FILE_NOT_SAVED",
            AppError::ClipValidation(_) | AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::AlreadyExists(_) => LogLevel::Debug,
            AppError::MissingParameter(_)
            | AppError::SentenceNotFound
            | AppError::ClipNotFound
            | AppError::ClipValidation(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    fn client_message(&self) -> String {
        match self {
            // Never leak query/connection details to the client.
            AppError::Database(_) => "Error saving clip to database".to_string(),
            AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_failure_table() {
        assert_eq!(AppError::MissingParameter("sentence_id").http_status_code(), 400);
        assert_eq!(AppError::SentenceNotFound.http_status_code(), 422);
        assert_eq!(AppError::ClipNotFound.http_status_code(), 422);
        assert_eq!(AppError::AlreadyExists("x.mp3".into()).http_status_code(), 204);
        assert_eq!(AppError::Transcode("boom".into()).http_status_code(), 500);
        assert_eq!(AppError::FileSave("disk full".into()).http_status_code(), 500);
        assert_eq!(AppError::ClipValidation("bad length".into()).http_status_code(), 500);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppError::MissingParameter("client_id").error_code(), "MISSING_PARAM");
        assert_eq!(AppError::SentenceNotFound.error_code(), "SENTENCE_NOT_FOUND");
        assert_eq!(AppError::AlreadyExists("x".into()).error_code(), "ALREADY_EXISTS");
        assert_eq!(AppError::FileSave("e".into()).error_code(), "AUDIO_FILE_NOT_SAVED");
        assert_eq!(AppError::ClipValidation("e".into()).error_code(), "DATABASE_ERROR");
        assert_eq!(AppError::Transcode("e".into()).error_code(), "ffmpeg");
    }

    #[test]
    fn database_details_are_hidden_from_clients() {
        #[cfg(feature = "sqlx")]
        let err = AppError::Database(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".into());
        assert_eq!(err.client_message(), "Error saving clip to database");
    }
}
