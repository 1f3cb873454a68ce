pub mod clip_comment;
pub mod clip_upload;
pub mod clip_vote;
pub mod clips_get;

use axum::http::HeaderMap;

/// Read a header as an owned string, treating unparseable values as absent.
pub(crate) fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
