//! Shared key generation for clip storage.
//!
//! Key format: `{client_id}/{sentence_id}.mp3`. The path doubles as the
//! clip's persisted `path` column, so all backends and the read path must
//! use this exact formula.

/// Storage key for a clip identified by `(client_id, sentence_id)`.
pub fn clip_key(client_id: &str, sentence_id: &str) -> String {
    format!("{}/{}.mp3", client_id, sentence_id)
}
