//! Voicebank Storage Library
//!
//! Storage abstraction for persisted clips. The [`Storage`] trait exposes a
//! streaming writer (the transcode pipeline emits bytes chunk by chunk) plus
//! delete/exists/url; [`LocalStorage`] is the filesystem backend.
//!
//! # Key format
//!
//! Clip keys are `{client_id}/{sentence_id}.mp3`, bit-exact, since the
//! frontend derives playback URLs from the stored path. Key generation is
//! centralized in the `keys` module. Keys must not contain `..` or a
//! leading `/`.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::clip_key;
pub use local::LocalStorage;
pub use traits::{ClipWriter, Storage, StorageError, StorageResult};
