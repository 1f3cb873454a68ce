//! Shared constants.

/// Shortest clip accepted for persistence, in milliseconds.
pub const MIN_CLIP_DURATION_MS: f64 = 1000.0;

/// Longest clip accepted for persistence, in milliseconds.
pub const MAX_CLIP_DURATION_MS: f64 = 15_000.0;

/// The sampler requests `ceil(count * OVERFETCH)` candidates to absorb
/// broken entries.
pub const SAMPLER_OVERFETCH: f64 = 1.5;

/// Source label recorded when the uploader does not identify itself.
pub const DEFAULT_CLIP_SOURCE: &str = "unidentified";

/// Canonical extension for persisted clips. Downstream URL derivation
/// strips exactly this suffix to build a clip's glob.
pub const CLIP_EXTENSION: &str = ".mp3";

/// Target sample rate for normalized clips.
pub const CLIP_SAMPLE_RATE: u32 = 32_000;

/// Normalized clips are mono.
pub const CLIP_CHANNELS: u32 = 1;
