//! Clip duration analysis.
//!
//! Duration is unknowable until the whole stream has been transcoded, so
//! the pipeline accumulates the encoded MP3 bytes in memory and measures
//! them here after the durable write completes. Acceptance is therefore a
//! post-hoc check with rollback, not a pre-check.

use std::io::Cursor;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use voicebank_core::constants::{MAX_CLIP_DURATION_MS, MIN_CLIP_DURATION_MS};

#[derive(Debug, thiserror::Error)]
pub enum DurationError {
    #[error("unreadable audio data: {0}")]
    Unreadable(String),

    #[error("Bad clip length: {0}")]
    OutOfBounds(f64),
}

/// Measure the duration of an encoded MP3 buffer in milliseconds by
/// summing packet durations over the whole stream.
pub fn mp3_duration_ms(data: &[u8]) -> Result<f64, DurationError> {
    let source = MediaSourceStream::new(
        Box::new(Cursor::new(data.to_vec())),
        MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    hint.with_extension("mp3");
    hint.mime_type("audio/mpeg");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DurationError::Unreadable(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DurationError::Unreadable("no audio track".to_string()))?;
    let track_id = track.id;
    let time_base = track
        .codec_params
        .time_base
        .ok_or_else(|| DurationError::Unreadable("no time base".to_string()))?;

    let mut total = 0u64;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    total += packet.dur;
                }
            }
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DurationError::Unreadable(e.to_string())),
        }
    }

    let time = time_base.calc_time(total);
    Ok((time.seconds as f64 + time.frac) * 1000.0)
}

/// Enforce the clip acceptance window.
pub fn check_clip_duration(duration_ms: f64) -> Result<f64, DurationError> {
    if !(MIN_CLIP_DURATION_MS..=MAX_CLIP_DURATION_MS).contains(&duration_ms) {
        return Err(DurationError::OutOfBounds(duration_ms));
    }
    Ok(duration_ms)
}
