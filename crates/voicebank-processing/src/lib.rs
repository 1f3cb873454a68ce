//! Voicebank Processing Library
//!
//! The clip ingestion pipeline's stream stages: input adaptation for
//! non-seekable containers, the external transcode stage with its dual-sink
//! fan-out, and MP3 duration analysis of the accumulated output.

pub mod duration;
pub mod input;
pub mod transcode;

pub use duration::{check_clip_duration, mp3_duration_ms, DurationError};
pub use input::{select_input, ByteStream, InputKind, TranscodeInput};
pub use transcode::{FfmpegTranscoder, TranscodeError, TranscodeOutput, TranscodePipeline};
