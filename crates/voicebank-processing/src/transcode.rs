//! External transcode stage with dual-sink fan-out.
//!
//! One ffmpeg process per upload converts whatever arrives into the
//! normalized clip format (MP3, mono, 32kHz). Its stdout is consumed by a
//! single read loop that forwards every chunk to the durable sink and to an
//! in-memory accumulator, so both sinks observe the identical byte
//! sequence. The process carries `kill_on_drop`, so abandoning the pipeline
//! mid-request tears the subprocess down.

use async_trait::async_trait;
use futures::StreamExt;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use voicebank_core::constants::{CLIP_CHANNELS, CLIP_SAMPLE_RATE};

use crate::input::{ByteStream, TranscodeInput};

/// How much of ffmpeg's stderr is kept for error classification.
const STDERR_TAIL_CHARS: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to spawn transcoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("transcoder failed ({status}): {stderr}")]
    Process {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("input stream failed: {0}")]
    Input(#[source] std::io::Error),

    #[error("transcoder output read failed: {0}")]
    OutputRead(#[source] std::io::Error),

    #[error("sink write failed: {0}")]
    SinkWrite(#[source] std::io::Error),
}

/// Result of a completed transcode: how much went to the durable sink, and
/// the same bytes accumulated for duration analysis.
#[derive(Debug)]
pub struct TranscodeOutput {
    pub bytes_written: u64,
    pub encoded: Vec<u8>,
}

/// The transcode stage as the orchestrator sees it.
#[async_trait]
pub trait TranscodePipeline: Send + Sync {
    /// Transcode `input` to normalized MP3, streaming every output chunk
    /// to `sink` and returning the accumulated bytes. On error the sink
    /// may have received a prefix of the output; the caller owns cleanup
    /// of whatever the sink points at.
    async fn run(
        &self,
        input: TranscodeInput,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<TranscodeOutput, TranscodeError>;
}

/// ffmpeg-backed implementation.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: String) -> Self {
        Self { ffmpeg_path }
    }

    /// Argument list for one conversion. The output side is fixed: MP3
    /// codec, mono, 32kHz, written to stdout.
    fn build_args(input_arg: &str) -> Vec<String> {
        [
            "-hide_banner",
            "-loglevel",
            "error",
            "-i",
            input_arg,
            "-acodec",
            "libmp3lame",
            "-f",
            "mp3",
            "-ac",
            &CLIP_CHANNELS.to_string(),
            "-ar",
            &CLIP_SAMPLE_RATE.to_string(),
            "pipe:1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

#[async_trait]
impl TranscodePipeline for FfmpegTranscoder {
    #[tracing::instrument(skip(self, input, sink))]
    async fn run(
        &self,
        input: TranscodeInput,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<TranscodeOutput, TranscodeError> {
        let (stdin_stream, spool) = match input {
            TranscodeInput::Stream(stream) => (Some(stream), None),
            TranscodeInput::Spooled(spool) => (None, Some(spool)),
        };

        let input_arg = match &spool {
            Some(spool) => spool.path().to_string_lossy().into_owned(),
            None => "pipe:0".to_string(),
        };

        let mut command = Command::new(&self.ffmpeg_path);
        command
            .args(Self::build_args(&input_arg))
            .stdin(if stdin_stream.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(TranscodeError::Spawn)?;

        let feeder = match stdin_stream {
            Some(stream) => {
                let stdin = child.stdin.take().ok_or_else(|| {
                    TranscodeError::Spawn(std::io::Error::other("transcoder stdin not captured"))
                })?;
                Some(tokio::spawn(feed_stdin(stream, stdin)))
            }
            None => None,
        };

        let mut stdout = child.stdout.take().ok_or_else(|| {
            TranscodeError::Spawn(std::io::Error::other("transcoder stdout not captured"))
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            TranscodeError::Spawn(std::io::Error::other("transcoder stderr not captured"))
        })?;

        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            let _ = stderr.read_to_string(&mut output).await;
            output
        });

        // The fan-out: one reader, two sinks, same bytes in the same order.
        let mut encoded = Vec::new();
        let mut bytes_written = 0u64;
        let mut buf = [0u8; 8192];
        loop {
            let n = stdout
                .read(&mut buf)
                .await
                .map_err(TranscodeError::OutputRead)?;
            if n == 0 {
                break;
            }
            sink.write_all(&buf[..n])
                .await
                .map_err(TranscodeError::SinkWrite)?;
            encoded.extend_from_slice(&buf[..n]);
            bytes_written += n as u64;
        }
        sink.flush().await.map_err(TranscodeError::SinkWrite)?;

        let status = child.wait().await.map_err(TranscodeError::Spawn)?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        // An aborted request body outranks whatever ffmpeg made of the
        // truncated input.
        if let Some(feeder) = feeder {
            if let Ok(Err(e)) = feeder.await {
                return Err(TranscodeError::Input(e));
            }
        }

        if !status.success() {
            return Err(TranscodeError::Process {
                status,
                stderr: stderr_tail(&stderr_output),
            });
        }

        drop(spool);
        Ok(TranscodeOutput {
            bytes_written,
            encoded,
        })
    }
}

/// Pump the request body into the transcoder's stdin. A closed pipe means
/// the transcoder gave up first; its exit status carries the real error.
async fn feed_stdin(
    mut stream: ByteStream,
    mut stdin: tokio::process::ChildStdin,
) -> Result<(), std::io::Error> {
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if stdin.write_all(&chunk).await.is_err() {
            return Ok(());
        }
    }
    let _ = stdin.shutdown().await;
    Ok(())
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    match trimmed.char_indices().nth_back(STDERR_TAIL_CHARS - 1) {
        Some((idx, _)) if trimmed.len() > STDERR_TAIL_CHARS => trimmed[idx..].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{select_input, InputKind};
    use bytes::Bytes;
    use futures::stream;

    #[test]
    fn args_request_normalized_mono_mp3() {
        let args = FfmpegTranscoder::build_args("pipe:0");
        let joined = args.join(" ");
        assert!(joined.contains("-i pipe:0"));
        assert!(joined.contains("-acodec libmp3lame"));
        assert!(joined.contains("-f mp3"));
        assert!(joined.contains("-ac 1"));
        assert!(joined.contains("-ar 32000"));
        assert!(joined.ends_with("pipe:1"));
    }

    #[test]
    fn args_use_the_spool_path_for_buffered_input() {
        let args = FfmpegTranscoder::build_args("/tmp/spool123");
        assert!(args.join(" ").contains("-i /tmp/spool123"));
    }

    #[test]
    fn stderr_tail_keeps_short_output_whole() {
        assert_eq!(stderr_tail("  pipe:0: Invalid data\n"), "pipe:0: Invalid data");
        let long = "x".repeat(2000);
        assert_eq!(stderr_tail(&long).len(), STDERR_TAIL_CHARS);
    }

    fn body_of(chunks: Vec<Vec<u8>>) -> ByteStream {
        stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c)))
                .collect::<Vec<_>>(),
        )
        .boxed()
    }

    /// Stand-in transcoder: copies stdin to stdout, ignoring the ffmpeg
    /// argument list, so the fan-out can be exercised without ffmpeg.
    #[cfg(unix)]
    fn fake_transcoder(dir: &std::path::Path, script_body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-transcoder");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn both_sinks_receive_the_identical_byte_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new(fake_transcoder(dir.path(), "exec cat"));

        let payload: Vec<Vec<u8>> = vec![vec![1u8; 3000], vec![2u8; 5000], vec![3u8; 100]];
        let expected: Vec<u8> = payload.iter().flatten().copied().collect();

        let input = TranscodeInput::prepare(
            select_input(Some("audio/ogg"), false),
            body_of(payload),
        )
        .await
        .unwrap();

        let mut sink = Vec::new();
        let output = transcoder.run(input, &mut sink).await.expect("transcode");

        assert_eq!(sink, expected);
        assert_eq!(output.encoded, expected);
        assert_eq!(output.bytes_written, expected.len() as u64);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn process_failure_surfaces_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new(fake_transcoder(
            dir.path(),
            "cat > /dev/null; echo 'no decoder for weird codec' >&2; exit 1",
        ));

        let input = TranscodeInput::prepare(InputKind::PassThrough, body_of(vec![vec![0u8; 64]]))
            .await
            .unwrap();

        let mut sink = Vec::new();
        let err = transcoder.run(input, &mut sink).await.unwrap_err();
        match err {
            TranscodeError::Process { stderr, .. } => {
                assert!(stderr.contains("no decoder for weird codec"));
            }
            other => panic!("expected a process error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn aborted_request_body_fails_the_transcode() {
        let dir = tempfile::tempdir().unwrap();
        let transcoder = FfmpegTranscoder::new(fake_transcoder(dir.path(), "exec cat"));

        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(vec![0u8; 128])),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "client went away",
            )),
        ];
        let input = TranscodeInput::Stream(stream::iter(chunks).boxed());

        let mut sink = Vec::new();
        let err = transcoder.run(input, &mut sink).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Input(_)));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg".to_string());
        let input = TranscodeInput::prepare(InputKind::PassThrough, body_of(vec![vec![0u8; 8]]))
            .await
            .unwrap();

        let mut sink = Vec::new();
        let err = transcoder.run(input, &mut sink).await.unwrap_err();
        assert!(matches!(err, TranscodeError::Spawn(_)));
    }
}
