//! Input adaptation for the transcode stage.
//!
//! Most uploads stream straight into the transcoder's stdin. AAC arrives
//! wrapped in an mpeg container whose index trails the data, so a
//! forward-only pipe cannot be decoded; when the buffer-stream flag is on,
//! such uploads are spooled to a seekable temp file first and the
//! transcoder reads the file instead. The temp file is owned by the
//! prepared input and removed on drop, success or failure.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

/// The request body as the pipeline sees it.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Input strategy, decided before any byte is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Pipe the body into the transcoder's stdin unmodified.
    PassThrough,
    /// Spool the body to a seekable temp file and hand the transcoder the
    /// file path.
    BufferedSeekable,
}

/// Pick the input strategy from the declared content type and the feature
/// flag. Pure function; only `aac` payloads ever buffer.
pub fn select_input(content_type: Option<&str>, buffer_stream_enabled: bool) -> InputKind {
    match content_type {
        Some(format) if buffer_stream_enabled && format.contains("aac") => {
            InputKind::BufferedSeekable
        }
        _ => InputKind::PassThrough,
    }
}

/// A prepared transcoder input.
pub enum TranscodeInput {
    Stream(ByteStream),
    Spooled(NamedTempFile),
}

impl TranscodeInput {
    /// Apply the selected strategy to the request body. Spooling consumes
    /// the whole stream before returning; an aborted body surfaces the
    /// underlying IO error and drops the partial spool.
    pub async fn prepare(kind: InputKind, stream: ByteStream) -> std::io::Result<Self> {
        match kind {
            InputKind::PassThrough => Ok(TranscodeInput::Stream(stream)),
            InputKind::BufferedSeekable => {
                let spool = NamedTempFile::new()?;
                let mut file = tokio::fs::File::create(spool.path()).await?;

                let mut stream = stream;
                while let Some(chunk) = stream.next().await {
                    file.write_all(&chunk?).await?;
                }
                file.flush().await?;

                Ok(TranscodeInput::Spooled(spool))
            }
        }
    }
}
