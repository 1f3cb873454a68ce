//! The clip ingestion orchestrator.
//!
//! One upload moves through: parameter checks → sentence lookup →
//! duplicate check → lease acquisition → transcode with dual-sink fan-out
//! → duration check → persist → side effects. Everything after the durable
//! writer opens runs under a cleanup wrapper that removes the canonical
//! file, so no failure leaves a partial clip behind. The vote and comment
//! paths are the same machine with the streaming stages cut out.

use std::sync::Arc;

use voicebank_core::constants::DEFAULT_CLIP_SOURCE;
use voicebank_core::models::{NewClip, UploadOutcome, VoteOutcome};
use voicebank_core::{
    AppError, BonusEvaluator, ChallengeToken, ClipStore, MarketingSync, ProgressEvaluator,
    SentenceStore,
};
use voicebank_processing::{
    check_clip_duration, mp3_duration_ms, select_input, ByteStream, TranscodeError,
    TranscodeInput, TranscodePipeline,
};
use voicebank_storage::{clip_key, Storage};

use super::engagement::{challenge_flags, run_contribution_side_effects};
use super::lease::UploadLeases;
use crate::state::AppState;

/// Everything the upload handler extracts from the HTTP request.
pub struct UploadRequest {
    pub client_id: Option<String>,
    pub sentence_id: Option<String>,
    pub source: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub challenge: Option<ChallengeToken>,
    pub body: ByteStream,
}

/// A vote on an existing clip.
pub struct VoteSubmission {
    pub clip_id: i64,
    pub client_id: Option<String>,
    pub is_valid: bool,
    pub comment: Option<String>,
    pub challenge: Option<ChallengeToken>,
}

/// Ingestion service bound to one request's view of the app state.
pub struct ClipIngest {
    clips: Arc<dyn ClipStore>,
    sentences: Arc<dyn SentenceStore>,
    storage: Arc<dyn Storage>,
    progress: Arc<dyn ProgressEvaluator>,
    bonuses: Arc<dyn BonusEvaluator>,
    basket: Arc<dyn MarketingSync>,
    transcoder: Arc<dyn TranscodePipeline>,
    leases: UploadLeases,
    buffer_stream_enabled: bool,
}

impl ClipIngest {
    pub fn new(state: &AppState) -> Self {
        Self {
            clips: state.clips.clone(),
            sentences: state.sentences.clone(),
            storage: state.storage.clone(),
            progress: state.progress.clone(),
            bonuses: state.bonuses.clone(),
            basket: state.basket.clone(),
            transcoder: state.transcoder.clone(),
            leases: state.upload_leases.clone(),
            buffer_stream_enabled: state.config.buffer_stream_enabled,
        }
    }

    /// Save the request body as a normalized audio clip.
    #[tracing::instrument(skip(self, request), fields(operation = "save_clip"))]
    pub async fn save_clip(&self, request: UploadRequest) -> Result<UploadOutcome, AppError> {
        let sentence_id = require_param(request.sentence_id.as_deref(), "sentence_id")?;
        let client_id = require_param(request.client_id.as_deref(), "client_id")?;

        let sentence = self
            .sentences
            .find_sentence(&sentence_id)
            .await?
            .ok_or(AppError::SentenceNotFound)?;

        let storage_key = clip_key(&client_id, &sentence_id);

        if self.clips.clip_exists(&client_id, &sentence_id).await? {
            return Err(AppError::AlreadyExists(storage_key));
        }

        // Holding the lease means no concurrent upload for this pair can
        // touch the canonical path until we respond.
        let _lease = self
            .leases
            .acquire(&client_id, &sentence_id)
            .ok_or_else(|| AppError::AlreadyExists(storage_key.clone()))?;

        let source = request
            .source
            .unwrap_or_else(|| DEFAULT_CLIP_SOURCE.to_string());
        tracing::debug!(
            storage_key = %storage_key,
            size = ?request.content_length,
            format = ?request.content_type,
            source = %source,
            "clip upload accepted for transcoding"
        );

        let transcoded = self
            .transcode_to_storage(&storage_key, request.content_type.as_deref(), request.body)
            .await;

        let duration_ms = match transcoded {
            Ok(duration_ms) => duration_ms,
            Err(err) => {
                self.cleanup_clip_file(&storage_key).await;
                return Err(err);
            }
        };

        let new_clip = NewClip {
            client_id: client_id.clone(),
            locale_id: sentence.locale_id,
            original_sentence_id: sentence_id.clone(),
            path: storage_key.clone(),
            sentence: sentence.text,
            duration_ms: duration_ms as i32,
        };
        if let Err(err) = self.clips.save_clip(new_clip).await {
            self.cleanup_clip_file(&storage_key).await;
            return Err(err);
        }

        tracing::info!(
            storage_key = %storage_key,
            duration_ms,
            source = %source,
            "clip written"
        );

        run_contribution_side_effects(
            &self.progress,
            &self.basket,
            &client_id,
            sentence.locale_id,
        )
        .await;

        let file_prefix = sentence_id;
        Ok(match request.challenge {
            Some(token) => UploadOutcome::with_challenge(
                file_prefix,
                challenge_flags(&self.bonuses, &client_id, &token).await?,
            ),
            None => UploadOutcome::basic(file_prefix),
        })
    }

    /// Transcode the body into the durable sink and measure the result.
    /// The caller removes the canonical file if this returns an error.
    async fn transcode_to_storage(
        &self,
        storage_key: &str,
        content_type: Option<&str>,
        body: ByteStream,
    ) -> Result<f64, AppError> {
        let mut writer = self
            .storage
            .writer(storage_key)
            .await
            .map_err(|e| AppError::FileSave(e.to_string()))?;

        let kind = select_input(content_type, self.buffer_stream_enabled);
        let input = TranscodeInput::prepare(kind, body)
            .await
            .map_err(|e| AppError::FileSave(format!("Error buffering audio stream: {}", e)))?;

        let output = self
            .transcoder
            .run(input, &mut writer)
            .await
            .map_err(transcode_error)?;

        // The durable write must complete before the duration check so a
        // partial file is never validated.
        tokio::io::AsyncWriteExt::shutdown(&mut writer)
            .await
            .map_err(|e| AppError::FileSave(format!("Error saving MP3 file: {}", e)))?;

        let duration_ms = mp3_duration_ms(&output.encoded)
            .map_err(|e| AppError::ClipValidation(e.to_string()))?;
        check_clip_duration(duration_ms).map_err(|e| AppError::ClipValidation(e.to_string()))
    }

    async fn cleanup_clip_file(&self, storage_key: &str) {
        if let Err(e) = self.storage.delete(storage_key).await {
            tracing::warn!(
                error = %e,
                storage_key = %storage_key,
                "Failed to cleanup storage after upload error"
            );
        }
    }

    /// Persist a validation vote and run the contribution side effects.
    #[tracing::instrument(skip(self, vote), fields(operation = "save_vote", clip_id = vote.clip_id))]
    pub async fn save_vote(&self, vote: VoteSubmission) -> Result<VoteOutcome, AppError> {
        let client_id = require_param(vote.client_id.as_deref(), "client_id")?;

        let clip = self
            .clips
            .find_clip(vote.clip_id)
            .await?
            .ok_or(AppError::ClipNotFound)?;
        let glob = clip.glob().to_string();

        self.clips
            .save_vote(clip.id, &client_id, vote.is_valid, vote.comment.as_deref())
            .await?;

        run_contribution_side_effects(&self.progress, &self.basket, &client_id, clip.locale_id)
            .await;

        Ok(match vote.challenge {
            Some(token) => VoteOutcome::with_challenge(
                glob,
                challenge_flags(&self.bonuses, &client_id, &token).await?,
            ),
            None => VoteOutcome::basic(glob),
        })
    }

    /// Attach a free-text comment to a sentence's clip.
    #[tracing::instrument(skip(self, comment), fields(operation = "save_comment"))]
    pub async fn save_comment(
        &self,
        client_id: Option<&str>,
        sentence_id: Option<&str>,
        comment: &str,
    ) -> Result<bool, AppError> {
        let sentence_id = require_param(sentence_id, "sentence_id")?;
        let client_id = require_param(client_id, "client_id")?;

        self.sentences
            .find_sentence(&sentence_id)
            .await?
            .ok_or(AppError::ClipNotFound)?;

        self.clips
            .save_clip_comment(&sentence_id, &client_id, comment)
            .await
    }
}

fn require_param(value: Option<&str>, name: &'static str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::MissingParameter(name)),
    }
}

fn transcode_error(err: TranscodeError) -> AppError {
    match err {
        TranscodeError::SinkWrite(e) => {
            AppError::FileSave(format!("Error saving MP3 file: {}", e))
        }
        other => AppError::Transcode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        empty_body, mp3_frames, test_state, FakeTranscoder, TestStateOptions,
    };
    use voicebank_core::ErrorMetadata;

    fn upload(client_id: Option<&str>, sentence_id: Option<&str>) -> UploadRequest {
        UploadRequest {
            client_id: client_id.map(String::from),
            sentence_id: sentence_id.map(String::from),
            source: Some("web".to_string()),
            content_type: Some("audio/ogg".to_string()),
            content_length: Some(4096),
            challenge: None,
            body: empty_body(),
        }
    }

    #[tokio::test]
    async fn accepted_clip_is_persisted_with_its_duration() {
        // 56 frames * 36ms = 2016ms, inside the window.
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting(mp3_frames(56)),
            ..Default::default()
        });
        let ingest = ClipIngest::new(&state);

        let outcome = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .expect("upload accepted");

        match outcome {
            UploadOutcome::Basic { file_prefix } => assert_eq!(file_prefix, "s-1"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let saved = state.fakes.clips.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].path, "client-a/s-1.mp3");
        assert_eq!(saved[0].duration_ms, 2016);
        assert!(state.fakes.storage.contains("client-a/s-1.mp3"));
        assert_eq!(state.fakes.progress.progress_calls(), 1);
        assert_eq!(state.fakes.progress.goal_calls(), 1);
    }

    #[tokio::test]
    async fn too_short_clip_is_rejected_and_the_file_removed() {
        // 20 frames = 720ms.
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting(mp3_frames(20)),
            ..Default::default()
        });
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.http_status_code(), 500);
        assert!(!state.fakes.storage.contains("client-a/s-1.mp3"));
        assert!(state.fakes.clips.saved().is_empty());
    }

    #[tokio::test]
    async fn too_long_clip_is_rejected_and_the_file_removed() {
        // 420 frames = 15120ms.
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting(mp3_frames(420)),
            ..Default::default()
        });
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(!state.fakes.storage.contains("client-a/s-1.mp3"));
        assert!(state.fakes.clips.saved().is_empty());
    }

    #[tokio::test]
    async fn missing_sentence_id_fails_before_any_transcode() {
        let state = test_state(TestStateOptions::default());
        let ingest = ClipIngest::new(&state);

        let err = ingest.save_clip(upload(Some("client-a"), None)).await.unwrap_err();

        assert!(matches!(err, AppError::MissingParameter("sentence_id")));
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(state.fakes.transcoder.runs(), 0);
    }

    #[tokio::test]
    async fn missing_client_id_names_the_missing_parameter() {
        let state = test_state(TestStateOptions::default());
        let ingest = ClipIngest::new(&state);

        let err = ingest.save_clip(upload(None, Some("s-1"))).await.unwrap_err();
        assert!(matches!(err, AppError::MissingParameter("client_id")));
        assert_eq!(state.fakes.transcoder.runs(), 0);
    }

    #[tokio::test]
    async fn unknown_sentence_is_rejected_with_422() {
        let state = test_state(TestStateOptions::default());
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("no-such-sentence")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SentenceNotFound));
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(state.fakes.transcoder.runs(), 0);
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected_without_transcoding() {
        let state = test_state(TestStateOptions::default());
        state.fakes.clips.insert_existing("client-a", "s-1");
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyExists(_)));
        assert_eq!(err.http_status_code(), 204);
        assert_eq!(state.fakes.transcoder.runs(), 0);
    }

    #[tokio::test]
    async fn concurrent_uploads_for_one_pair_persist_at_most_one_row() {
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting_slowly(mp3_frames(56), 25),
            ..Default::default()
        });
        let ingest_a = ClipIngest::new(&state);
        let ingest_b = ClipIngest::new(&state);

        let (a, b) = tokio::join!(
            ingest_a.save_clip(upload(Some("client-a"), Some("s-1"))),
            ingest_b.save_clip(upload(Some("client-a"), Some("s-1"))),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(matches!(loser, AppError::AlreadyExists(_)));
        assert_eq!(state.fakes.clips.saved().len(), 1);
        assert!(state.fakes.storage.contains("client-a/s-1.mp3"));
    }

    #[tokio::test]
    async fn transcoder_failure_leaves_no_residual_file() {
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::failing(),
            ..Default::default()
        });
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transcode(_)));
        assert!(!state.fakes.storage.contains("client-a/s-1.mp3"));
        assert!(state.fakes.clips.saved().is_empty());
    }

    #[tokio::test]
    async fn sink_write_failure_is_a_file_save_error() {
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting(mp3_frames(56)),
            ..Default::default()
        });
        state.fakes.storage.fail_writes();
        let ingest = ClipIngest::new(&state);

        let err = ingest
            .save_clip(upload(Some("client-a"), Some("s-1")))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "AUDIO_FILE_NOT_SAVED");
        assert!(state.fakes.clips.saved().is_empty());
    }

    #[tokio::test]
    async fn challenge_upload_returns_all_bonus_flags() {
        let state = test_state(TestStateOptions {
            transcoder: FakeTranscoder::emitting(mp3_frames(56)),
            ..Default::default()
        });
        state.fakes.bonuses.set_earn(true);
        state.fakes.bonuses.set_challenge_ended(true);

        let mut request = upload(Some("client-a"), Some("s-1"));
        request.challenge = ChallengeToken::parse(Some("mozilla"));
        let outcome = ClipIngest::new(&state).save_clip(request).await.unwrap();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["filePrefix"], "s-1");
        assert_eq!(value["showFirstContributionToast"], true);
        assert_eq!(value["challengeEnded"], true);
        assert!(value.get("hasEarnedSessionToast").is_some());
        assert!(value.get("showFirstStreakToast").is_some());
    }

    #[tokio::test]
    async fn vote_with_challenge_token_returns_flags_and_glob() {
        let state = test_state(TestStateOptions::default());
        let clip_id = state.fakes.clips.insert_existing("client-b", "s-9");
        let ingest = ClipIngest::new(&state);

        let outcome = ingest
            .save_vote(VoteSubmission {
                clip_id,
                client_id: Some("client-a".to_string()),
                is_valid: true,
                comment: None,
                challenge: ChallengeToken::parse(Some("mozilla")),
            })
            .await
            .unwrap();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["glob"], "client-b/s-9");
        assert!(value.get("challengeEnded").is_some());

        let votes = state.fakes.clips.votes();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0], (clip_id, "client-a".to_string(), true));
    }

    #[tokio::test]
    async fn vote_without_token_returns_only_the_glob() {
        let state = test_state(TestStateOptions::default());
        let clip_id = state.fakes.clips.insert_existing("client-b", "s-9");

        let outcome = ClipIngest::new(&state)
            .save_vote(VoteSubmission {
                clip_id,
                client_id: Some("client-a".to_string()),
                is_valid: false,
                comment: Some("clipped audio".to_string()),
                challenge: None,
            })
            .await
            .unwrap();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, serde_json::json!({ "glob": "client-b/s-9" }));
    }

    #[tokio::test]
    async fn vote_on_unknown_clip_is_rejected() {
        let state = test_state(TestStateOptions::default());

        let err = ClipIngest::new(&state)
            .save_vote(VoteSubmission {
                clip_id: 404,
                client_id: Some("client-a".to_string()),
                is_valid: true,
                comment: None,
                challenge: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ClipNotFound));
    }

    #[tokio::test]
    async fn comment_requires_a_known_sentence() {
        let state = test_state(TestStateOptions::default());
        let ingest = ClipIngest::new(&state);

        let saved = ingest
            .save_comment(Some("client-a"), Some("s-1"), "muffled recording")
            .await
            .unwrap();
        assert!(saved);

        let err = ingest
            .save_comment(Some("client-a"), Some("no-such-sentence"), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ClipNotFound));
    }
}
