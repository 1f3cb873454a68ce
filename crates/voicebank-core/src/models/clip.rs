use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::CLIP_EXTENSION;

/// A persisted audio recording of a client speaking a sentence.
///
/// At most one clip exists per `(client_id, original_sentence_id)` pair;
/// `is_valid` stays unset until voting settles it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: i64,
    pub client_id: String,
    pub original_sentence_id: String,
    pub locale_id: i32,
    /// Storage path relative to the clips root: `{client_id}/{sentence_id}.mp3`.
    pub path: String,
    /// Snapshot of the sentence text at recording time.
    pub sentence: String,
    pub duration_ms: i32,
    pub is_valid: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Clip {
    /// The client-facing identifier: storage path minus the extension.
    pub fn glob(&self) -> &str {
        self.path.strip_suffix(CLIP_EXTENSION).unwrap_or(&self.path)
    }
}

/// Insert payload for a freshly transcoded clip.
#[derive(Debug, Clone)]
pub struct NewClip {
    pub client_id: String,
    pub locale_id: i32,
    pub original_sentence_id: String,
    pub path: String,
    pub sentence: String,
    pub duration_ms: i32,
}

/// Row shape returned by the eligibility query: just enough to assemble a
/// playback candidate.
#[derive(Debug, Clone)]
pub struct EligibleClip {
    pub id: i64,
    pub path: String,
    pub sentence: String,
    pub original_sentence_id: String,
    pub taxonomy: Option<String>,
}

/// Sentence metadata attached to a sampled clip.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SampledSentence {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,
    pub variant: Option<String>,
}

/// One entry of a sampling response. Exists only within a single call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipCandidate {
    pub id: String,
    pub glob: String,
    pub sentence: SampledSentence,
    pub audio_src: String,
}

/// Bonus-award flags computed when a contribution carries a valid
/// challenge token.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeFlags {
    pub show_first_contribution_toast: bool,
    pub has_earned_session_toast: bool,
    pub show_first_streak_toast: bool,
    pub challenge_ended: bool,
}

/// Success body for a clip upload. The shape depends on whether a valid
/// challenge token accompanied the request.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum UploadOutcome {
    #[serde(rename_all = "camelCase")]
    WithChallenge {
        file_prefix: String,
        show_first_contribution_toast: bool,
        has_earned_session_toast: bool,
        show_first_streak_toast: bool,
        challenge_ended: bool,
    },
    #[serde(rename_all = "camelCase")]
    Basic { file_prefix: String },
}

impl UploadOutcome {
    pub fn basic(file_prefix: String) -> Self {
        UploadOutcome::Basic { file_prefix }
    }

    pub fn with_challenge(file_prefix: String, flags: ChallengeFlags) -> Self {
        UploadOutcome::WithChallenge {
            file_prefix,
            show_first_contribution_toast: flags.show_first_contribution_toast,
            has_earned_session_toast: flags.has_earned_session_toast,
            show_first_streak_toast: flags.show_first_streak_toast,
            challenge_ended: flags.challenge_ended,
        }
    }
}

/// Success body for a vote submission, keyed by the clip's glob.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum VoteOutcome {
    #[serde(rename_all = "camelCase")]
    WithChallenge {
        glob: String,
        show_first_contribution_toast: bool,
        has_earned_session_toast: bool,
        show_first_streak_toast: bool,
        challenge_ended: bool,
    },
    Basic { glob: String },
}

impl VoteOutcome {
    pub fn basic(glob: String) -> Self {
        VoteOutcome::Basic { glob }
    }

    pub fn with_challenge(glob: String, flags: ChallengeFlags) -> Self {
        VoteOutcome::WithChallenge {
            glob,
            show_first_contribution_toast: flags.show_first_contribution_toast,
            has_earned_session_toast: flags.has_earned_session_toast,
            show_first_streak_toast: flags.show_first_streak_toast,
            challenge_ended: flags.challenge_ended,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_with_path(path: &str) -> Clip {
        Clip {
            id: 1,
            client_id: "client-a".into(),
            original_sentence_id: "s-1".into(),
            locale_id: 7,
            path: path.into(),
            sentence: "hello".into(),
            duration_ms: 2000,
            is_valid: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn glob_strips_only_the_mp3_extension() {
        assert_eq!(clip_with_path("client-a/s-1.mp3").glob(), "client-a/s-1");
        assert_eq!(clip_with_path("client-a/odd").glob(), "client-a/odd");
    }

    #[test]
    fn upload_outcome_shapes() {
        let basic = serde_json::to_value(UploadOutcome::basic("s-1".into())).unwrap();
        assert_eq!(basic, serde_json::json!({ "filePrefix": "s-1" }));

        let with = serde_json::to_value(UploadOutcome::with_challenge(
            "s-1".into(),
            ChallengeFlags {
                show_first_contribution_toast: true,
                has_earned_session_toast: false,
                show_first_streak_toast: false,
                challenge_ended: true,
            },
        ))
        .unwrap();
        assert_eq!(
            with,
            serde_json::json!({
                "filePrefix": "s-1",
                "showFirstContributionToast": true,
                "hasEarnedSessionToast": false,
                "showFirstStreakToast": false,
                "challengeEnded": true,
            })
        );
    }

    #[test]
    fn vote_outcome_without_token_is_just_the_glob() {
        let basic = serde_json::to_value(VoteOutcome::basic("client-a/s-1".into())).unwrap();
        assert_eq!(basic, serde_json::json!({ "glob": "client-a/s-1" }));
    }
}
