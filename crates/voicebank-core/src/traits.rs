//! Collaborator interfaces consumed by the ingestion orchestrator and the
//! clip sampler.
//!
//! The orchestrator only ever talks to these traits; the sqlx-backed
//! implementations live in `voicebank-db` and tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::challenge::{BonusKind, ChallengeToken};
use crate::error::AppError;
use crate::models::{Clip, EligibleClip, NewClip, Sentence};

/// Clip persistence and eligibility queries.
#[async_trait]
pub trait ClipStore: Send + Sync {
    async fn find_clip(&self, id: i64) -> Result<Option<Clip>, AppError>;

    async fn clip_exists(&self, client_id: &str, sentence_id: &str) -> Result<bool, AppError>;

    /// Insert a new clip row. A unique-key violation on
    /// `(client_id, original_sentence_id)` must surface as
    /// [`AppError::AlreadyExists`], never as a generic database error.
    async fn save_clip(&self, clip: NewClip) -> Result<i64, AppError>;

    async fn save_vote(
        &self,
        clip_id: i64,
        client_id: &str,
        is_valid: bool,
        comment: Option<&str>,
    ) -> Result<(), AppError>;

    async fn save_clip_comment(
        &self,
        sentence_id: &str,
        client_id: &str,
        comment: &str,
    ) -> Result<bool, AppError>;

    /// Flag a clip whose stored audio turned out to be broken. Idempotent;
    /// concurrent duplicate invalidations are harmless.
    async fn mark_invalid(&self, clip_id: i64) -> Result<(), AppError>;

    /// Up to `limit` clips the given client may evaluate: not their own,
    /// not yet voted on by them, validity still unsettled.
    async fn find_eligible_clips(
        &self,
        client_id: &str,
        locale: &str,
        limit: u32,
    ) -> Result<Vec<EligibleClip>, AppError>;
}

/// Sentence lookups.
#[async_trait]
pub trait SentenceStore: Send + Sync {
    async fn find_sentence(&self, id: &str) -> Result<Option<Sentence>, AppError>;

    /// Batched variant lookup keyed by sentence id. One round trip for the
    /// whole sampling response.
    async fn find_variants_by_sentence_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, String>, AppError>;
}

/// Achievement/goal evaluation triggered after each contribution.
/// Best-effort: failures are logged and never roll back the contribution.
#[async_trait]
pub trait ProgressEvaluator: Send + Sync {
    async fn check_progress(&self, client_id: &str, locale_id: i32) -> Result<(), AppError>;

    async fn check_goals_after_contribution(
        &self,
        client_id: &str,
        locale_id: i32,
    ) -> Result<(), AppError>;
}

/// Challenge bonus evaluation.
#[async_trait]
pub trait BonusEvaluator: Send + Sync {
    /// Attempt to earn a bonus; `true` exactly when this call awarded it.
    async fn earn_bonus(
        &self,
        kind: BonusKind,
        client_id: &str,
        token: &ChallengeToken,
    ) -> Result<bool, AppError>;

    async fn has_earned_bonus(
        &self,
        kind: BonusKind,
        client_id: &str,
        token: &ChallengeToken,
    ) -> Result<bool, AppError>;

    async fn has_challenge_ended(&self, token: &ChallengeToken) -> Result<bool, AppError>;
}

/// Fire-and-forget marketing/basket sync.
#[async_trait]
pub trait MarketingSync: Send + Sync {
    async fn sync(&self, client_id: &str) -> Result<(), AppError>;
}
