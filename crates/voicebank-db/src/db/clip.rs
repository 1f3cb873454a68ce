//! Clip repository: persistence and eligibility queries for the clips table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool};

use voicebank_core::models::{Clip, EligibleClip, NewClip};
use voicebank_core::{AppError, ClipStore};

/// Row type for the clips table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct ClipRow {
    id: i64,
    client_id: String,
    original_sentence_id: String,
    locale_id: i32,
    path: String,
    sentence: String,
    duration: i32,
    is_valid: Option<bool>,
    created_at: DateTime<Utc>,
}

impl ClipRow {
    fn into_clip(self) -> Clip {
        Clip {
            id: self.id,
            client_id: self.client_id,
            original_sentence_id: self.original_sentence_id,
            locale_id: self.locale_id,
            path: self.path,
            sentence: self.sentence,
            duration_ms: self.duration,
            is_valid: self.is_valid,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EligibleClipRow {
    id: i64,
    path: String,
    sentence: String,
    original_sentence_id: String,
    taxonomy: Option<String>,
}

/// Repository for the clips, votes, and clip_comments tables.
#[derive(Clone)]
pub struct ClipRepository {
    pool: MySqlPool,
}

impl ClipRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClipStore for ClipRepository {
    #[tracing::instrument(skip(self), fields(db.table = "clips"))]
    async fn find_clip(&self, id: i64) -> Result<Option<Clip>, AppError> {
        let row: Option<ClipRow> = sqlx::query_as::<MySql, ClipRow>(
            r#"
            SELECT id, client_id, original_sentence_id, locale_id, path,
                   sentence, duration, is_valid, created_at
            FROM clips
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ClipRow::into_clip))
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips"))]
    async fn clip_exists(&self, client_id: &str, sentence_id: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM clips WHERE client_id = ? AND original_sentence_id = ?",
        )
        .bind(client_id)
        .bind(sentence_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Insert a clip row. The `(client_id, original_sentence_id)` unique key
    /// is the durable guard behind the orchestrator's duplicate pre-check;
    /// a violation surfaces as `AlreadyExists`.
    #[tracing::instrument(skip(self, clip), fields(db.table = "clips"))]
    async fn save_clip(&self, clip: NewClip) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO clips (client_id, original_sentence_id, locale_id, path, sentence, duration)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&clip.client_id)
        .bind(&clip.original_sentence_id)
        .bind(clip.locale_id)
        .bind(&clip.path)
        .bind(&clip.sentence)
        .bind(clip.duration_ms)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::AlreadyExists(clip.path.clone())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(result.last_insert_id() as i64)
    }

    #[tracing::instrument(skip(self, comment), fields(db.table = "votes"))]
    async fn save_vote(
        &self,
        clip_id: i64,
        client_id: &str,
        is_valid: bool,
        comment: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO votes (clip_id, client_id, is_valid, comment) VALUES (?, ?, ?, ?)",
        )
        .bind(clip_id)
        .bind(client_id)
        .bind(is_valid)
        .bind(comment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, comment), fields(db.table = "clip_comments"))]
    async fn save_clip_comment(
        &self,
        sentence_id: &str,
        client_id: &str,
        comment: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO clip_comments (sentence_id, client_id, comment) VALUES (?, ?, ?)",
        )
        .bind(sentence_id)
        .bind(client_id)
        .bind(comment)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    #[tracing::instrument(skip(self), fields(db.table = "clips"))]
    async fn mark_invalid(&self, clip_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE clips SET is_valid = FALSE WHERE id = ?")
            .bind(clip_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Candidates for playback validation: unsettled clips in the locale,
    /// excluding the caller's own recordings and clips they already voted
    /// on. Ordered randomly server-side; the caller over-fetches.
    #[tracing::instrument(skip(self), fields(db.table = "clips"))]
    async fn find_eligible_clips(
        &self,
        client_id: &str,
        locale: &str,
        limit: u32,
    ) -> Result<Vec<EligibleClip>, AppError> {
        let rows: Vec<EligibleClipRow> = sqlx::query_as::<MySql, EligibleClipRow>(
            r#"
            SELECT clips.id, clips.path, clips.sentence,
                   clips.original_sentence_id, sentences.taxonomy
            FROM clips
            LEFT JOIN sentences ON sentences.id = clips.original_sentence_id
            WHERE clips.locale_id = (SELECT id FROM locales WHERE name = ?)
              AND clips.client_id <> ?
              AND clips.is_valid IS NULL
              AND NOT EXISTS (
                SELECT 1 FROM votes
                WHERE votes.clip_id = clips.id AND votes.client_id = ?
              )
            ORDER BY RAND()
            LIMIT ?
            "#,
        )
        .bind(locale)
        .bind(client_id)
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| EligibleClip {
                id: r.id,
                path: r.path,
                sentence: r.sentence,
                original_sentence_id: r.original_sentence_id,
                taxonomy: r.taxonomy,
            })
            .collect())
    }
}
